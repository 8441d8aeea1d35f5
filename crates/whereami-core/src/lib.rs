// # whereami-core
//
// Core library for the location resolution system.
//
// ## Architecture Overview
//
// This library resolves the caller's approximate physical location by
// querying external geolocation providers, returning a stable result
// while minimizing redundant network calls:
//
// - **ProviderAdapter**: Trait for normalizing one external API into
//   the canonical `Location` record
// - **ProviderChain**: Ordered fallback across adapters
// - **CacheStore**: Two-tier (memory + optional persistent) cache with
//   TTL-based invalidation
// - **ResolutionCoordinator**: Serializes concurrent lookups into a
//   single in-flight fetch and suppresses stale deliveries
// - **QuerySessionTracker**: Monotonic generation ids that defeat the
//   slow-response-overtakes-fast-response race
// - **ProviderRegistry**: Plugin-based registry for adapter factories
//
// ## Design Principles
//
// 1. **Normalization at the edge**: only adapters see raw payloads
// 2. **Single-flight**: at most one provider fetch in flight, ever
// 3. **Stale-write protection**: staleness is checked at completion
//    time, not launch time
// 4. **Cache is advisory**: persistent-tier failures are never fatal

pub mod cache;
pub mod chain;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod location;
pub mod registry;
pub mod tracker;
pub mod traits;

// Re-export core types for convenience
pub use cache::{CacheStore, FileCacheTier, MemoryCacheTier};
pub use chain::ProviderChain;
pub use config::{CacheConfig, FetchConfig, ProviderConfig, ResolverConfig};
pub use coordinator::{CoordinatorEvent, Delivery, Resolution, ResolutionCoordinator};
pub use error::{Error, Result};
pub use location::{CopyFormat, Location};
pub use registry::ProviderRegistry;
pub use tracker::QuerySessionTracker;
pub use traits::{CacheEntry, CacheTier, ProviderAdapter, ProviderFactory, ProviderResult};
