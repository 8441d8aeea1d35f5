//! Core trait definitions
//!
//! These traits define the boundaries between the resolution coordinator
//! and its pluggable collaborators: provider adapters and cache tiers.

pub mod cache_tier;
pub mod provider;

pub use cache_tier::{CacheEntry, CacheTier};
pub use provider::{FailureKind, ProviderAdapter, ProviderFactory, ProviderFailure, ProviderResult};
