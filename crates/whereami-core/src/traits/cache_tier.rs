// # Cache Tier Trait
//
// Defines the interface for one tier of the location cache.
//
// ## Purpose
//
// The cache holds a single global "current location" entry with a
// last-write timestamp. Two tiers exist: a process-lifetime in-memory
// slot and an optional persistent (disk) slot that survives restarts
// and seeds the memory tier as a warm-cache candidate.
//
// Tiers store and load entries; they do not decide freshness. TTL
// validation against wall-clock time at read time is owned by
// [`CacheStore`](crate::cache::CacheStore).
//
// ## Implementations
//
// - In-memory: `MemoryCacheTier`
// - File-based: `FileCacheTier` (single-record JSON, atomic writes)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// A cached location with its fetch timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub location: Location,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Wrap a freshly fetched location, stamped with the current time
    pub fn new(location: Location) -> Self {
        Self {
            location,
            fetched_at: Utc::now(),
        }
    }

    /// Create an entry with an explicit timestamp
    ///
    /// Used when decoding the persistent tier and by tests that need
    /// backdated entries.
    pub fn with_timestamp(location: Location, fetched_at: DateTime<Utc>) -> Self {
        Self {
            location,
            fetched_at,
        }
    }

    /// An entry is valid iff `now - fetched_at < ttl`
    ///
    /// Evaluated against the caller-supplied `now` so a long-idle
    /// process never serves arbitrarily old data.
    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) >= ttl
    }
}

/// Trait for cache tier implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Persistent tiers use async I/O only; blocking I/O would stall the
/// resolution path.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Load the stored entry, if any
    ///
    /// Returns `Ok(None)` both when nothing was ever stored and when a
    /// persistent record is unreadable or corrupt; the tier is an
    /// optimization, never a correctness requirement.
    async fn load(&self) -> Result<Option<CacheEntry>, crate::Error>;

    /// Store an entry, replacing any previous one
    async fn store(&self, entry: &CacheEntry) -> Result<(), crate::Error>;
}
