//! Two-tier location cache
//!
//! [`CacheStore`] combines the process-lifetime memory tier with an
//! optional persistent tier and owns all TTL decisions. Invariants:
//!
//! - reads never return an expired entry; expiry is evaluated against
//!   wall-clock time at call time, not at write time
//! - a valid persistent entry is promoted into the memory tier on read
//! - persistent-tier failures are swallowed with a warning; the disk
//!   slot is an optimization, never a correctness requirement

mod file;
mod memory;

pub use file::FileCacheTier;
pub use memory::MemoryCacheTier;

use chrono::Utc;

use crate::location::Location;
use crate::traits::cache_tier::{CacheEntry, CacheTier};

/// Two-tier cache with TTL-based invalidation
pub struct CacheStore {
    memory: MemoryCacheTier,
    persistent: Option<Box<dyn CacheTier>>,
    ttl: chrono::Duration,
}

impl CacheStore {
    /// Create a store with the given TTL and optional persistent tier
    pub fn new(ttl: std::time::Duration, persistent: Option<Box<dyn CacheTier>>) -> Self {
        Self {
            memory: MemoryCacheTier::new(),
            persistent,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
        }
    }

    /// Memory-only store, mainly for tests and cache-less deployments
    pub fn memory_only(ttl: std::time::Duration) -> Self {
        Self::new(ttl, None)
    }

    /// Read from the memory tier only
    ///
    /// This is the foreground path: no disk I/O may happen before the
    /// caller gets its placeholder, so the persistent tier is consulted
    /// only by the background fetch task via [`read`](Self::read).
    pub async fn read_memory(&self) -> Option<CacheEntry> {
        let now = Utc::now();
        match self.memory.load().await {
            Ok(Some(entry)) if !entry.is_expired(self.ttl, now) => Some(entry),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("memory cache tier read failed: {}", e);
                None
            }
        }
    }

    /// Read the freshest valid entry, preferring the memory tier
    ///
    /// On a memory miss the persistent tier is consulted; a valid
    /// persistent entry is promoted into memory before being returned.
    pub async fn read(&self) -> Option<CacheEntry> {
        if let Some(entry) = self.read_memory().await {
            return Some(entry);
        }

        let persistent = self.persistent.as_ref()?;
        let now = Utc::now();

        match persistent.load().await {
            Ok(Some(entry)) if !entry.is_expired(self.ttl, now) => {
                // Promote into the memory tier
                if let Err(e) = self.memory.store(&entry).await {
                    tracing::warn!("failed to promote cache entry to memory tier: {}", e);
                }
                tracing::debug!(
                    provider = %entry.location.provider,
                    "warm cache entry promoted from persistent tier"
                );
                Some(entry)
            }
            Ok(Some(_)) => {
                tracing::debug!("persistent cache entry expired, ignoring");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("persistent cache tier read failed: {}", e);
                None
            }
        }
    }

    /// Write a freshly resolved location through both tiers
    ///
    /// Persistent-tier write failures are swallowed: disk trouble must
    /// never fail a resolution that already succeeded.
    pub async fn write(&self, location: Location) {
        let entry = CacheEntry::new(location);

        if let Err(e) = self.memory.store(&entry).await {
            tracing::warn!("memory cache tier write failed: {}", e);
        }

        if let Some(persistent) = &self.persistent
            && let Err(e) = persistent.store(&entry).await
        {
            tracing::warn!("persistent cache tier write failed: {}", e);
        }
    }

    /// Store a backdated entry directly into the memory tier
    ///
    /// Test hook for TTL scenarios; production writes go through
    /// [`write`](Self::write).
    pub async fn seed(&self, entry: CacheEntry) {
        let _ = self.memory.store(&entry).await;
    }

    /// Configured TTL
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn lisbon() -> Location {
        let mut loc = Location::new("test");
        loc.city = Some("Lisbon".to_string());
        loc.country_code = Some("PT".to_string());
        loc
    }

    /// Persistent tier double that fails every operation
    struct BrokenTier;

    #[async_trait]
    impl CacheTier for BrokenTier {
        async fn load(&self) -> Result<Option<CacheEntry>, Error> {
            Err(Error::cache("disk unavailable"))
        }

        async fn store(&self, _entry: &CacheEntry) -> Result<(), Error> {
            Err(Error::cache("disk unavailable"))
        }
    }

    /// Persistent tier double with a preloaded entry and a load counter
    struct SeededTier {
        entry: CacheEntry,
        loads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CacheTier for SeededTier {
        async fn load(&self) -> Result<Option<CacheEntry>, Error> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.entry.clone()))
        }

        async fn store(&self, _entry: &CacheEntry) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_then_read_within_ttl() {
        let store = CacheStore::memory_only(Duration::from_secs(300));
        store.write(lisbon()).await;

        let entry = store.read().await.unwrap();
        assert_eq!(entry.location, lisbon());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let store = CacheStore::memory_only(Duration::from_secs(300));
        let stale = CacheEntry::with_timestamp(
            lisbon(),
            Utc::now() - chrono::Duration::seconds(301),
        );
        store.seed(stale).await;

        assert!(store.read().await.is_none());
        assert!(store.read_memory().await.is_none());
    }

    #[tokio::test]
    async fn entry_just_inside_ttl_is_valid() {
        let store = CacheStore::memory_only(Duration::from_secs(300));
        let entry = CacheEntry::with_timestamp(
            lisbon(),
            Utc::now() - chrono::Duration::seconds(100),
        );
        store.seed(entry).await;

        assert!(store.read_memory().await.is_some());
    }

    #[tokio::test]
    async fn persistent_entry_promoted_to_memory() {
        let loads = Arc::new(AtomicUsize::new(0));
        let tier = SeededTier {
            entry: CacheEntry::new(lisbon()),
            loads: loads.clone(),
        };

        let store = CacheStore::new(Duration::from_secs(300), Some(Box::new(tier)));

        // Memory miss falls through to the persistent tier
        assert!(store.read_memory().await.is_none());
        let entry = store.read().await.unwrap();
        assert_eq!(entry.location, lisbon());
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        // Promotion: second read is served from memory
        assert!(store.read_memory().await.is_some());
        store.read().await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_persistent_entry_not_trusted() {
        let tier = SeededTier {
            entry: CacheEntry::with_timestamp(
                lisbon(),
                Utc::now() - chrono::Duration::seconds(900),
            ),
            loads: Arc::new(AtomicUsize::new(0)),
        };

        let store = CacheStore::new(Duration::from_secs(300), Some(Box::new(tier)));
        assert!(store.read().await.is_none());
    }

    #[tokio::test]
    async fn broken_persistent_tier_is_swallowed() {
        let store = CacheStore::new(Duration::from_secs(300), Some(Box::new(BrokenTier)));

        // Write does not fail even though the persistent store does
        store.write(lisbon()).await;

        // Read still served from memory
        let entry = store.read().await.unwrap();
        assert_eq!(entry.location, lisbon());
    }
}
