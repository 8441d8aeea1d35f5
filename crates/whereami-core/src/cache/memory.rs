// # Memory Cache Tier
//
// In-memory implementation of CacheTier.
//
// ## Purpose
//
// Process-lifetime slot for the current location. Nothing survives a
// restart; the persistent tier exists for that.
//
// ## When to Use
//
// Always present as the first tier of [`CacheStore`](super::CacheStore);
// also useful standalone in tests and in deployments that do not want a
// cache file on disk.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::cache_tier::{CacheEntry, CacheTier};

/// Single-slot in-memory cache tier
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheTier {
    slot: Arc<RwLock<Option<CacheEntry>>>,
}

impl MemoryCacheTier {
    /// Create an empty memory tier
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the stored entry, if any
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

#[async_trait]
impl CacheTier for MemoryCacheTier {
    async fn load(&self) -> Result<Option<CacheEntry>, Error> {
        Ok(self.slot.read().await.clone())
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), Error> {
        *self.slot.write().await = Some(entry.clone());
        Ok(())
    }
}
