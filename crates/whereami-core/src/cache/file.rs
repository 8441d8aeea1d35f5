// # File Cache Tier
//
// File-based implementation of CacheTier.
//
// ## Purpose
//
// Persists the last resolved location across restarts so a fresh
// process can answer its first query from a warm cache instead of
// hitting the network.
//
// ## File Format
//
// A single JSON record at a fixed path:
//
// ```json
// {
//   "timestamp": 1756166400,
//   "location": {
//     "city": "Lisbon",
//     "country_code": "PT",
//     "provider": "ip_api"
//   }
// }
// ```
//
// `timestamp` is unix seconds of the fetch. Readers reject the record
// when `now - timestamp >= TTL`; that check is owned by
// [`CacheStore`](super::CacheStore), which sees the decoded entry.
//
// ## Failure Behavior
//
// - Unreadable or corrupt file: loads as `None` with a warning
// - Write failures surface as `Error::Cache`; the store swallows them
// - Writes are atomic (write to `.tmp`, then rename)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::location::Location;
use crate::traits::cache_tier::{CacheEntry, CacheTier};

/// On-disk record shape
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFileRecord {
    /// Unix seconds of the fetch
    timestamp: i64,
    location: Location,
}

/// Single-record file cache tier with atomic writes
#[derive(Debug)]
pub struct FileCacheTier {
    path: PathBuf,
}

impl FileCacheTier {
    /// Create a file tier at the given path
    ///
    /// Creates parent directories if needed. The file itself is only
    /// written on the first `store()`.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::cache(format!(
                    "failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl CacheTier for FileCacheTier {
    async fn load(&self) -> Result<Option<CacheEntry>, Error> {
        if !self.path.exists() {
            tracing::debug!("cache file does not exist: {}", self.path.display());
            return Ok(None);
        }

        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("failed to read cache file {}: {}", self.path.display(), e);
                return Ok(None);
            }
        };

        let record: CacheFileRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    "cache file {} is corrupt, ignoring: {}",
                    self.path.display(),
                    e
                );
                return Ok(None);
            }
        };

        let fetched_at = match DateTime::<Utc>::from_timestamp(record.timestamp, 0) {
            Some(ts) => ts,
            None => {
                tracing::warn!(
                    "cache file {} has out-of-range timestamp {}, ignoring",
                    self.path.display(),
                    record.timestamp
                );
                return Ok(None);
            }
        };

        Ok(Some(CacheEntry::with_timestamp(record.location, fetched_at)))
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), Error> {
        let record = CacheFileRecord {
            timestamp: entry.fetched_at.timestamp(),
            location: entry.location.clone(),
        };

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| Error::cache(format!("failed to serialize cache record: {}", e)))?;

        // Write to a temporary file, then rename into place
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::cache(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::cache(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("cache entry written to {}", self.path.display());
        Ok(())
    }
}
