//! Configuration types for the location resolution system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::location::CopyFormat;

/// Main resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Provider chain, in fallback order
    pub providers: Vec<ProviderConfig>,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Fetch/coordinator settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Display preferences forwarded by the host
    #[serde(default)]
    pub display: DisplayConfig,
}

impl ResolverConfig {
    /// Create a configuration with defaults and no providers
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.providers.is_empty() {
            return Err(crate::Error::config("no providers configured"));
        }

        for provider in &self.providers {
            provider.validate()?;
        }
        self.cache.validate()?;
        self.fetch.validate()?;

        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// ip-api.com JSON endpoint
    IpApi {
        /// Override the endpoint (used in tests)
        #[serde(default)]
        base_url: Option<String>,
        /// Per-call timeout in seconds
        #[serde(default = "default_provider_timeout_secs")]
        timeout_secs: u64,
    },

    /// ipwho.is JSON endpoint
    Ipwhois {
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_provider_timeout_secs")]
        timeout_secs: u64,
    },

    /// ipapi.co JSON endpoint
    IpapiCo {
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_provider_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom provider adapter
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let timeout_secs = match self {
            ProviderConfig::IpApi { timeout_secs, .. }
            | ProviderConfig::Ipwhois { timeout_secs, .. }
            | ProviderConfig::IpapiCo { timeout_secs, .. } => *timeout_secs,
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom provider config cannot be null"));
                }
                return Ok(());
            }
        };

        if timeout_secs == 0 {
            return Err(crate::Error::config("provider timeout must be > 0"));
        }

        Ok(())
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::IpApi { .. } => "ip_api",
            ProviderConfig::Ipwhois { .. } => "ipwhois",
            ProviderConfig::IpapiCo { .. } => "ipapi_co",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum age at which a cached location is still valid (seconds)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Persistent tier configuration
    #[serde(default)]
    pub tier: CacheTierConfig,
}

impl CacheConfig {
    /// Validate the cache configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl_secs == 0 {
            return Err(crate::Error::config("cache TTL must be > 0"));
        }
        if let CacheTierConfig::File { path } = &self.tier
            && path.is_empty()
        {
            return Err(crate::Error::config("cache file path cannot be empty"));
        }
        Ok(())
    }

    /// TTL as a std duration
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            tier: CacheTierConfig::default(),
        }
    }
}

/// Persistent cache tier selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheTierConfig {
    /// File-backed persistent tier
    File {
        /// Path to the single-record cache file
        path: String,
    },

    /// Memory-only (no persistence across restarts)
    #[default]
    Memory,
}

/// Fetch/coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Extra attempts per provider call on 5xx/429 (transport-level)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base backoff between transport retries, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Outer bound on one full chain pass, in seconds
    ///
    /// Expiry is treated identically to chain exhaustion. `None`
    /// disables the outer bound (the sum of per-provider timeouts
    /// still applies).
    #[serde(default = "default_outer_timeout_secs")]
    pub outer_timeout_secs: Option<u64>,

    /// Capacity of the coordinator's diagnostic event channel
    ///
    /// When full, new events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Identifying client header sent with every provider call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    /// Validate the fetch configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_retries > 2 {
            return Err(crate::Error::config(
                "max_retries must be between 0 and 2; chain fallback handles persistent failure",
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        if self.outer_timeout_secs == Some(0) {
            return Err(crate::Error::config("outer timeout must be > 0 when set"));
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            outer_timeout_secs: default_outer_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            user_agent: default_user_agent(),
        }
    }
}

/// Display preferences, as forwarded by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub show_region: bool,

    #[serde(default)]
    pub show_flag: bool,

    #[serde(default)]
    pub show_ip: bool,

    #[serde(default)]
    pub copy_format: CopyFormat,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_provider_timeout_secs() -> u64 {
    3
}

fn default_max_retries() -> usize {
    1
}

fn default_retry_backoff_ms() -> u64 {
    300
}

fn default_outer_timeout_secs() -> Option<u64> {
    Some(8)
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_user_agent() -> String {
    format!("whereami/{}", env!("CARGO_PKG_VERSION"))
}
