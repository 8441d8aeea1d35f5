//! Plugin-based provider registry
//!
//! Provider adapters are registered dynamically at runtime, avoiding
//! hardcoded if-else chains in the integration layer. Provider crates
//! expose a `register()` function that installs their factories; the
//! host binary injects the shared HTTP transport into each factory
//! before registration.
//!
//! ```rust,ignore
//! let registry = ProviderRegistry::new();
//! whereami_provider_http::register(&registry, client, &fetch_config);
//!
//! let adapter = registry.create_adapter(&ProviderConfig::IpApi {
//!     base_url: None,
//!     timeout_secs: 3,
//! })?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::provider::{ProviderAdapter, ProviderFactory};

/// Registry of provider adapter factories keyed by type name
///
/// Uses interior mutability with an RwLock, allowing concurrent reads
/// and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, Box<dyn ProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter factory under a provider type name
    pub fn register_adapter(&self, name: impl Into<String>, factory: Box<dyn ProviderFactory>) {
        let name = name.into();
        let mut factories = self.factories.write().unwrap();
        factories.insert(name, factory);
    }

    /// Create an adapter from configuration
    ///
    /// Fails when the provider type has no registered factory.
    pub fn create_adapter(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderAdapter>> {
        let provider_type = config.type_name();
        let factories = self.factories.read().unwrap();

        let factory = factories
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider type names
    pub fn list_adapters(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap();
        factories.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_adapter(&self, name: &str) -> bool {
        let factories = self.factories.read().unwrap();
        factories.contains_key(name)
    }
}
