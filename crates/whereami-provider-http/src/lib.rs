// # HTTP Geolocation Providers
//
// Provider adapters for the public IP-geolocation JSON endpoints:
//
// - ip-api.com (`IpApiAdapter`)
// - ipwho.is (`IpwhoisAdapter`)
// - ipapi.co (`IpapiCoAdapter`)
//
// Each adapter owns everything about its endpoint: the URL, the field
// names, and the in-band failure signal. All three normalize into the
// canonical `Location` with the provider name attached; no raw payload
// escapes this crate.
//
// An adapter performs exactly one logical outbound call per `fetch()`.
// The shared [`Transport`] adds a bounded transient-retry loop
// (5xx/429 only). Fallback across providers is owned by the chain in
// `whereami-core`, never by an adapter.
//
// The host binary builds one `reqwest::Client` and hands it to
// [`register`], which installs a factory per provider type name. Test
// setups override `base_url` in the provider config to point adapters
// at a local mock server.

mod ip_api;
mod ipapi_co;
mod ipwhois;
mod transport;

pub use ip_api::IpApiAdapter;
pub use ipapi_co::IpapiCoAdapter;
pub use ipwhois::IpwhoisAdapter;
pub use transport::{RetryPolicy, Transport};

use std::time::Duration;

use whereami_core::config::{FetchConfig, ProviderConfig};
use whereami_core::registry::ProviderRegistry;
use whereami_core::traits::provider::{ProviderAdapter, ProviderFactory};
use whereami_core::{Error, Result};

/// Factory for ip-api.com adapters
pub struct IpApiFactory {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ProviderFactory for IpApiFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderAdapter>> {
        match config {
            ProviderConfig::IpApi {
                base_url,
                timeout_secs,
            } => {
                let transport = Transport::new(
                    self.client.clone(),
                    Duration::from_secs(*timeout_secs),
                    self.retry.clone(),
                );
                Ok(Box::new(IpApiAdapter::new(base_url.clone(), transport)))
            }
            _ => Err(Error::config("invalid config for ip_api provider")),
        }
    }
}

/// Factory for ipwho.is adapters
pub struct IpwhoisFactory {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ProviderFactory for IpwhoisFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderAdapter>> {
        match config {
            ProviderConfig::Ipwhois {
                base_url,
                timeout_secs,
            } => {
                let transport = Transport::new(
                    self.client.clone(),
                    Duration::from_secs(*timeout_secs),
                    self.retry.clone(),
                );
                Ok(Box::new(IpwhoisAdapter::new(base_url.clone(), transport)))
            }
            _ => Err(Error::config("invalid config for ipwhois provider")),
        }
    }
}

/// Factory for ipapi.co adapters
pub struct IpapiCoFactory {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ProviderFactory for IpapiCoFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderAdapter>> {
        match config {
            ProviderConfig::IpapiCo {
                base_url,
                timeout_secs,
            } => {
                let transport = Transport::new(
                    self.client.clone(),
                    Duration::from_secs(*timeout_secs),
                    self.retry.clone(),
                );
                Ok(Box::new(IpapiCoAdapter::new(base_url.clone(), transport)))
            }
            _ => Err(Error::config("invalid config for ipapi_co provider")),
        }
    }
}

/// Retry policy derived from the fetch configuration
fn retry_policy(fetch: &FetchConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: fetch.max_retries,
        backoff: Duration::from_millis(fetch.retry_backoff_ms),
    }
}

/// Register all HTTP provider factories with a registry
///
/// The caller owns the `reqwest::Client` (connection pool, user agent)
/// so that every adapter shares one pool.
///
/// # Example
///
/// ```rust,ignore
/// let registry = ProviderRegistry::new();
/// whereami_provider_http::register(&registry, client, &config.fetch);
/// ```
pub fn register(registry: &ProviderRegistry, client: reqwest::Client, fetch: &FetchConfig) {
    let retry = retry_policy(fetch);
    registry.register_adapter(
        "ip_api",
        Box::new(IpApiFactory {
            client: client.clone(),
            retry: retry.clone(),
        }),
    );
    registry.register_adapter(
        "ipwhois",
        Box::new(IpwhoisFactory {
            client: client.clone(),
            retry: retry.clone(),
        }),
    );
    registry.register_adapter(
        "ipapi_co",
        Box::new(IpapiCoFactory { client, retry }),
    );
}
