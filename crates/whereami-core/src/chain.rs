//! Ordered provider fallback chain
//!
//! Providers have heterogeneous reliability and rate limits; the chain
//! tries them in a fixed configured order (historically most reliable
//! first) and stops at the first usable answer. `Empty` and `Failure`
//! both advance the chain but are logged distinctly. No adapter is
//! retried within a single pass; transient retry lives inside the
//! adapter's transport helper.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::location::Location;
use crate::traits::provider::{FailureKind, ProviderAdapter, ProviderResult};

/// Ordered list of provider adapters tried in sequence
pub struct ProviderChain {
    adapters: Vec<Box<dyn ProviderAdapter>>,
}

impl ProviderChain {
    /// Create a chain from an ordered adapter list
    pub fn new(adapters: Vec<Box<dyn ProviderAdapter>>) -> Result<Self> {
        if adapters.is_empty() {
            return Err(Error::config("provider chain cannot be empty"));
        }
        Ok(Self { adapters })
    }

    /// Try each adapter in order until one succeeds
    ///
    /// Returns [`Error::AllProvidersExhausted`] when every adapter
    /// returned `Empty` or `Failure`.
    pub async fn resolve(&self) -> Result<Location> {
        for adapter in &self.adapters {
            match adapter.fetch().await {
                ProviderResult::Success(location) => {
                    info!(provider = adapter.name(), "provider resolved location");
                    return Ok(location);
                }
                ProviderResult::Empty => {
                    debug!(
                        provider = adapter.name(),
                        "provider reachable but returned no usable fields, advancing"
                    );
                }
                ProviderResult::Failure(failure) => {
                    match failure.kind {
                        FailureKind::Unreachable => warn!(
                            provider = adapter.name(),
                            "provider unreachable: {}, advancing", failure.detail
                        ),
                        FailureKind::Malformed => warn!(
                            provider = adapter.name(),
                            "provider payload malformed: {}, advancing", failure.detail
                        ),
                    };
                }
            }
        }

        warn!("all {} providers exhausted", self.adapters.len());
        Err(Error::AllProvidersExhausted)
    }
}
