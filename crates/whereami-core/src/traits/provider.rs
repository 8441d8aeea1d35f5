// # Provider Adapter Trait
//
// Defines the interface for external geolocation providers.
//
// ## Implementations
//
// - HTTP-based (ip-api.com, ipwho.is, ipapi.co): `whereami-provider-http` crate
// - Future: device positioning daemons, reverse-geocoding services
//
// ## Responsibilities
//
// An adapter owns everything about one external API: its URL, its field
// names, and its failure signals. Normalization into the canonical
// [`Location`] happens here and nowhere else: no other component ever
// inspects a raw provider payload.
//
// An adapter performs exactly one logical outbound call per `fetch()`.
// Bounded transient retry (5xx/429) is a transport concern inside the
// adapter's HTTP helper; chain-level fallback is owned by
// [`ProviderChain`](crate::chain::ProviderChain), and scheduling is
// owned by the resolution coordinator.

use async_trait::async_trait;

use crate::location::Location;

/// Why a provider call produced no usable location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network failure, timeout, or non-2xx status
    Unreachable,
    /// 2xx response whose payload did not match the expected shape
    Malformed,
}

/// Diagnostic detail for a failed provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ProviderFailure {
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unreachable,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Malformed,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FailureKind::Unreachable => write!(f, "unreachable: {}", self.detail),
            FailureKind::Malformed => write!(f, "malformed: {}", self.detail),
        }
    }
}

/// Outcome of one provider adapter call
///
/// `Empty` and `Failure` are equivalent for fallback purposes (the chain
/// advances past both) but are reported distinctly for diagnostics.
/// `Empty` results are never cached: caching a known-incomplete answer
/// would suppress a later, better one within the same TTL window.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    /// Provider returned at least one usable field
    Success(Location),
    /// Provider reachable, but no usable fields in the response
    Empty,
    /// Timeout, non-2xx status, or malformed payload
    Failure(ProviderFailure),
}

/// Trait for geolocation provider adapters
///
/// Implementations must be thread-safe and usable across async tasks.
/// The per-call timeout and the HTTP transport are injected at
/// construction time; `fetch()` takes no parameters.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name, used to tag the resulting [`Location`]
    /// and in diagnostics
    fn name(&self) -> &str;

    /// Perform one lookup against the external provider
    ///
    /// Infallible by construction: every failure mode maps into a
    /// [`ProviderResult`] variant so the chain can decide whether to
    /// advance.
    async fn fetch(&self) -> ProviderResult;
}

/// Helper trait for constructing adapters from configuration
///
/// Factories are registered with the
/// [`ProviderRegistry`](crate::registry::ProviderRegistry) by provider
/// crates; the host binary injects the shared HTTP transport into the
/// factory before registration.
pub trait ProviderFactory: Send + Sync {
    /// Create an adapter instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> crate::error::Result<Box<dyn ProviderAdapter>>;
}
