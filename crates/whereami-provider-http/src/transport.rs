//! Shared HTTP transport helper for provider adapters
//!
//! One logical outbound call per adapter fetch, with a bounded
//! transient-retry loop: only 5xx and 429 responses are retried, at
//! most `max_retries` extra attempts, with linear backoff. Everything
//! else maps straight into a [`ProviderFailure`].

use std::time::Duration;

use whereami_core::traits::provider::ProviderFailure;

/// Bounded transient-retry policy (5xx/429 only)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first (0..=2)
    pub max_retries: usize,
    /// Base backoff; attempt `n` waits `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(300),
        }
    }
}

/// HTTP transport injected into every adapter
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(client: reqwest::Client, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client,
            timeout,
            retry,
        }
    }

    /// GET a JSON document, classifying every failure mode
    ///
    /// - network error / timeout / non-2xx: `Unreachable`
    /// - 2xx with a body that is not JSON: `Malformed`
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, ProviderFailure> {
        let mut attempt = 0usize;

        loop {
            let outcome = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await;

            let response = match outcome {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return Err(ProviderFailure::unreachable(format!(
                        "request timed out after {:?}",
                        self.timeout
                    )));
                }
                Err(e) => {
                    return Err(ProviderFailure::unreachable(format!("request failed: {}", e)));
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| ProviderFailure::malformed(format!("invalid JSON body: {}", e)));
            }

            let transient = status.is_server_error() || status.as_u16() == 429;
            if transient && attempt < self.retry.max_retries {
                attempt += 1;
                let delay = self.retry.backoff * attempt as u32;
                tracing::debug!(%url, %status, attempt, "transient status, retrying after {:?}", delay);
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(ProviderFailure::unreachable(format!("HTTP status {}", status)));
        }
    }
}

/// Treat empty and whitespace-only strings as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
