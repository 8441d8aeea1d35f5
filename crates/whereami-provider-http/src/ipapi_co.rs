//! ipapi.co adapter
//!
//! Signals failure in-band with `"error": true` plus a `reason`.
//! Unlike the other two endpoints, the country name field is
//! `country_name` and the IP field is `ip`.

use async_trait::async_trait;
use serde::Deserialize;

use whereami_core::location::Location;
use whereami_core::traits::provider::{ProviderAdapter, ProviderFailure, ProviderResult};

use crate::transport::{Transport, non_empty};

pub const DEFAULT_BASE_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Deserialize)]
struct IpapiCoPayload {
    error: Option<bool>,
    reason: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_code: Option<String>,
    country_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    ip: Option<String>,
}

/// Adapter for ipapi.co
pub struct IpapiCoAdapter {
    base_url: String,
    transport: Transport,
}

impl IpapiCoAdapter {
    pub fn new(base_url: Option<String>, transport: Transport) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            transport,
        }
    }

    fn normalize(payload: serde_json::Value) -> ProviderResult {
        let payload: IpapiCoPayload = match serde_json::from_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                return ProviderResult::Failure(ProviderFailure::malformed(format!(
                    "unexpected payload shape: {}",
                    e
                )));
            }
        };

        if payload.error == Some(true) {
            return ProviderResult::Failure(ProviderFailure::malformed(format!(
                "provider reported failure: {}",
                payload.reason.unwrap_or_else(|| "no reason".to_string())
            )));
        }

        let mut location = Location::new("ipapi_co");
        location.city = non_empty(payload.city);
        location.region = non_empty(payload.region);
        location.country_code = non_empty(payload.country_code);
        location.country_name = non_empty(payload.country_name);
        location.latitude = payload.latitude;
        location.longitude = payload.longitude;
        location.source_ip = non_empty(payload.ip);

        if location.is_empty() {
            ProviderResult::Empty
        } else {
            ProviderResult::Success(location)
        }
    }
}

#[async_trait]
impl ProviderAdapter for IpapiCoAdapter {
    fn name(&self) -> &str {
        "ipapi_co"
    }

    async fn fetch(&self) -> ProviderResult {
        match self.transport.get_json(&self.base_url).await {
            Ok(payload) => Self::normalize(payload),
            Err(failure) => ProviderResult::Failure(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use whereami_core::traits::provider::FailureKind;

    #[test]
    fn normalizes_success_payload() {
        let result = IpapiCoAdapter::normalize(json!({
            "ip": "203.0.113.9",
            "city": "Lisbon",
            "region": "Lisboa",
            "country_code": "PT",
            "country_name": "Portugal",
            "latitude": 38.7167,
            "longitude": -9.1333
        }));

        let ProviderResult::Success(location) = result else {
            panic!("expected success");
        };
        assert_eq!(location.provider, "ipapi_co");
        assert_eq!(location.country_name.as_deref(), Some("Portugal"));
        assert_eq!(location.latitude, Some(38.7167));
    }

    #[test]
    fn rate_limit_error_maps_to_failure() {
        let result = IpapiCoAdapter::normalize(json!({
            "error": true,
            "reason": "RateLimited"
        }));
        let ProviderResult::Failure(failure) = result else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Malformed);
        assert!(failure.detail.contains("RateLimited"));
    }

    #[test]
    fn blank_payload_maps_to_empty() {
        let result = IpapiCoAdapter::normalize(json!({
            "city": null,
            "region": ""
        }));
        assert_eq!(result, ProviderResult::Empty);
    }
}
