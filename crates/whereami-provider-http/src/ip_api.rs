//! ip-api.com adapter
//!
//! Free-tier JSON endpoint. Signals failure in-band with
//! `"status": "fail"` plus a message; coordinates arrive as `lat`/`lon`.

use async_trait::async_trait;
use serde::Deserialize;

use whereami_core::location::Location;
use whereami_core::traits::provider::{ProviderAdapter, ProviderFailure, ProviderResult};

use crate::transport::{Transport, non_empty};

pub const DEFAULT_BASE_URL: &str = "http://ip-api.com/json";

/// Raw ip-api.com payload shape
#[derive(Debug, Deserialize)]
struct IpApiPayload {
    status: Option<String>,
    message: Option<String>,
    city: Option<String>,
    #[serde(rename = "regionName", alias = "region")]
    region_name: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    country: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
    query: Option<String>,
}

/// Adapter for ip-api.com
pub struct IpApiAdapter {
    base_url: String,
    transport: Transport,
}

impl IpApiAdapter {
    pub fn new(base_url: Option<String>, transport: Transport) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            transport,
        }
    }

    fn normalize(payload: serde_json::Value) -> ProviderResult {
        let payload: IpApiPayload = match serde_json::from_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                return ProviderResult::Failure(ProviderFailure::malformed(format!(
                    "unexpected payload shape: {}",
                    e
                )));
            }
        };

        if payload.status.as_deref() == Some("fail") {
            return ProviderResult::Failure(ProviderFailure::malformed(format!(
                "provider reported failure: {}",
                payload.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        let mut location = Location::new("ip_api");
        location.city = non_empty(payload.city);
        location.region = non_empty(payload.region_name);
        location.country_code = non_empty(payload.country_code);
        location.country_name = non_empty(payload.country);
        location.latitude = payload.lat;
        location.longitude = payload.lon;
        location.source_ip = non_empty(payload.query);

        if location.is_empty() {
            ProviderResult::Empty
        } else {
            ProviderResult::Success(location)
        }
    }
}

#[async_trait]
impl ProviderAdapter for IpApiAdapter {
    fn name(&self) -> &str {
        "ip_api"
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
        let result = IpApiAdapter::normalize(json!({
            "status": "success",
            "country": "Portugal",
            "countryCode": "PT",
            "regionName": "Lisboa",
            "city": "Lisbon",
            "lat": 38.7167,
            "lon": -9.1333,
            "query": "203.0.113.9"
        }));

        let ProviderResult::Success(location) = result else {
            panic!("expected success");
        };
        assert_eq!(location.provider, "ip_api");
        assert_eq!(location.city.as_deref(), Some("Lisbon"));
        assert_eq!(location.region.as_deref(), Some("Lisboa"));
        assert_eq!(location.country_code.as_deref(), Some("PT"));
        assert_eq!(location.latitude, Some(38.7167));
        assert_eq!(location.source_ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn fail_status_maps_to_failure() {
        let result = IpApiAdapter::normalize(json!({
            "status": "fail",
            "message": "private range"
        }));
        let ProviderResult::Failure(failure) = result else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Malformed);
        assert!(failure.detail.contains("private range"));
    }

    #[test]
    fn all_blank_fields_map_to_empty() {
        let result = IpApiAdapter::normalize(json!({
            "status": "success",
            "city": "",
            "country": "  "
        }));
        assert_eq!(result, ProviderResult::Empty);
    }

    #[test]
    fn partial_payload_is_still_success() {
        let result = IpApiAdapter::normalize(json!({
            "status": "success",
            "city": "Lisbon"
        }));
        let ProviderResult::Success(location) = result else {
            panic!("expected success");
        };
        assert_eq!(location.city.as_deref(), Some("Lisbon"));
        assert!(location.country_code.is_none());
    }
}
