//! ipwho.is adapter
//!
//! Signals failure in-band with `"success": false`; fields otherwise
//! arrive with snake_case names and full-precision coordinates.

use async_trait::async_trait;
use serde::Deserialize;

use whereami_core::location::Location;
use whereami_core::traits::provider::{ProviderAdapter, ProviderFailure, ProviderResult};

use crate::transport::{Transport, non_empty};

pub const DEFAULT_BASE_URL: &str = "https://ipwho.is/";

#[derive(Debug, Deserialize)]
struct IpwhoisPayload {
    success: Option<bool>,
    message: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_code: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    ip: Option<String>,
}

/// Adapter for ipwho.is
pub struct IpwhoisAdapter {
    base_url: String,
    transport: Transport,
}

impl IpwhoisAdapter {
    pub fn new(base_url: Option<String>, transport: Transport) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            transport,
        }
    }

    fn normalize(payload: serde_json::Value) -> ProviderResult {
        let payload: IpwhoisPayload = match serde_json::from_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                return ProviderResult::Failure(ProviderFailure::malformed(format!(
                    "unexpected payload shape: {}",
                    e
                )));
            }
        };

        if payload.success == Some(false) {
            return ProviderResult::Failure(ProviderFailure::malformed(format!(
                "provider reported failure: {}",
                payload.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        let mut location = Location::new("ipwhois");
        location.city = non_empty(payload.city);
        location.region = non_empty(payload.region);
        location.country_code = non_empty(payload.country_code);
        location.country_name = non_empty(payload.country);
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
impl ProviderAdapter for IpwhoisAdapter {
    fn name(&self) -> &str {
        "ipwhois"
    }

    async fn fetch(&self) -> ProviderResult {
        match self.transport.get_json(&self.base_url).await {
            Ok(payload) => Self::normalize(payload),
            Err(failure) => ProviderResult::Failure(failure),
        }
    }
}
