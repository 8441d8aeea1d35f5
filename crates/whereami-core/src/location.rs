//! Canonical location value and display formatting
//!
//! Every provider adapter normalizes its API's response into [`Location`];
//! no other component ever sees a raw provider payload. All geographic
//! fields are optional because providers return partial data; absence is
//! a first-class value, not an error, until a display format demands a
//! missing field.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalized geolocation record produced by a provider adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// City name, if the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Region / state / province
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// ISO 3166-1 alpha-2 country code (e.g., "PT")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Human-readable country name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Public IP the provider resolved the location from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,

    /// Name of the provider that produced this record
    pub provider: String,
}

impl Location {
    /// Create an empty location attributed to a provider
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            city: None,
            region: None,
            country_code: None,
            country_name: None,
            latitude: None,
            longitude: None,
            source_ip: None,
            provider: provider.into(),
        }
    }

    /// True when every geographic and IP field is absent
    ///
    /// A 200 response that normalizes to an empty location maps to
    /// `ProviderResult::Empty`, not `Success`.
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.region.is_none()
            && self.country_code.is_none()
            && self.country_name.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.source_ip.is_none()
    }

    /// Coordinates as a `(lat, lon)` pair when both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Country name, falling back to the country code
    pub fn country_label(&self) -> Option<&str> {
        self.country_name
            .as_deref()
            .or(self.country_code.as_deref())
    }
}

/// Copy-format selector exposed as a host preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyFormat {
    /// City only
    City,
    /// "City, Country"
    #[default]
    CityCountry,
    /// Public IP only
    Ip,
    /// "City, Region, Country"
    CityRegionCountry,
}

impl std::str::FromStr for CopyFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "city" => Ok(Self::City),
            "city+country" | "city_country" => Ok(Self::CityCountry),
            "ip" => Ok(Self::Ip),
            "city+region+country" | "city_region_country" => Ok(Self::CityRegionCountry),
            other => Err(Error::config(format!("unknown copy format: {}", other))),
        }
    }
}

/// Render the clipboard text for a location under the chosen format
///
/// Fails with [`Error::IncompleteLocation`] when a field the format
/// demands is absent.
pub fn copy_text(location: &Location, format: CopyFormat) -> Result<String> {
    let city = || {
        location
            .city
            .as_deref()
            .ok_or_else(|| Error::incomplete("city"))
    };
    let country = || {
        location
            .country_label()
            .ok_or_else(|| Error::incomplete("country"))
    };

    match format {
        CopyFormat::City => Ok(city()?.to_string()),
        CopyFormat::CityCountry => Ok(format!("{}, {}", city()?, country()?)),
        CopyFormat::Ip => location
            .source_ip
            .clone()
            .ok_or_else(|| Error::incomplete("ip")),
        CopyFormat::CityRegionCountry => {
            let region = location
                .region
                .as_deref()
                .ok_or_else(|| Error::incomplete("region"))?;
            Ok(format!("{}, {}, {}", city()?, region, country()?))
        }
    }
}
