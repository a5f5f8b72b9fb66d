//! Geo lookup responses

use serde::{Deserialize, Serialize};

/// How the location was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeoMode {
    /// Edge headers carried the country
    Server,
    /// Resolved from the public IP
    BrowserIp,
    /// No IP could be determined
    None,
    /// A lookup failed
    Error,
}

/// GET /api/geo-lookup response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLookupResponse {
    pub mode: GeoMode,
    pub country_code: String,
    pub country_name: String,
    pub city: String,
    pub region: String,
    pub display_name: String,
}

impl GeoLookupResponse {
    pub fn new(mode: GeoMode, country_code: String, country_name: String, city: String, region: String) -> Self {
        let display_name = [city.as_str(), region.as_str(), country_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            mode,
            country_code,
            country_name,
            city,
            region,
            display_name,
        }
    }

    /// Response with every field empty
    pub fn empty(mode: GeoMode) -> Self {
        Self::new(mode, String::new(), String::new(), String::new(), String::new())
    }
}

/// GET /api/ip response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpResponse {
    pub ip: Option<String>,
}

/// Location reported by the IP geolocation service
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IpLocation {
    /// ISO country code
    pub country: Option<String>,
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}
