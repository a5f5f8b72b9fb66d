//! Visitor location lookup
//!
//! Edge headers are trusted first. Without them the service resolves its
//! public IP and asks an IP geolocation service.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::{GeoLookupResponse, GeoMode, IpLocation, IpResponse};

const USER_AGENT: &str = concat!("memoria/", env!("CARGO_PKG_VERSION"));

/// Country code → country name for the codes the edge commonly reports
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("IN", "India"),
    ("PL", "Poland"),
    ("FR", "France"),
    ("BR", "Brazil"),
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("AU", "Australia"),
    ("DE", "Germany"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("ES", "Spain"),
    ("IT", "Italy"),
];

/// Geo lookup errors
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}")]
    ApiError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Location hints forwarded by the edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeHints {
    pub country_code: String,
    pub city: String,
    pub region: String,
}

#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Public IP as seen by the IP echo service
    async fn public_ip(&self) -> Result<Option<String>, GeoError>;

    /// Location of `ip`
    async fn locate(&self, ip: &str) -> Result<IpLocation, GeoError>;
}

/// Name for an ISO country code, empty when unknown
pub fn country_name(code: &str) -> &'static str {
    COUNTRY_NAMES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or("")
}

/// Resolve the visitor location
pub async fn lookup(locator: &dyn GeoLocator, hints: EdgeHints) -> GeoLookupResponse {
    let code = hints.country_code.trim();
    if !code.is_empty() && code != "UNKNOWN" {
        return GeoLookupResponse::new(
            GeoMode::Server,
            code.to_string(),
            country_name(code).to_string(),
            hints.city,
            hints.region,
        );
    }

    match lookup_by_ip(locator).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "IP geolocation failed");
            GeoLookupResponse::empty(GeoMode::Error)
        }
    }
}

async fn lookup_by_ip(locator: &dyn GeoLocator) -> Result<GeoLookupResponse, GeoError> {
    let Some(ip) = locator.public_ip().await? else {
        return Ok(GeoLookupResponse::empty(GeoMode::None));
    };

    let location = locator.locate(&ip).await?;
    Ok(GeoLookupResponse::new(
        GeoMode::BrowserIp,
        location.country.unwrap_or_default(),
        location.country_name.unwrap_or_default(),
        location.city.unwrap_or_default(),
        location.region.unwrap_or_default(),
    ))
}

/// HTTP implementation (ipify-style echo + ipapi-style lookup)
pub struct HttpGeoLocator {
    http_client: reqwest::Client,
    ip_service_url: String,
    geo_service_base: String,
}

impl HttpGeoLocator {
    pub fn new(ip_service_url: &str, geo_service_base: &str) -> Result<Self, GeoError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GeoError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            ip_service_url: ip_service_url.to_string(),
            geo_service_base: geo_service_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GeoError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| GeoError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::ApiError(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| GeoError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl GeoLocator for HttpGeoLocator {
    async fn public_ip(&self) -> Result<Option<String>, GeoError> {
        let response: IpResponse = self.get_json(&self.ip_service_url).await?;
        Ok(response.ip.filter(|ip| !ip.trim().is_empty()))
    }

    async fn locate(&self, ip: &str) -> Result<IpLocation, GeoError> {
        let url = format!("{}/{}/json/", self.geo_service_base, ip);
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLocator {
        ip: Result<Option<String>, ()>,
        location: IpLocation,
    }

    #[async_trait]
    impl GeoLocator for FixedLocator {
        async fn public_ip(&self) -> Result<Option<String>, GeoError> {
            self.ip
                .clone()
                .map_err(|_| GeoError::NetworkError("unreachable".to_string()))
        }

        async fn locate(&self, _ip: &str) -> Result<IpLocation, GeoError> {
            Ok(self.location.clone())
        }
    }

    fn locator(ip: Result<Option<String>, ()>) -> FixedLocator {
        FixedLocator {
            ip,
            location: IpLocation {
                country: Some("PL".to_string()),
                country_name: Some("Poland".to_string()),
                city: Some("Kraków".to_string()),
                region: Some("Lesser Poland".to_string()),
            },
        }
    }

    #[test]
    fn test_country_name() {
        assert_eq!(country_name("JP"), "Japan");
        assert_eq!(country_name("jp"), "Japan");
        assert_eq!(country_name("ZZ"), "");
    }

    #[tokio::test]
    async fn test_edge_hints_win() {
        let hints = EdgeHints {
            country_code: "IN".to_string(),
            city: "Pune".to_string(),
            region: String::new(),
        };
        let response = lookup(&locator(Err(())), hints).await;

        assert_eq!(response.mode, GeoMode::Server);
        assert_eq!(response.country_name, "India");
        assert_eq!(response.display_name, "Pune, India");
    }

    #[tokio::test]
    async fn test_unknown_country_falls_back_to_ip() {
        let hints = EdgeHints {
            country_code: "UNKNOWN".to_string(),
            ..Default::default()
        };
        let response = lookup(&locator(Ok(Some("203.0.113.9".to_string()))), hints).await;

        assert_eq!(response.mode, GeoMode::BrowserIp);
        assert_eq!(response.country_code, "PL");
        assert_eq!(response.display_name, "Kraków, Lesser Poland, Poland");
    }

    #[tokio::test]
    async fn test_no_ip_and_errors() {
        let none = lookup(&locator(Ok(None)), EdgeHints::default()).await;
        assert_eq!(none, GeoLookupResponse::empty(GeoMode::None));

        let failed = lookup(&locator(Err(())), EdgeHints::default()).await;
        assert_eq!(failed, GeoLookupResponse::empty(GeoMode::Error));
    }
}
