//! Public IP and visitor location endpoints
//!
//! Both always answer 200; failures are reported in the body.

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};

use crate::models::{GeoLookupResponse, IpResponse};
use crate::services::{geo_locator, EdgeHints};
use crate::AppState;

/// Header set by the client or proxy in front of the service
const USER_COUNTRY_HEADER: &str = "x-user-country";
/// Country header set by the Vercel edge network
const EDGE_COUNTRY_HEADER: &str = "x-vercel-ip-country";
const USER_CITY_HEADER: &str = "x-user-city";
const USER_REGION_HEADER: &str = "x-user-region";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn edge_hints(headers: &HeaderMap) -> EdgeHints {
    EdgeHints {
        country_code: header_value(headers, USER_COUNTRY_HEADER)
            .or_else(|| header_value(headers, EDGE_COUNTRY_HEADER))
            .unwrap_or_default(),
        city: header_value(headers, USER_CITY_HEADER).unwrap_or_default(),
        region: header_value(headers, USER_REGION_HEADER).unwrap_or_default(),
    }
}

/// GET /api/ip
pub async fn public_ip(State(state): State<AppState>) -> Json<IpResponse> {
    let ip = match state.geo.public_ip().await {
        Ok(ip) => ip,
        Err(e) => {
            tracing::warn!(error = %e, "Public IP lookup failed");
            None
        }
    };
    Json(IpResponse { ip })
}

/// GET /api/geo-lookup
pub async fn geo_lookup(State(state): State<AppState>, headers: HeaderMap) -> Json<GeoLookupResponse> {
    Json(geo_locator::lookup(state.geo.as_ref(), edge_hints(&headers)).await)
}

/// Build geo routes
pub fn geo_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ip", get(public_ip))
        .route("/api/geo-lookup", get(geo_lookup))
}
