//! HTTP handlers mounted under `/api`

pub mod hurricanes;
pub mod shelters;
pub mod weather;

use axum::{
    Router,
    handler::Handler,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{MethodRouter, get},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{VERSION, config::DefaultsConfig, models::Point, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get_only(health))
        .route("/hurricanes", get_only(hurricanes::get_hurricanes))
        .route("/weather/current", get_only(weather::get_current))
        .route("/weather/forecast", get_only(weather::get_forecast))
        .route("/shelters", get_only(shelters::get_shelters))
}

/// GET route; every other method, HEAD included, gets a 405
fn get_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler)
        .head(method_not_allowed)
        .fallback(method_not_allowed)
}

/// Coordinates and refresh flag as sent by clients; parsed leniently
#[derive(Debug, Default, Deserialize)]
pub struct PointQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub name: Option<String>,
    pub refresh: Option<String>,
}

impl PointQuery {
    pub fn point(&self, defaults: &DefaultsConfig) -> Point {
        resolve_point(
            self.lat.as_deref(),
            self.lng.as_deref(),
            self.name.as_deref(),
            defaults,
        )
    }

    pub fn force_refresh(&self) -> bool {
        is_true(self.refresh.as_deref())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

/// Parse request coordinates, falling back to the defaults when either is
/// missing, unparseable or out of range.
pub(crate) fn resolve_point(
    lat: Option<&str>,
    lng: Option<&str>,
    name: Option<&str>,
    defaults: &DefaultsConfig,
) -> Point {
    let parsed = match (lat, lng) {
        (None, None) => None,
        (lat, lng) => {
            let lat = lat.and_then(|v| v.trim().parse::<f64>().ok());
            let lng = lng.and_then(|v| v.trim().parse::<f64>().ok());
            match (lat, lng) {
                (Some(lat), Some(lng)) if Point::new(lat, lng).is_valid() => Some((lat, lng)),
                _ => {
                    warn!(
                        "Invalid coordinates lat={:?} lng={:?}, using defaults",
                        lat, lng
                    );
                    None
                }
            }
        }
    };

    let (lat, lng) = parsed.unwrap_or((defaults.latitude, defaults.longitude));
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Point::with_name(lat, lng, name),
        None => Point::new(lat, lng),
    }
}

pub(crate) fn is_true(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("26.1"), Some("-80.1"), (26.1, -80.1))]
    #[case(None, None, (25.774, -80.193))]
    #[case(Some("abc"), Some("-80.1"), (25.774, -80.193))]
    #[case(Some("26.1"), None, (25.774, -80.193))]
    #[case(Some("95"), Some("10"), (25.774, -80.193))]
    #[case(Some(" 10.5 "), Some(" 20.25"), (10.5, 20.25))]
    fn test_resolve_point(
        #[case] lat: Option<&str>,
        #[case] lng: Option<&str>,
        #[case] expected: (f64, f64),
    ) {
        let point = resolve_point(lat, lng, None, &DefaultsConfig::default());
        assert_eq!((point.lat, point.lng), expected);
        assert!(point.name.is_none());
    }

    #[test]
    fn test_resolve_point_keeps_name() {
        let point = resolve_point(Some("1"), Some("2"), Some(" Home "), &DefaultsConfig::default());
        assert_eq!(point.name.as_deref(), Some("Home"));
    }

    #[rstest]
    #[case(Some("true"), true)]
    #[case(Some("TRUE"), true)]
    #[case(Some("false"), false)]
    #[case(Some("1"), false)]
    #[case(None, false)]
    fn test_is_true(#[case] raw: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_true(raw), expected);
    }
}
