use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

use super::resolve_point;
use crate::models::PlaceResult;
use crate::providers::{FetchOutcome, PlaceQuery, ProviderError};
use crate::state::AppState;

/// Client-facing message; provider details stay in the logs
const SEARCH_FAILED: &str = "Shelter search failed";

#[derive(Debug, Default, Deserialize)]
pub struct ShelterQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Search radius in meters
    pub radius: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShelterResponse {
    pub results: Vec<PlaceResult>,
}

/// `GET /api/shelters`: pass-through place search, uncached
pub async fn get_shelters(
    State(state): State<AppState>,
    query: Result<Query<ShelterQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_else(|rejection| {
        warn!("Unreadable query string ({rejection}), using defaults");
        ShelterQuery::default()
    });

    let defaults = &state.defaults;
    let place_query = PlaceQuery {
        origin: resolve_point(query.lat.as_deref(), query.lng.as_deref(), None, defaults),
        radius_m: query
            .radius
            .as_deref()
            .and_then(|r| r.trim().parse().ok())
            .filter(|r| *r > 0)
            .unwrap_or(defaults.shelter_radius_m),
        text: query
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| defaults.shelter_query.clone()),
    };

    match state.places.search(&place_query).await {
        FetchOutcome::Fetched(results) => Json(ShelterResponse { results }).into_response(),
        FetchOutcome::Empty => Json(ShelterResponse { results: vec![] }).into_response(),
        FetchOutcome::Failed(ProviderError::ConfigurationMissing { .. }) => {
            debug!("Place search not configured, returning mock shelters");
            Json(ShelterResponse {
                results: state.fallback.shelters(&place_query.origin),
            })
            .into_response()
        }
        FetchOutcome::Failed(err) => {
            error!("Shelter search failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": SEARCH_FAILED })),
            )
                .into_response()
        }
    }
}
