use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::is_true;
use crate::models::{DataSource, HurricaneRecord};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HurricaneQuery {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HurricaneResponse {
    pub hurricanes: Vec<HurricaneRecord>,
    pub last_updated: DateTime<Utc>,
    pub source: DataSource,
}

/// `GET /api/hurricanes`
pub async fn get_hurricanes(
    State(state): State<AppState>,
    query: Result<Query<HurricaneQuery>, QueryRejection>,
) -> Response {
    let force_refresh = query.is_ok_and(|Query(q)| is_true(q.refresh.as_deref()));

    match state.hurricanes.get(force_refresh).await {
        Ok(entry) => Json(HurricaneResponse {
            hurricanes: entry.payload.clone(),
            last_updated: entry.fetched_at,
            source: entry.source,
        })
        .into_response(),
        Err(err) => {
            error!("Error fetching hurricane data: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch hurricane data",
                    "details": err.to_string(),
                    "hurricanes": [],
                    "lastUpdated": Utc::now(),
                    "source": "Error",
                })),
            )
                .into_response()
        }
    }
}
