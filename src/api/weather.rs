use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::PointQuery;
use crate::models::{DataSource, ForecastDay, LocationInfo, WeatherAlert, WeatherSnapshot};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherResponse {
    pub current: WeatherSnapshot,
    pub alerts: Vec<WeatherAlert>,
    pub location: LocationInfo,
    pub source: DataSource,
    pub alerts_source: DataSource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastDay>,
    pub location: LocationInfo,
    pub last_updated: DateTime<Utc>,
    pub source: DataSource,
}

fn point_query(query: Result<Query<PointQuery>, QueryRejection>) -> PointQuery {
    query.map(|Query(q)| q).unwrap_or_else(|rejection| {
        warn!("Unreadable query string ({rejection}), using defaults");
        PointQuery::default()
    })
}

/// `GET /api/weather/current`; always 200
pub async fn get_current(
    State(state): State<AppState>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Json<CurrentWeatherResponse> {
    let query = point_query(query);
    let point = query.point(&state.defaults);
    let entry = state.weather.get(&point, query.force_refresh()).await;

    Json(CurrentWeatherResponse {
        current: entry.payload.current.clone(),
        alerts: entry.payload.alerts.clone(),
        location: state.weather.describe_location(&point),
        source: entry.source,
        alerts_source: entry.payload.alerts_source,
    })
}

/// `GET /api/weather/forecast`; always 200
pub async fn get_forecast(
    State(state): State<AppState>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Json<ForecastResponse> {
    let query = point_query(query);
    let point = query.point(&state.defaults);
    let entry = state.weather.get(&point, query.force_refresh()).await;

    Json(ForecastResponse {
        forecast: entry.payload.forecast.clone(),
        location: state.weather.describe_location(&point),
        last_updated: entry.fetched_at,
        source: entry.source,
    })
}
