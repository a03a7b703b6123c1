//! Upstream provider adapters
//!
//! Each adapter knows one provider's request shape and response schema and
//! returns a [`FetchOutcome`]. Transport, status and parse failures are absorbed
//! here and never propagate as errors into the aggregation services.

pub mod error;
pub mod gdacs;
pub mod google_weather;
pub mod http;
pub mod nhc;
pub mod nws;
pub mod places;

use async_trait::async_trait;
use reqwest_middleware::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::models::{ForecastDay, HurricaneRecord, PlaceResult, Point, WeatherAlert, WeatherSnapshot};

pub use error::ProviderError;
pub use gdacs::GdacsClient;
pub use google_weather::GoogleWeatherClient;
pub use http::build_client;
pub use nhc::NhcClient;
pub use nws::NwsAlertsClient;
pub use places::GooglePlacesClient;

/// Longest upstream body excerpt kept in error messages
const ERROR_BODY_LIMIT: usize = 200;

/// Result of one adapter call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The provider answered with usable data
    Fetched(T),
    /// The provider answered successfully but had nothing to report
    Empty,
    Failed(ProviderError),
}

impl<T> FetchOutcome<T> {
    pub fn from_result(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Self::Fetched(value),
            Err(err) => Self::Failed(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Fetched(value) => FetchOutcome::Fetched(f(value)),
            Self::Empty => FetchOutcome::Empty,
            Self::Failed(err) => FetchOutcome::Failed(err),
        }
    }
}

impl<U> FetchOutcome<Vec<U>> {
    /// Like [`FetchOutcome::from_result`], with an empty list becoming [`FetchOutcome::Empty`]
    pub fn from_list(result: Result<Vec<U>, ProviderError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Self::Empty,
            other => Self::from_result(other),
        }
    }
}

/// Current conditions together with the daily forecast
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionsReport {
    pub current: WeatherSnapshot,
    pub forecast: Vec<ForecastDay>,
}

#[async_trait]
pub trait ConditionsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, point: &Point) -> FetchOutcome<ConditionsReport>;
}

#[async_trait]
pub trait AlertsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, point: &Point) -> FetchOutcome<Vec<WeatherAlert>>;
}

/// A global feed of active storms
#[async_trait]
pub trait StormProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> FetchOutcome<Vec<HurricaneRecord>>;
}

/// Free-text place search around a point
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
    pub origin: Point,
    pub radius_m: u32,
    pub text: String,
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &PlaceQuery) -> FetchOutcome<Vec<PlaceResult>>;
}

/// Send `request` and decode a JSON body.
///
/// Transport failures and non-success statuses become `Unavailable`;
/// undecodable bodies become `Malformed`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| {
        ProviderError::unavailable(provider, format!("request failed: {}", transport_error(e)))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::unavailable(
            provider,
            format!("HTTP {status}: {}", excerpt(&body)),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| {
            ProviderError::unavailable(provider, format!("failed to read body: {}", e.without_url()))
        })?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::malformed(provider, format!("{e} in body: {}", excerpt(&body)))
    })
}

/// Describe a failed send without the request URL, which may carry credentials
fn transport_error(err: reqwest_middleware::Error) -> String {
    match err {
        reqwest_middleware::Error::Reqwest(err) => err.without_url().to_string(),
        reqwest_middleware::Error::Middleware(err) => redact_query(&format!("{err:#}")),
    }
}

/// Drop every URL query string from `message`
fn redact_query(message: &str) -> String {
    message
        .split_inclusive(char::is_whitespace)
        .map(|word| match word.split_once('?') {
            Some((head, tail)) if head.contains("://") => {
                let kept: String = tail.chars().filter(|c| c.is_whitespace() || *c == ')').collect();
                format!("{head}?[redacted]{kept}")
            }
            _ => word.to_string(),
        })
        .collect()
}

/// First characters of an upstream body, for log and error messages
fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(ERROR_BODY_LIMIT).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
