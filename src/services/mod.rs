//! Aggregation services: cache-fronted orchestration of provider adapters
//!
//! Each service owns its cache and freshness policy, runs adapters
//! concurrently on refresh, and replaces any adapter failure with fallback
//! data so callers always receive a complete payload.

pub mod hurricanes;
pub mod weather;

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::models::DataSource;
use crate::providers::{FetchOutcome, ProviderError};

pub use hurricanes::{HurricaneService, HurricaneSettings};
pub use weather::{HomeRegion, WeatherReport, WeatherService, WeatherSettings};

/// Bound an adapter call by the overall upstream deadline
pub(crate) async fn with_deadline<T>(
    provider: &'static str,
    deadline: Duration,
    call: impl Future<Output = FetchOutcome<T>>,
) -> FetchOutcome<T> {
    match tokio::time::timeout(deadline, call).await {
        Ok(outcome) => outcome,
        Err(_) => FetchOutcome::Failed(ProviderError::unavailable(
            provider,
            format!("no response within {}s", deadline.as_secs_f32()),
        )),
    }
}

/// Resolve an adapter outcome into a payload and its source tag
pub(crate) fn settle<T>(
    provider: &str,
    outcome: FetchOutcome<T>,
    fallback: impl FnOnce() -> T,
) -> (T, DataSource) {
    match outcome {
        FetchOutcome::Fetched(value) => (value, DataSource::Live),
        FetchOutcome::Empty => {
            info!(provider, "Provider returned no data, serving fallback");
            (fallback(), DataSource::Mock)
        }
        FetchOutcome::Failed(err) => {
            log_failure(&err);
            (fallback(), err.source_tag())
        }
    }
}

/// Missing configuration is expected, outages are not, schema drift is a bug
pub(crate) fn log_failure(err: &ProviderError) {
    let provider = err.provider();
    match err {
        ProviderError::ConfigurationMissing { .. } => {
            debug!(provider, "Provider not configured, serving fallback");
        }
        ProviderError::Unavailable { .. } => {
            warn!(provider, "Provider unavailable, serving fallback: {err}");
        }
        ProviderError::Malformed { .. } => {
            error!(provider, "Provider returned malformed data, serving fallback: {err}");
        }
    }
}
