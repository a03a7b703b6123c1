//! Canonical data model shared by every provider adapter
//!
//! - Location: request points, cache region keys and response locations
//! - Weather: current conditions snapshot
//! - Forecast: daily projections and the hurricane-risk derivation
//! - Alert: severe weather alerts and their fixed taxonomy
//! - Storm: active tropical systems
//! - Place: place-search results (shelters)

pub mod alert;
pub mod forecast;
pub mod location;
pub mod place;
pub mod storm;
pub mod weather;

use serde::{Deserialize, Serialize};

pub use alert::{AlertSeverity, AlertType, WeatherAlert};
pub use forecast::{FORECAST_DAYS, ForecastDay, is_hurricane_risk, is_hurricane_season};
pub use location::{LocationInfo, Point, RegionKey};
pub use place::PlaceResult;
pub use storm::{HurricaneRecord, StormMovement, StormStatus};
pub use weather::WeatherSnapshot;

/// Where a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Fetched from the upstream provider
    Live,
    /// Synthesized because the provider is unconfigured or had nothing to report
    Mock,
    /// Synthesized because the provider failed
    Error,
}

impl DataSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::Mock => "mock",
            DataSource::Error => "error",
        }
    }
}
