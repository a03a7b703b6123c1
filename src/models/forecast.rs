//! Daily forecast model and the hurricane-risk derivation

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of days in every forecast, live or synthetic
pub const FORECAST_DAYS: usize = 5;

/// Wind speed (mph) above which a hurricane-season day is flagged
const RISK_WIND_MPH: f64 = 25.0;
/// Precipitation (inches) above which a hurricane-season day is flagged
const RISK_PRECIPITATION_IN: f64 = 2.0;

/// A single day's projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// High temperature in Fahrenheit
    pub high: f64,
    /// Low temperature in Fahrenheit
    pub low: f64,
    pub condition: String,
    /// Precipitation in inches
    pub precipitation: f64,
    /// Wind speed in mph
    pub wind_speed: f64,
    pub humidity: f64,
    pub is_hurricane_risk: bool,
}

impl ForecastDay {
    /// Build a forecast day; the risk flag is always derived from the stored values.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        high: f64,
        low: f64,
        condition: impl Into<String>,
        precipitation: f64,
        wind_speed: f64,
        humidity: f64,
    ) -> Self {
        Self {
            date,
            high,
            low,
            condition: condition.into(),
            precipitation,
            wind_speed,
            humidity,
            is_hurricane_risk: is_hurricane_risk(date, wind_speed, precipitation),
        }
    }
}

/// June through November inclusive
#[must_use]
pub fn is_hurricane_season<D: Datelike>(date: &D) -> bool {
    (6..=11).contains(&date.month())
}

#[must_use]
pub fn is_hurricane_risk(date: NaiveDate, wind_speed: f64, precipitation: f64) -> bool {
    is_hurricane_season(&date)
        && (wind_speed > RISK_WIND_MPH || precipitation > RISK_PRECIPITATION_IN)
}

/// True when `days` holds exactly [`FORECAST_DAYS`] entries on consecutive dates.
#[must_use]
pub fn is_consecutive_forecast(days: &[ForecastDay]) -> bool {
    days.len() == FORECAST_DAYS
        && days
            .windows(2)
            .all(|pair| pair[0].date.succ_opt() == Some(pair[1].date))
}
