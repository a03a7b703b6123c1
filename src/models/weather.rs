//! Current conditions snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for a point, one per successful fetch cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Temperature in Fahrenheit
    pub temperature: f64,
    /// Lowercase condition label, e.g. "partly cloudy"
    pub condition: String,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed in mph
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    /// Pressure in inHg
    pub pressure: f64,
    /// Visibility in miles
    pub visibility: f64,
    pub uv_index: u8,
    pub timestamp: DateTime<Utc>,
}
