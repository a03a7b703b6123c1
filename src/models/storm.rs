//! Active tropical systems

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StormStatus {
    TropicalDepression,
    TropicalStorm,
    Hurricane,
    SubtropicalDepression,
    SubtropicalStorm,
    PotentialTropicalCyclone,
    PostTropical,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StormMovement {
    /// Heading in degrees
    pub direction_deg: f64,
    pub speed_mph: f64,
}

/// One active storm as of `last_updated`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HurricaneRecord {
    pub id: String,
    pub name: String,
    pub status: StormStatus,
    /// Saffir-Simpson category, present only at hurricane strength
    pub category: Option<u8>,
    pub position: Point,
    pub max_wind_mph: Option<f64>,
    pub pressure_mb: Option<f64>,
    pub movement: Option<StormMovement>,
    pub basin: Option<String>,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}
