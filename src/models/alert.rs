//! Severe weather alerts and the canonical alert taxonomy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Minor,
    #[default]
    Moderate,
    Severe,
    Extreme,
}

/// Canonical alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Hurricane,
    TropicalStorm,
    Tornado,
    Flood,
    Thunderstorm,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    /// Provider-assigned, unique within a fetch
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub source: String,
    /// Affected area names; a set, emitted sorted
    pub areas: BTreeSet<String>,
}
