//! Mapping of provider vocabularies onto the canonical taxonomy
//!
//! Every function here is total: unknown, empty or missing input maps to a
//! documented default instead of failing.

use std::collections::BTreeSet;

use crate::models::{AlertSeverity, AlertType, StormStatus};

const MPH_PER_KNOT: f64 = 1.150_78;
const MPH_PER_KMH: f64 = 0.621_371;
const KNOTS_PER_KMH: f64 = 0.539_957;
const INHG_PER_MB: f64 = 0.029_53;

/// Map a provider severity label to [`AlertSeverity`], defaulting to moderate.
#[must_use]
pub fn severity_from_provider(raw: Option<&str>) -> AlertSeverity {
    let Some(raw) = raw else {
        return AlertSeverity::default();
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "minor" => AlertSeverity::Minor,
        "moderate" => AlertSeverity::Moderate,
        "severe" => AlertSeverity::Severe,
        "extreme" => AlertSeverity::Extreme,
        _ => AlertSeverity::default(),
    }
}

/// Classify an alert by its event name. First matching keyword wins.
#[must_use]
pub fn alert_type_from_event(event: Option<&str>) -> AlertType {
    let Some(event) = event else {
        return AlertType::default();
    };
    let event = event.to_lowercase();
    const RULES: [(&str, AlertType); 5] = [
        ("hurricane", AlertType::Hurricane),
        ("tropical", AlertType::TropicalStorm),
        ("tornado", AlertType::Tornado),
        ("flood", AlertType::Flood),
        ("thunderstorm", AlertType::Thunderstorm),
    ];
    RULES
        .iter()
        .find(|(keyword, _)| event.contains(keyword))
        .map_or(AlertType::default(), |(_, kind)| *kind)
}

/// Map an NHC classification code (TD, TS, HU, ...) to a storm status.
#[must_use]
pub fn storm_status_from_code(code: Option<&str>) -> StormStatus {
    let Some(code) = code else {
        return StormStatus::Unknown;
    };
    match code.trim().to_ascii_uppercase().as_str() {
        "TD" => StormStatus::TropicalDepression,
        "TS" => StormStatus::TropicalStorm,
        "HU" | "TY" | "MH" => StormStatus::Hurricane,
        "SD" | "STD" => StormStatus::SubtropicalDepression,
        "SS" | "STS" => StormStatus::SubtropicalStorm,
        "PTC" => StormStatus::PotentialTropicalCyclone,
        "PC" | "PT" | "EX" => StormStatus::PostTropical,
        _ => StormStatus::Unknown,
    }
}

/// Derive a status from sustained wind when the feed has no classification.
#[must_use]
pub fn storm_status_from_wind_kt(wind_kt: f64) -> StormStatus {
    if !wind_kt.is_finite() || wind_kt < 0.0 {
        StormStatus::Unknown
    } else if wind_kt >= 64.0 {
        StormStatus::Hurricane
    } else if wind_kt >= 34.0 {
        StormStatus::TropicalStorm
    } else {
        StormStatus::TropicalDepression
    }
}

/// Saffir-Simpson category for a sustained wind in knots.
#[must_use]
pub fn saffir_simpson_category(wind_kt: f64) -> Option<u8> {
    if !wind_kt.is_finite() {
        return None;
    }
    match wind_kt {
        kt if kt >= 137.0 => Some(5),
        kt if kt >= 113.0 => Some(4),
        kt if kt >= 96.0 => Some(3),
        kt if kt >= 83.0 => Some(2),
        kt if kt >= 64.0 => Some(1),
        _ => None,
    }
}

#[must_use]
pub fn knots_to_mph(kt: f64) -> f64 {
    round2(kt * MPH_PER_KNOT)
}

#[must_use]
pub fn kmh_to_mph(kmh: f64) -> f64 {
    round2(kmh * MPH_PER_KMH)
}

#[must_use]
pub fn kmh_to_knots(kmh: f64) -> f64 {
    round2(kmh * KNOTS_PER_KMH)
}

#[must_use]
pub fn millibars_to_inhg(mb: f64) -> f64 {
    round2(mb * INHG_PER_MB)
}

/// Round to two decimal places
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Split an area description such as `"Miami-Dade; Broward"` into a set.
#[must_use]
pub fn split_areas(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|area| !area.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercase a provider condition label, turning `MOSTLY_CLOUDY` into `mostly cloudy`.
#[must_use]
pub fn normalize_condition(raw: Option<&str>) -> String {
    let label = raw
        .unwrap_or_default()
        .trim()
        .replace('_', " ")
        .to_lowercase();
    let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
    if label.is_empty() {
        "unknown".to_string()
    } else {
        label
    }
}

/// Display name given to storms a feed reports without one
pub const UNNAMED_STORM: &str = "Unnamed";

/// True for names that do not identify a storm
#[must_use]
pub fn is_placeholder_storm_name(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case(UNNAMED_STORM)
}

/// Turn feed names like `"MILTON-24"` or `"milton"` into `"Milton"`.
#[must_use]
pub fn storm_display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let base = match trimmed.rsplit_once('-') {
        Some((name, suffix))
            if !name.is_empty() && !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) =>
        {
            name
        }
        _ => trimmed,
    };
    base.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
