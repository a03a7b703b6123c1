//! Request points, cache region keys and response locations

use serde::{Deserialize, Serialize};

/// A geographic point supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl Point {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: Some(name.into()),
        }
    }

    /// Whether both coordinates are finite and inside their valid ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Point) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.lat,
                longitude: self.lng,
            },
            haversine::Location {
                latitude: other.lat,
                longitude: other.lng,
            },
            haversine::Units::Kilometers,
        )
    }

    /// Quantize this point into a cache region
    #[must_use]
    pub fn region_key(&self, precision: u32) -> RegionKey {
        RegionKey::new(self, precision)
    }
}

/// Cache key for weather lookups: a point rounded to a fixed number of decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    lat_scaled: i64,
    lng_scaled: i64,
    precision: u32,
}

impl RegionKey {
    #[must_use]
    pub fn new(point: &Point, precision: u32) -> Self {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(2));
        Self {
            lat_scaled: (point.lat * multiplier).round() as i64,
            lng_scaled: (point.lng * multiplier).round() as i64,
            precision,
        }
    }
}

/// Location block echoed back in weather responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}
