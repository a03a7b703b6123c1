//! National Hurricane Center active storms (`CurrentStorms.json`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{FetchOutcome, ProviderError, StormProvider, get_json};
use crate::models::{HurricaneRecord, Point, StormMovement, StormStatus};
use crate::normalize::{
    UNNAMED_STORM, knots_to_mph, saffir_simpson_category, storm_display_name,
    storm_status_from_code, storm_status_from_wind_kt,
};

const PROVIDER: &str = "nhc";
const SOURCE_LABEL: &str = "National Hurricane Center";

pub struct NhcClient {
    client: ClientWithMiddleware,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentStorms {
    #[serde(default)]
    active_storms: Vec<ActiveStorm>,
}

/// Numeric fields arrive as numbers or strings depending on the product
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveStorm {
    id: Option<String>,
    bin_number: Option<String>,
    name: Option<String>,
    classification: Option<String>,
    intensity: Option<Value>,
    pressure: Option<Value>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    latitude_numeric: Option<Value>,
    longitude_numeric: Option<Value>,
    movement_dir: Option<Value>,
    movement_speed: Option<Value>,
    last_update: Option<String>,
}

impl NhcClient {
    pub fn new(client: ClientWithMiddleware, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn active_storms(&self) -> Result<Vec<HurricaneRecord>, ProviderError> {
        let feed: CurrentStorms = get_json(PROVIDER, self.client.get(&self.url)).await?;
        let storms = storms_from_feed(feed, Utc::now())?;
        debug!("NHC reported {} active storms", storms.len());
        Ok(storms)
    }
}

#[async_trait]
impl StormProvider for NhcClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self) -> FetchOutcome<Vec<HurricaneRecord>> {
        FetchOutcome::from_list(self.active_storms().await)
    }
}

fn storms_from_feed(
    feed: CurrentStorms,
    now: DateTime<Utc>,
) -> Result<Vec<HurricaneRecord>, ProviderError> {
    let total = feed.active_storms.len();
    let mut skipped = 0;
    let mut storms = Vec::with_capacity(total);

    for storm in feed.active_storms {
        match record_from_storm(storm, now) {
            Some(record) => storms.push(record),
            None => skipped += 1,
        }
    }

    if total > 0 && storms.is_empty() {
        return Err(ProviderError::malformed(
            PROVIDER,
            format!("none of {total} storms had a usable position"),
        ));
    }
    if skipped > 0 {
        warn!("Skipped {} of {} NHC storms without a usable position", skipped, total);
    }
    Ok(storms)
}

fn record_from_storm(storm: ActiveStorm, now: DateTime<Utc>) -> Option<HurricaneRecord> {
    let raw_name = storm.name.as_deref().unwrap_or(UNNAMED_STORM);

    let lat = storm
        .latitude_numeric
        .as_ref()
        .and_then(number)
        .or_else(|| storm.latitude.as_ref().and_then(hemisphere_coordinate));
    let lng = storm
        .longitude_numeric
        .as_ref()
        .and_then(number)
        .or_else(|| storm.longitude.as_ref().and_then(hemisphere_coordinate));
    let position = match (lat, lng) {
        (Some(lat), Some(lng)) if Point::new(lat, lng).is_valid() => Point::new(lat, lng),
        _ => {
            warn!("NHC storm '{}' has no usable position", raw_name);
            return None;
        }
    };

    let wind_kt = storm.intensity.as_ref().and_then(number);
    let status = match storm_status_from_code(storm.classification.as_deref()) {
        StormStatus::Unknown => wind_kt.map_or(StormStatus::Unknown, storm_status_from_wind_kt),
        status => status,
    };

    let movement = match (
        storm.movement_dir.as_ref().and_then(number),
        storm.movement_speed.as_ref().and_then(number),
    ) {
        (Some(direction_deg), Some(speed_mph)) => Some(StormMovement {
            direction_deg,
            speed_mph,
        }),
        _ => None,
    };

    let name = storm_display_name(raw_name);
    Some(HurricaneRecord {
        id: storm
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("nhc-{}", name.to_lowercase())),
        name,
        status,
        category: wind_kt.and_then(saffir_simpson_category),
        position,
        max_wind_mph: wind_kt.map(knots_to_mph),
        pressure_mb: storm.pressure.as_ref().and_then(number),
        movement,
        basin: storm.bin_number.as_deref().and_then(basin_from_bin),
        source: SOURCE_LABEL.to_string(),
        last_updated: storm
            .last_update
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or(now, |t| t.with_timezone(&Utc)),
    })
}

/// A finite number, accepting numeric strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

/// Parse `"22.1N"` or `"68.3W"` style coordinates
fn hemisphere_coordinate(value: &Value) -> Option<f64> {
    let raw = value.as_str()?.trim();
    let (digits, sign) = match raw.chars().last()? {
        'N' | 'n' | 'E' | 'e' => (&raw[..raw.len() - 1], 1.0),
        'S' | 's' | 'W' | 'w' => (&raw[..raw.len() - 1], -1.0),
        _ => (raw, 1.0),
    };
    digits.trim().parse::<f64>().ok().map(|v| v * sign)
}

/// `AT5` -> `AL`, `EP1` -> `EP`, `CP2` -> `CP`
fn basin_from_bin(bin: &str) -> Option<String> {
    let prefix: String = bin.chars().take(2).collect::<String>().to_ascii_uppercase();
    match prefix.as_str() {
        "AT" | "AL" => Some("AL".to_string()),
        "EP" => Some("EP".to_string()),
        "CP" => Some("CP".to_string()),
        _ => None,
    }
}
