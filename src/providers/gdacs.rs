//! GDACS tropical cyclone event list (GeoJSON)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{FetchOutcome, ProviderError, StormProvider, get_json};
use crate::models::{HurricaneRecord, Point};
use crate::normalize::{
    UNNAMED_STORM, kmh_to_knots, kmh_to_mph, saffir_simpson_category, storm_display_name,
    storm_status_from_wind_kt,
};

const PROVIDER: &str = "gdacs";
const SOURCE_LABEL: &str = "GDACS";

pub struct GdacsClient {
    client: ClientWithMiddleware,
    url: String,
}

#[derive(Debug, Deserialize)]
struct EventCollection {
    #[serde(default)]
    features: Vec<EventFeature>,
}

#[derive(Debug, Deserialize)]
struct EventFeature {
    geometry: Option<Geometry>,
    properties: Option<EventProperties>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    coordinates: Value,
}

#[derive(Debug, Deserialize)]
struct EventProperties {
    eventid: Option<Value>,
    eventname: Option<String>,
    name: Option<String>,
    /// `true`, `"true"` or `"false"` depending on the endpoint
    iscurrent: Option<Value>,
    severitydata: Option<SeverityData>,
    datemodified: Option<String>,
    todate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeverityData {
    /// Maximum sustained wind in km/h
    severity: Option<f64>,
}

impl GdacsClient {
    pub fn new(client: ClientWithMiddleware, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn current_cyclones(&self) -> Result<Vec<HurricaneRecord>, ProviderError> {
        let request = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json");
        let events: EventCollection = get_json(PROVIDER, request).await?;
        let storms = storms_from_events(events, Utc::now())?;
        debug!("GDACS reported {} current cyclones", storms.len());
        Ok(storms)
    }
}

#[async_trait]
impl StormProvider for GdacsClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self) -> FetchOutcome<Vec<HurricaneRecord>> {
        FetchOutcome::from_list(self.current_cyclones().await)
    }
}

fn storms_from_events(
    events: EventCollection,
    now: DateTime<Utc>,
) -> Result<Vec<HurricaneRecord>, ProviderError> {
    let current: Vec<_> = events
        .features
        .into_iter()
        .filter(|feature| {
            feature
                .properties
                .as_ref()
                .is_some_and(|p| p.iscurrent.as_ref().is_some_and(truthy))
        })
        .collect();

    let total = current.len();
    let storms: Vec<_> = current
        .into_iter()
        .filter_map(|feature| record_from_feature(feature, now))
        .collect();

    if total > 0 && storms.is_empty() {
        return Err(ProviderError::malformed(
            PROVIDER,
            format!("none of {total} current events had a usable position"),
        ));
    }
    if storms.len() < total {
        warn!(
            "Skipped {} of {} GDACS events without a usable position",
            total - storms.len(),
            total
        );
    }
    Ok(storms)
}

fn record_from_feature(feature: EventFeature, now: DateTime<Utc>) -> Option<HurricaneRecord> {
    let properties = feature.properties?;
    let raw_name = properties
        .eventname
        .as_deref()
        .or(properties.name.as_deref())
        .unwrap_or(UNNAMED_STORM);

    let Some(position) = feature.geometry.as_ref().and_then(point_from_geometry) else {
        warn!("GDACS event '{}' has no point geometry", raw_name);
        return None;
    };

    let wind_kmh = properties
        .severitydata
        .as_ref()
        .and_then(|s| s.severity)
        .filter(|v| v.is_finite());
    let wind_kt = wind_kmh.map(kmh_to_knots);

    let name = storm_display_name(raw_name);
    let id = match properties.eventid.as_ref() {
        Some(Value::Number(n)) => format!("gdacs-{n}"),
        Some(Value::String(s)) if !s.trim().is_empty() => format!("gdacs-{}", s.trim()),
        _ => format!("gdacs-{}", name.to_lowercase()),
    };

    Some(HurricaneRecord {
        id,
        name,
        status: wind_kt.map_or(Default::default(), storm_status_from_wind_kt),
        category: wind_kt.and_then(saffir_simpson_category),
        position,
        max_wind_mph: wind_kmh.map(kmh_to_mph),
        pressure_mb: None,
        movement: None,
        basin: None,
        source: SOURCE_LABEL.to_string(),
        last_updated: properties
            .datemodified
            .as_deref()
            .or(properties.todate.as_deref())
            .and_then(parse_gdacs_time)
            .unwrap_or(now),
    })
}

fn point_from_geometry(geometry: &Geometry) -> Option<Point> {
    if !geometry
        .kind
        .as_deref()
        .is_some_and(|kind| kind.eq_ignore_ascii_case("point"))
    {
        return None;
    }
    let coordinates = geometry.coordinates.as_array()?;
    let lng = coordinates.first()?.as_f64()?;
    let lat = coordinates.get(1)?.as_f64()?;
    let point = Point::new(lat, lng);
    point.is_valid().then_some(point)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// GDACS timestamps usually omit the offset and are UTC
fn parse_gdacs_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StormStatus;
    use chrono::TimeZone;
    use serde_json::json;

    fn events(value: Value) -> EventCollection {
        serde_json::from_value(value).unwrap()
    }

    fn feature(name: &str, current: Value, coordinates: Value, kmh: f64) -> Value {
        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": coordinates },
            "properties": {
                "eventtype": "TC",
                "eventid": 1001,
                "eventname": name,
                "iscurrent": current,
                "severitydata": { "severity": kmh, "severityunit": "km/h" },
                "datemodified": "2024-10-09T12:00:00"
            }
        })
    }

    #[test]
    fn test_current_event_mapping() {
        let storms = storms_from_events(
            events(json!({
                "features": [feature("MILTON-24", json!("true"), json!([-86.0, 23.1]), 259.0)]
            })),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(storms.len(), 1);
        let milton = &storms[0];
        assert_eq!(milton.id, "gdacs-1001");
        assert_eq!(milton.name, "Milton");
        assert_eq!(milton.status, StormStatus::Hurricane);
        assert_eq!(milton.category, Some(5));
        assert_eq!(milton.position, Point::new(23.1, -86.0));
        assert_eq!(milton.max_wind_mph, Some(160.94));
        assert_eq!(milton.source, "GDACS");
        assert_eq!(
            milton.last_updated,
            Utc.with_ymd_and_hms(2024, 10, 9, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_past_events_are_ignored() {
        let storms = storms_from_events(
            events(json!({
                "features": [
                    feature("OLD-23", json!("false"), json!([-70.0, 20.0]), 120.0),
                    feature("NEW-25", json!(true), json!([130.0, 15.0]), 90.0)
                ]
            })),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].name, "New");
        assert_eq!(storms[0].status, StormStatus::TropicalStorm);
    }

    #[test]
    fn test_current_events_without_geometry_are_malformed() {
        let result = storms_from_events(
            events(json!({
                "features": [feature("BAD-25", json!("true"), json!(null), 120.0)]
            })),
            Utc::now(),
        );
        assert!(matches!(result, Err(ProviderError::Malformed { .. })));
    }

    #[test]
    fn test_no_current_events_is_empty() {
        let storms = storms_from_events(
            events(json!({
                "features": [feature("OLD-23", json!("false"), json!([-70.0, 20.0]), 120.0)]
            })),
            Utc::now(),
        )
        .unwrap();
        assert!(storms.is_empty());
    }
}
