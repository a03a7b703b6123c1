//! National Weather Service active alerts

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{AlertsProvider, FetchOutcome, ProviderError, get_json};
use crate::models::{Point, WeatherAlert};
use crate::normalize::{alert_type_from_event, severity_from_provider, split_areas};

const PROVIDER: &str = "nws";
const SOURCE_LABEL: &str = "National Weather Service";

/// Client for `api.weather.gov` alerts
pub struct NwsAlertsClient {
    client: ClientWithMiddleware,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AlertCollection {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    pub id: Option<String>,
    pub properties: Option<AlertProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    pub id: Option<String>,
    pub headline: Option<String>,
    pub event: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub area_desc: Option<String>,
    pub effective: Option<String>,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub ends: Option<String>,
}

impl NwsAlertsClient {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Active alerts covering `point`
    #[instrument(skip(self), fields(lat = point.lat, lng = point.lng))]
    pub async fn active_alerts(&self, point: &Point) -> Result<Vec<WeatherAlert>, ProviderError> {
        let url = format!(
            "{}/alerts/active?point={:.4},{:.4}",
            self.base_url, point.lat, point.lng
        );
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/geo+json");

        let collection: AlertCollection = get_json(PROVIDER, request).await?;
        let alerts = alerts_from_collection(collection, Utc::now());
        debug!("NWS returned {} active alerts", alerts.len());
        Ok(alerts)
    }
}

#[async_trait]
impl AlertsProvider for NwsAlertsClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, point: &Point) -> FetchOutcome<Vec<WeatherAlert>> {
        FetchOutcome::from_list(self.active_alerts(point).await)
    }
}

/// Convert every feature carrying properties into a canonical alert
pub fn alerts_from_collection(collection: AlertCollection, now: DateTime<Utc>) -> Vec<WeatherAlert> {
    collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let properties = feature.properties?;
            let id = properties
                .id
                .or(feature.id)
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("nws-{index}"));

            let title = properties
                .headline
                .clone()
                .or_else(|| properties.event.clone())
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| "Weather Alert".to_string());

            let start_time = first_instant(&[&properties.effective, &properties.onset]).unwrap_or(now);
            let end_time = first_instant(&[&properties.expires, &properties.ends])
                .unwrap_or(now + Duration::hours(1));

            Some(WeatherAlert {
                id,
                title,
                description: properties.description.unwrap_or_default(),
                severity: severity_from_provider(properties.severity.as_deref()),
                kind: alert_type_from_event(properties.event.as_deref()),
                start_time,
                end_time,
                source: SOURCE_LABEL.to_string(),
                areas: split_areas(properties.area_desc.as_deref()),
            })
        })
        .collect()
}

fn first_instant(candidates: &[&Option<String>]) -> Option<DateTime<Utc>> {
    candidates
        .iter()
        .filter_map(|raw| raw.as_deref())
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|instant| instant.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, AlertType};
    use chrono::TimeZone;

    fn collection(json: serde_json::Value) -> AlertCollection {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_feature_mapping() {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let alerts = alerts_from_collection(
            collection(serde_json::json!({
                "features": [{
                    "id": "https://api.weather.gov/alerts/urn:oid:1",
                    "properties": {
                        "id": "urn:oid:1",
                        "headline": "Hurricane Warning issued September 1",
                        "event": "Hurricane Warning",
                        "description": "Hurricane conditions expected.",
                        "severity": "Extreme",
                        "areaDesc": "Miami-Dade; Broward",
                        "effective": "2025-09-01T10:00:00-04:00",
                        "expires": "2025-09-02T10:00:00-04:00"
                    }
                }]
            })),
            now,
        );

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.id, "urn:oid:1");
        assert_eq!(alert.title, "Hurricane Warning issued September 1");
        assert_eq!(alert.severity, AlertSeverity::Extreme);
        assert_eq!(alert.kind, AlertType::Hurricane);
        assert_eq!(alert.source, "National Weather Service");
        assert_eq!(alert.start_time, Utc.with_ymd_and_hms(2025, 9, 1, 14, 0, 0).unwrap());
        assert_eq!(alert.areas.len(), 2);
        assert!(alert.areas.contains("Broward"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let alerts = alerts_from_collection(
            collection(serde_json::json!({
                "features": [
                    { "properties": { "onset": "not a date" } },
                    { "id": "skipped-without-properties" },
                    { "properties": { "event": "Flood Advisory", "severity": "Unknown" } }
                ]
            })),
            now,
        );

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].id, "nws-0");
        assert_eq!(alerts[0].title, "Weather Alert");
        assert_eq!(alerts[0].start_time, now);
        assert_eq!(alerts[0].end_time, now + Duration::hours(1));
        assert_eq!(alerts[0].kind, AlertType::Other);
        assert!(alerts[0].areas.is_empty());

        assert_eq!(alerts[1].id, "nws-2");
        assert_eq!(alerts[1].title, "Flood Advisory");
        assert_eq!(alerts[1].severity, AlertSeverity::Moderate);
        assert_eq!(alerts[1].kind, AlertType::Flood);
    }

    #[test]
    fn test_onset_and_ends_are_fallbacks() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let alerts = alerts_from_collection(
            collection(serde_json::json!({
                "features": [{ "properties": {
                    "onset": "2025-06-01T06:00:00Z",
                    "ends": "2025-06-01T18:00:00Z"
                }}]
            })),
            now,
        );
        assert_eq!(alerts[0].start_time, Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap());
        assert_eq!(alerts[0].end_time, Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
    }
}
