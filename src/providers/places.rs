//! Google Places text search, used for shelter lookups

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{FetchOutcome, PlaceQuery, PlaceSearch, ProviderError, get_json};
use crate::models::{PlaceResult, Point};
use crate::normalize::round2;

const PROVIDER: &str = "google-places";
const SOURCE_LABEL: &str = "places";

pub struct GooglePlacesClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceEntry>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceEntry {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Option<PlaceGeometry>,
    opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
struct PlaceGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
}

impl GooglePlacesClient {
    pub fn new(
        client: ClientWithMiddleware,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self), fields(query = %query.text, radius_m = query.radius_m))]
    pub async fn text_search(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, ProviderError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ProviderError::configuration_missing(PROVIDER));
        };

        let url = format!(
            "{}/maps/api/place/textsearch/json?query={}&location={},{}&radius={}&key={}",
            self.base_url,
            urlencoding::encode(&query.text),
            query.origin.lat,
            query.origin.lng,
            query.radius_m,
            urlencoding::encode(key)
        );

        let response: TextSearchResponse = get_json(PROVIDER, self.client.get(&url)).await?;
        let results = results_from_response(response, &query.origin)?;
        debug!("Places search returned {} results", results.len());
        Ok(results)
    }
}

#[async_trait]
impl PlaceSearch for GooglePlacesClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &PlaceQuery) -> FetchOutcome<Vec<PlaceResult>> {
        FetchOutcome::from_list(self.text_search(query).await)
    }
}

fn results_from_response(
    response: TextSearchResponse,
    origin: &Point,
) -> Result<Vec<PlaceResult>, ProviderError> {
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => {}
        status => {
            return Err(ProviderError::unavailable(
                PROVIDER,
                format!(
                    "status {status}: {}",
                    response.error_message.as_deref().unwrap_or("no details")
                ),
            ));
        }
    }

    let results = response
        .results
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(geometry) = entry.geometry else {
                warn!("Skipping place without geometry: {:?}", entry.name);
                return None;
            };
            let location = Point::new(geometry.location.lat, geometry.location.lng);
            Some(PlaceResult {
                id: entry.place_id.unwrap_or_else(|| format!("place-{index}")),
                name: entry.name.unwrap_or_default(),
                kind: "shelter".to_string(),
                address: entry.formatted_address.unwrap_or_default(),
                lat: location.lat,
                lng: location.lng,
                open_now: entry.opening_hours.and_then(|h| h.open_now),
                distance_km: Some(round2(origin.distance_km(&location))),
                source: SOURCE_LABEL.to_string(),
            })
        })
        .collect();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> TextSearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_result_mapping() {
        let origin = Point::new(25.774, -80.193);
        let results = results_from_response(
            response(json!({
                "status": "OK",
                "results": [
                    {
                        "place_id": "abc",
                        "name": "Camillus House",
                        "formatted_address": "1603 NW 7th Ave, Miami, FL",
                        "geometry": { "location": { "lat": 25.79, "lng": -80.21 } },
                        "opening_hours": { "open_now": true }
                    },
                    {
                        "place_id": "def",
                        "name": "Unknown Hours",
                        "geometry": { "location": { "lat": 25.77, "lng": -80.19 } }
                    },
                    { "place_id": "nowhere", "name": "No Geometry" }
                ]
            })),
            &origin,
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "abc");
        assert_eq!(results[0].kind, "shelter");
        assert_eq!(results[0].open_now, Some(true));
        assert_eq!(results[0].source, "places");
        assert!(results[0].distance_km.unwrap() > 0.0);
        assert_eq!(results[1].open_now, None);
        assert_eq!(results[1].address, "");
    }

    #[test]
    fn test_zero_results_is_ok() {
        let results = results_from_response(
            response(json!({ "status": "ZERO_RESULTS", "results": [] })),
            &Point::new(0.0, 0.0),
        )
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_denied_status_is_unavailable() {
        let err = results_from_response(
            response(json!({ "status": "REQUEST_DENIED", "error_message": "bad key" })),
            &Point::new(0.0, 0.0),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { .. }));
        assert!(err.to_string().contains("bad key"));
    }
}
