//! Provider adapters against mock upstream servers.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stormwatch::config::HttpConfig;
use stormwatch::fallback::FallbackGenerator;
use stormwatch::models::{AlertSeverity, AlertType, Point, StormStatus};
use stormwatch::providers::{
    AlertsProvider, ConditionsProvider, FetchOutcome, GdacsClient, GoogleWeatherClient,
    GooglePlacesClient, NhcClient, NwsAlertsClient, PlaceQuery, PlaceSearch, ProviderError,
    StormProvider, build_client,
};

fn client() -> ClientWithMiddleware {
    build_client(&HttpConfig {
        max_retries: 0,
        timeout_seconds: 5,
        ..HttpConfig::default()
    })
    .unwrap()
}

fn miami() -> Point {
    Point::new(25.774, -80.193)
}

fn keys(value: &Value) -> BTreeSet<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

fn daily_entry(date: NaiveDate, day_qpf: f64, night_qpf: f64, day_wind: f64) -> Value {
    json!({
        "displayDate": { "year": chrono::Datelike::year(&date), "month": chrono::Datelike::month(&date), "day": chrono::Datelike::day(&date) },
        "maxTemperature": { "degrees": 88.0 },
        "minTemperature": { "degrees": 76.0 },
        "daytimeForecast": {
            "weatherCondition": { "description": { "text": "Scattered Thunderstorms" }, "type": "SCATTERED_THUNDERSTORMS" },
            "relativeHumidity": 80,
            "precipitation": { "qpf": { "quantity": day_qpf, "unit": "INCHES" } },
            "wind": { "speed": { "value": day_wind, "unit": "MILES_PER_HOUR" } }
        },
        "nighttimeForecast": {
            "relativeHumidity": 90,
            "precipitation": { "qpf": { "quantity": night_qpf, "unit": "INCHES" } },
            "wind": { "speed": { "value": 10.0, "unit": "MILES_PER_HOUR" } }
        }
    })
}

fn current_conditions() -> Value {
    json!({
        "currentTime": "2025-08-14T18:00:00Z",
        "timeZone": { "id": "America/New_York" },
        "weatherCondition": { "description": { "text": "Partly Cloudy" }, "type": "PARTLY_CLOUDY" },
        "temperature": { "degrees": 89.6, "unit": "FAHRENHEIT" },
        "relativeHumidity": 68,
        "uvIndex": 9,
        "wind": { "direction": { "degrees": 135 }, "speed": { "value": 12.0, "unit": "MILES_PER_HOUR" } },
        "visibility": { "distance": 10.0, "unit": "MILES" },
        "airPressure": { "meanSeaLevelMillibars": 1013.25 }
    })
}

async fn mount_google_weather(server: &MockServer, days: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/currentConditions:lookup"))
        .and(header("x-goog-api-key", "test-key"))
        .and(query_param_is_missing("key"))
        .and(query_param("unitsSystem", "IMPERIAL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_conditions()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast/days:lookup"))
        .and(header("x-goog-api-key", "test-key"))
        .and(query_param_is_missing("key"))
        .and(query_param("days", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "forecastDays": days })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_google_weather_conditions_and_forecast() {
    let server = MockServer::start().await;
    let start = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
    let days: Vec<Value> = start
        .iter_days()
        .take(7)
        .enumerate()
        .map(|(i, date)| match i {
            0 => daily_entry(date, 1.5, 0.75, 18.0),
            1 => daily_entry(date, 0.2, 0.1, 30.0),
            _ => daily_entry(date, 0.0, 0.0, 8.0),
        })
        .collect();
    mount_google_weather(&server, days).await;

    let weather = GoogleWeatherClient::new(client(), Some("test-key".to_string()), server.uri());
    let report = match weather.fetch(&miami()).await {
        FetchOutcome::Fetched(report) => report,
        other => panic!("expected conditions, got {other:?}"),
    };

    assert_eq!(report.current.temperature, 89.6);
    assert_eq!(report.current.condition, "partly cloudy");
    assert_eq!(report.current.wind_direction, 135);
    assert_eq!(report.current.uv_index, 9);
    assert_eq!(report.current.pressure, 29.92);

    assert_eq!(report.forecast.len(), 5);
    assert_eq!(report.forecast[0].date, start);
    assert_eq!(report.forecast[0].precipitation, 2.25);
    assert_eq!(report.forecast[0].wind_speed, 18.0);
    assert!(report.forecast[0].is_hurricane_risk);
    assert_eq!(report.forecast[1].wind_speed, 30.0);
    assert!(report.forecast[1].is_hurricane_risk);
    assert!(!report.forecast[2].is_hurricane_risk);
}

#[tokio::test]
async fn test_google_weather_short_forecast_is_malformed() {
    let server = MockServer::start().await;
    let start = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
    let days = start
        .iter_days()
        .take(3)
        .map(|date| daily_entry(date, 0.0, 0.0, 5.0))
        .collect();
    mount_google_weather(&server, days).await;

    let weather = GoogleWeatherClient::new(client(), Some("test-key".to_string()), server.uri());
    let outcome = weather.fetch(&miami()).await;
    assert!(matches!(outcome, FetchOutcome::Failed(ProviderError::Malformed { .. })));
}

#[tokio::test]
async fn test_google_weather_without_key_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let weather = GoogleWeatherClient::new(client(), None, server.uri());
    let outcome = weather.fetch(&miami()).await;
    assert_eq!(
        outcome,
        FetchOutcome::Failed(ProviderError::configuration_missing("google-weather"))
    );
}

#[tokio::test]
async fn test_upstream_error_status_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&server)
        .await;

    let weather = GoogleWeatherClient::new(client(), Some("test-key".to_string()), server.uri());
    match weather.fetch(&miami()).await {
        FetchOutcome::Failed(err @ ProviderError::Unavailable { .. }) => {
            assert!(err.to_string().contains("503"));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_nws_alerts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .and(query_param("point", "25.7740,-80.1930"))
        .and(header("accept", "application/geo+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "id": "https://api.weather.gov/alerts/urn:oid:1",
                    "properties": {
                        "id": "urn:oid:1",
                        "headline": "Hurricane Warning issued August 14",
                        "event": "Hurricane Warning",
                        "description": "Hurricane conditions expected.",
                        "severity": "Extreme",
                        "areaDesc": "Miami-Dade; Broward",
                        "effective": "2025-08-14T10:00:00-04:00",
                        "expires": "2025-08-15T10:00:00-04:00"
                    }
                },
                {
                    "properties": {
                        "event": "Coastal Flood Advisory",
                        "severity": "Minor",
                        "areaDesc": "Coastal Miami-Dade"
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let nws = NwsAlertsClient::new(client(), server.uri());
    let alerts = match nws.fetch(&miami()).await {
        FetchOutcome::Fetched(alerts) => alerts,
        other => panic!("expected alerts, got {other:?}"),
    };

    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].id, "urn:oid:1");
    assert_eq!(alerts[0].kind, AlertType::Hurricane);
    assert_eq!(alerts[0].severity, AlertSeverity::Extreme);
    assert_eq!(alerts[0].areas.len(), 2);
    assert_eq!(alerts[0].source, "National Weather Service");

    assert_eq!(alerts[1].id, "nws-1");
    assert_eq!(alerts[1].title, "Coastal Flood Advisory");
    assert_eq!(alerts[1].kind, AlertType::Flood);
    assert_eq!(alerts[1].severity, AlertSeverity::Minor);
    assert!(alerts[1].end_time > alerts[1].start_time);
}

#[tokio::test]
async fn test_nws_empty_collection_is_empty_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "features": [] })))
        .mount(&server)
        .await;

    let nws = NwsAlertsClient::new(client(), server.uri());
    assert_eq!(nws.fetch(&miami()).await, FetchOutcome::Empty);
}

#[tokio::test]
async fn test_nws_invalid_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let nws = NwsAlertsClient::new(client(), server.uri());
    match nws.fetch(&miami()).await {
        FetchOutcome::Failed(err) => assert_eq!(err.provider(), "nws"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_nhc_active_storms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CurrentStorms.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activeStorms": [
                {
                    "id": "al052025",
                    "binNumber": "AT5",
                    "name": "Erin",
                    "classification": "HU",
                    "intensity": "115",
                    "pressure": "945",
                    "latitudeNumeric": 22.1,
                    "longitudeNumeric": -68.3,
                    "movementDir": 300,
                    "movementSpeed": 14,
                    "lastUpdate": "2025-08-17T15:00:00.000Z"
                },
                {
                    "binNumber": "EP1",
                    "name": "Ivo",
                    "intensity": 40,
                    "latitude": "18.5N",
                    "longitude": "110.2W"
                }
            ]
        })))
        .mount(&server)
        .await;

    let nhc = NhcClient::new(client(), format!("{}/CurrentStorms.json", server.uri()));
    let storms = match nhc.fetch().await {
        FetchOutcome::Fetched(storms) => storms,
        other => panic!("expected storms, got {other:?}"),
    };

    assert_eq!(storms.len(), 2);
    let erin = &storms[0];
    assert_eq!(erin.id, "al052025");
    assert_eq!(erin.status, StormStatus::Hurricane);
    assert_eq!(erin.category, Some(4));
    assert_eq!(erin.basin.as_deref(), Some("AL"));
    assert_eq!(erin.pressure_mb, Some(945.0));
    assert!(erin.movement.is_some());

    let ivo = &storms[1];
    assert_eq!(ivo.id, "nhc-ivo");
    assert_eq!(ivo.status, StormStatus::TropicalStorm);
    assert_eq!(ivo.category, None);
    assert_eq!(ivo.position.lat, 18.5);
    assert_eq!(ivo.position.lng, -110.2);
    assert_eq!(ivo.basin.as_deref(), Some("EP"));
}

#[tokio::test]
async fn test_nhc_quiet_basins_are_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "activeStorms": [] })))
        .mount(&server)
        .await;

    let nhc = NhcClient::new(client(), server.uri());
    assert_eq!(nhc.fetch().await, FetchOutcome::Empty);
}

#[tokio::test]
async fn test_gdacs_current_cyclones() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gdacsapi/api/events/geteventlist/SEARCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "geometry": { "type": "Point", "coordinates": [125.4, 15.2] },
                    "properties": {
                        "eventid": 1001150,
                        "eventname": "KROSA-25",
                        "iscurrent": "true",
                        "severitydata": { "severity": 185.0 },
                        "datemodified": "2025-08-14T06:00:00"
                    }
                },
                {
                    "geometry": { "type": "Point", "coordinates": [-40.0, 12.0] },
                    "properties": {
                        "eventid": 1001100,
                        "eventname": "OLD-25",
                        "iscurrent": "false",
                        "severitydata": { "severity": 90.0 }
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let gdacs = GdacsClient::new(
        client(),
        format!("{}/gdacsapi/api/events/geteventlist/SEARCH", server.uri()),
    );
    let storms = match gdacs.fetch().await {
        FetchOutcome::Fetched(storms) => storms,
        other => panic!("expected storms, got {other:?}"),
    };

    assert_eq!(storms.len(), 1);
    let krosa = &storms[0];
    assert_eq!(krosa.id, "gdacs-1001150");
    assert_eq!(krosa.name, "Krosa");
    assert_eq!(krosa.position.lat, 15.2);
    assert_eq!(krosa.position.lng, 125.4);
    assert_eq!(krosa.status, StormStatus::Hurricane);
    assert_eq!(krosa.source, "GDACS");
    assert!(krosa.last_updated < Utc::now());
}

#[tokio::test]
async fn test_places_text_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .and(query_param("query", "hurricane shelter"))
        .and(query_param("radius", "5000"))
        .and(query_param("key", "maps-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {
                    "place_id": "abc",
                    "name": "Shelter A",
                    "formatted_address": "1 Main St",
                    "geometry": { "location": { "lat": 25.78, "lng": -80.2 } },
                    "opening_hours": { "open_now": true }
                },
                { "place_id": "no-geometry", "name": "Nowhere" }
            ]
        })))
        .mount(&server)
        .await;

    let places = GooglePlacesClient::new(client(), Some("maps-key".to_string()), server.uri());
    let query = PlaceQuery {
        origin: miami(),
        radius_m: 5000,
        text: "hurricane shelter".to_string(),
    };
    let results = match places.search(&query).await {
        FetchOutcome::Fetched(results) => results,
        other => panic!("expected results, got {other:?}"),
    };

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "abc");
    assert_eq!(results[0].open_now, Some(true));
    assert_eq!(results[0].source, "places");
    assert!(results[0].distance_km.unwrap() < 2.0);
}

#[tokio::test]
async fn test_places_denied_status_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let places = GooglePlacesClient::new(client(), Some("bad".to_string()), server.uri());
    let query = PlaceQuery {
        origin: miami(),
        radius_m: 1000,
        text: "shelter".to_string(),
    };
    match places.search(&query).await {
        FetchOutcome::Failed(err @ ProviderError::Unavailable { .. }) => {
            assert!(err.to_string().contains("API key is invalid"));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_places_error_omits_key() {
    let places = GooglePlacesClient::new(
        client(),
        Some("SECRET-KEY-123".to_string()),
        "http://127.0.0.1:1",
    );
    let query = PlaceQuery {
        origin: miami(),
        radius_m: 1000,
        text: "shelter".to_string(),
    };
    match places.search(&query).await {
        FetchOutcome::Failed(err @ ProviderError::Unavailable { .. }) => {
            assert!(!err.to_string().contains("SECRET-KEY-123"));
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fallback_payloads_match_live_shape() {
    let server = MockServer::start().await;
    let start = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
    let days = start
        .iter_days()
        .take(5)
        .map(|date| daily_entry(date, 0.1, 0.1, 10.0))
        .collect();
    mount_google_weather(&server, days).await;

    let weather = GoogleWeatherClient::new(client(), Some("test-key".to_string()), server.uri());
    let FetchOutcome::Fetched(live) = weather.fetch(&miami()).await else {
        panic!("expected live conditions");
    };

    let fallback = FallbackGenerator::seeded(3);
    let now = Utc::now().with_timezone(&chrono_tz::America::New_York);
    let mock_current = serde_json::to_value(fallback.current_conditions(&now)).unwrap();
    let live_current = serde_json::to_value(&live.current).unwrap();
    assert_eq!(keys(&mock_current), keys(&live_current));

    let mock_day = serde_json::to_value(&fallback.forecast(&now)[0]).unwrap();
    let live_day = serde_json::to_value(&live.forecast[0]).unwrap();
    assert_eq!(keys(&mock_day), keys(&live_day));
}
