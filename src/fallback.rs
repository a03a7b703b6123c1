//! Synthetic, structurally valid data served when providers are unavailable
//!
//! Every payload produced here has exactly the shape of its live counterpart;
//! only the source tag attached by the caller tells them apart.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::models::{
    AlertSeverity, AlertType, FORECAST_DAYS, ForecastDay, HurricaneRecord, PlaceResult, Point,
    StormMovement, StormStatus, WeatherAlert, WeatherSnapshot, is_hurricane_season,
};
use crate::normalize::{knots_to_mph, round2, saffir_simpson_category};

const CONDITIONS: [&str; 5] = [
    "sunny",
    "partly cloudy",
    "cloudy",
    "light rain",
    "thunderstorms",
];
/// Outside the season only the calmer conditions are drawn
const CALM_CONDITIONS: usize = 3;

const THUNDERSTORM_PROBABILITY: f64 = 0.3;
const SECOND_STORM_PROBABILITY: f64 = 0.5;

pub const MOCK_SOURCE: &str = "mock";

/// Random source for synthetic payloads
pub struct FallbackGenerator {
    rng: Mutex<StdRng>,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackGenerator {
    /// Generator seeded from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self::seeded(rand::rng().random())
    }

    /// Deterministic generator, used by tests and `fallback.seed`
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    pub fn current_conditions<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> WeatherSnapshot {
        let in_season = is_hurricane_season(now);
        self.with_rng(|rng| WeatherSnapshot {
            temperature: rng.random_range(75.0_f64..90.0).round(),
            condition: if in_season { "partly cloudy" } else { "sunny" }.to_string(),
            humidity: rng.random_range(60.0_f64..90.0).round(),
            wind_speed: rng.random_range(5.0_f64..20.0).round(),
            wind_direction: rng.random_range(0.0_f64..360.0).round() as u16,
            pressure: round2(rng.random_range(29.5..31.0)),
            visibility: rng.random_range(8.0_f64..10.0).round(),
            uv_index: uv_index_for_hour(now.hour()),
            timestamp: now.with_timezone(&Utc),
        })
    }

    /// Five consecutive days starting with `now`'s date
    pub fn forecast<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<ForecastDay> {
        let in_season = is_hurricane_season(now);
        let choices = if in_season {
            CONDITIONS.len()
        } else {
            CALM_CONDITIONS
        };

        self.with_rng(|rng| {
            now.date_naive()
                .iter_days()
                .take(FORECAST_DAYS)
                .map(|date| {
                    let base = rng.random_range(75.0_f64..90.0);
                    let variation = rng.random_range(-5.0_f64..5.0);
                    let wind_speed = rng.random_range(5.0_f64..25.0).round();
                    let precipitation = round2(rng.random_range(0.0..3.0));
                    let condition = CONDITIONS[rng.random_range(0..choices)];
                    let humidity = rng.random_range(60.0_f64..90.0).round();
                    ForecastDay::new(
                        date,
                        (base + variation + 5.0).round(),
                        (base + variation - 5.0).round(),
                        condition,
                        precipitation,
                        wind_speed,
                        humidity,
                    )
                })
                .collect()
        })
    }

    /// Synthetic alert set; never empty
    pub fn alerts<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<WeatherAlert> {
        let start = now.with_timezone(&Utc);
        let mut alerts = Vec::new();

        if is_hurricane_season(now) {
            alerts.push(WeatherAlert {
                id: "mock-hurricane-watch".to_string(),
                title: "Hurricane Watch".to_string(),
                description: "A hurricane watch is in effect for Miami-Dade County. Conditions are favorable for hurricane development within the next 48 hours.".to_string(),
                severity: AlertSeverity::Severe,
                kind: AlertType::Hurricane,
                start_time: start,
                end_time: start + Duration::hours(48),
                source: "National Hurricane Center".to_string(),
                areas: ["Miami-Dade County".to_string(), "Broward County".to_string()].into(),
            });
        }

        if self.with_rng(|rng| rng.random_bool(THUNDERSTORM_PROBABILITY)) {
            alerts.push(WeatherAlert {
                id: "mock-thunderstorm-warning".to_string(),
                title: "Severe Thunderstorm Warning".to_string(),
                description: "Severe thunderstorms with heavy rain, strong winds, and possible hail are expected in the area.".to_string(),
                severity: AlertSeverity::Moderate,
                kind: AlertType::Thunderstorm,
                start_time: start,
                end_time: start + Duration::hours(4),
                source: "National Weather Service".to_string(),
                areas: ["Miami-Dade County".to_string()].into(),
            });
        }

        if alerts.is_empty() {
            alerts.push(WeatherAlert {
                id: "mock-special-weather-statement".to_string(),
                title: "Special Weather Statement".to_string(),
                description: "No hazardous weather is expected. Monitor local forecasts for changing conditions.".to_string(),
                severity: AlertSeverity::Minor,
                kind: AlertType::Other,
                start_time: start,
                end_time: start + Duration::hours(12),
                source: "National Weather Service".to_string(),
                areas: ["Miami-Dade County".to_string()].into(),
            });
        }

        alerts
    }

    /// Plausible active storms for the time of year
    pub fn storms<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<HurricaneRecord> {
        let updated = now.with_timezone(&Utc);

        self.with_rng(|rng| {
            let mut storms = Vec::new();
            if is_hurricane_season(now) {
                storms.push(synthetic_storm(
                    rng,
                    "mock-atlantic-hurricane",
                    "Hurricane Marisol",
                    "AL",
                    (20.0, 30.0),
                    (-80.0, -60.0),
                    (70.0, 120.0),
                    updated,
                ));
                if rng.random_bool(SECOND_STORM_PROBABILITY) {
                    storms.push(synthetic_storm(
                        rng,
                        "mock-atlantic-tropical-storm",
                        "Tropical Storm Nolan",
                        "AL",
                        (12.0, 20.0),
                        (-60.0, -40.0),
                        (35.0, 60.0),
                        updated,
                    ));
                }
            } else {
                storms.push(synthetic_storm(
                    rng,
                    "mock-south-indian-cyclone",
                    "Cyclone Ikaika",
                    "SI",
                    (-20.0, -10.0),
                    (55.0, 90.0),
                    (65.0, 100.0),
                    updated,
                ));
            }
            storms
        })
    }

    /// The fixed two-entry shelter list, with distances from `origin`
    pub fn shelters(&self, origin: &Point) -> Vec<PlaceResult> {
        [
            (
                "mock-shelter-1",
                "Central Emergency Shelter",
                "100 NW 1st St, Miami, FL",
                25.784,
                -80.195,
                true,
            ),
            (
                "mock-shelter-2",
                "Downtown Shelter",
                "250 NE 2nd Ave, Miami, FL",
                25.776,
                -80.191,
                false,
            ),
        ]
        .into_iter()
        .map(|(id, name, address, lat, lng, open_now)| PlaceResult {
            id: id.to_string(),
            name: name.to_string(),
            kind: "shelter".to_string(),
            address: address.to_string(),
            lat,
            lng,
            open_now: Some(open_now),
            distance_km: Some(round2(origin.distance_km(&Point::new(lat, lng)))),
            source: MOCK_SOURCE.to_string(),
        })
        .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn synthetic_storm(
    rng: &mut StdRng,
    id: &str,
    name: &str,
    basin: &str,
    lat_range: (f64, f64),
    lng_range: (f64, f64),
    wind_kt_range: (f64, f64),
    updated: DateTime<Utc>,
) -> HurricaneRecord {
    let wind_kt = rng.random_range(wind_kt_range.0..wind_kt_range.1).round();
    let category = saffir_simpson_category(wind_kt);
    let status = if category.is_some() {
        StormStatus::Hurricane
    } else {
        StormStatus::TropicalStorm
    };
    HurricaneRecord {
        id: id.to_string(),
        name: name.to_string(),
        status,
        category,
        position: Point::new(
            round2(rng.random_range(lat_range.0..lat_range.1)),
            round2(rng.random_range(lng_range.0..lng_range.1)),
        ),
        max_wind_mph: Some(knots_to_mph(wind_kt)),
        pressure_mb: Some(rng.random_range(940.0_f64..1005.0).round()),
        movement: Some(StormMovement {
            direction_deg: rng.random_range(0.0_f64..360.0).round(),
            speed_mph: rng.random_range(5.0_f64..20.0).round(),
        }),
        basin: Some(basin.to_string()),
        source: MOCK_SOURCE.to_string(),
        last_updated: updated,
    }
}

/// Heuristic UV index peaking around midday
#[must_use]
pub fn uv_index_for_hour(hour: u32) -> u8 {
    let uv = ((f64::from(hour) - 6.0) / 2.0).round().max(0.0);
    uv as u8
}
