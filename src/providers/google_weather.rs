//! Google Weather API: current conditions and daily forecast

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ConditionsProvider, ConditionsReport, FetchOutcome, ProviderError, get_json};
use crate::fallback::uv_index_for_hour;
use crate::models::forecast::is_consecutive_forecast;
use crate::models::{FORECAST_DAYS, ForecastDay, Point, WeatherSnapshot};
use crate::normalize::{millibars_to_inhg, normalize_condition, round2};

const PROVIDER: &str = "google-weather";
const API_KEY_HEADER: &str = "X-Goog-Api-Key";

pub struct GoogleWeatherClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentConditionsResponse {
    current_time: Option<String>,
    time_zone: Option<TimeZoneId>,
    weather_condition: Option<WeatherCondition>,
    temperature: Option<Temperature>,
    relative_humidity: Option<f64>,
    uv_index: Option<f64>,
    wind: Option<Wind>,
    visibility: Option<Visibility>,
    air_pressure: Option<AirPressure>,
}

#[derive(Debug, Deserialize)]
struct TimeZoneId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: Option<LocalizedText>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Temperature {
    degrees: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    direction: Option<WindDirection>,
    speed: Option<WindSpeed>,
}

#[derive(Debug, Deserialize)]
struct WindDirection {
    degrees: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindSpeed {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Visibility {
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AirPressure {
    mean_sea_level_millibars: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyForecastResponse {
    #[serde(default)]
    forecast_days: Vec<DailyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyEntry {
    display_date: Option<DisplayDate>,
    daytime_forecast: Option<ForecastPeriod>,
    nighttime_forecast: Option<ForecastPeriod>,
    max_temperature: Option<Temperature>,
    min_temperature: Option<Temperature>,
}

#[derive(Debug, Deserialize)]
struct DisplayDate {
    year: i32,
    month: u32,
    day: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    weather_condition: Option<WeatherCondition>,
    relative_humidity: Option<f64>,
    precipitation: Option<Precipitation>,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct Precipitation {
    qpf: Option<Quantity>,
}

#[derive(Debug, Deserialize)]
struct Quantity {
    quantity: Option<f64>,
}

impl WeatherCondition {
    fn label(&self) -> String {
        let text = self
            .description
            .as_ref()
            .and_then(|d| d.text.as_deref())
            .or(self.kind.as_deref());
        normalize_condition(text)
    }
}

impl Wind {
    fn speed(&self) -> Option<f64> {
        self.speed.as_ref().and_then(|s| s.value)
    }
}

impl ForecastPeriod {
    fn precipitation(&self) -> f64 {
        self.precipitation
            .as_ref()
            .and_then(|p| p.qpf.as_ref())
            .and_then(|q| q.quantity)
            .unwrap_or(0.0)
    }

    fn wind_speed(&self) -> f64 {
        self.wind.as_ref().and_then(Wind::speed).unwrap_or(0.0)
    }
}

impl GoogleWeatherClient {
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

    fn endpoint(&self, method: &str, point: &Point, extra: &str) -> String {
        format!(
            "{}/{method}?location.latitude={}&location.longitude={}&unitsSystem=IMPERIAL{extra}",
            self.base_url, point.lat, point.lng
        )
    }

    /// Current conditions plus a five-day forecast for `point`
    #[instrument(skip(self), fields(lat = point.lat, lng = point.lng))]
    pub async fn conditions(&self, point: &Point) -> Result<ConditionsReport, ProviderError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ProviderError::configuration_missing(PROVIDER));
        };

        let current_url = self.endpoint("currentConditions:lookup", point, "");
        let forecast_url =
            self.endpoint("forecast/days:lookup", point, &format!("&days={FORECAST_DAYS}"));

        // Key goes in a header, never in the URL
        let (current, forecast) = futures::try_join!(
            get_json::<CurrentConditionsResponse>(
                PROVIDER,
                self.client.get(&current_url).header(API_KEY_HEADER, key)
            ),
            get_json::<DailyForecastResponse>(
                PROVIDER,
                self.client.get(&forecast_url).header(API_KEY_HEADER, key)
            ),
        )?;

        let report = build_report(current, forecast, Utc::now())?;
        debug!("Google Weather reported '{}'", report.current.condition);
        Ok(report)
    }
}

#[async_trait]
impl ConditionsProvider for GoogleWeatherClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, point: &Point) -> FetchOutcome<ConditionsReport> {
        FetchOutcome::from_result(self.conditions(point).await)
    }
}

fn build_report(
    current: CurrentConditionsResponse,
    forecast: DailyForecastResponse,
    now: DateTime<Utc>,
) -> Result<ConditionsReport, ProviderError> {
    Ok(ConditionsReport {
        current: build_snapshot(current, now)?,
        forecast: build_forecast(forecast)?,
    })
}

fn build_snapshot(
    response: CurrentConditionsResponse,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, ProviderError> {
    let temperature = response
        .temperature
        .and_then(|t| t.degrees)
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "current temperature missing"))?;

    let timestamp = response
        .current_time
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map_or(now, |t| t.with_timezone(&Utc));

    // Local hour at the point drives the UV heuristic when the provider omits UV
    let local_hour = response
        .time_zone
        .and_then(|tz| tz.id.parse::<chrono_tz::Tz>().ok())
        .map_or(timestamp.hour(), |tz| timestamp.with_timezone(&tz).hour());

    let uv_index = response
        .uv_index
        .filter(|uv| uv.is_finite())
        .map_or_else(|| uv_index_for_hour(local_hour), |uv| uv.round().clamp(0.0, 20.0) as u8);

    let wind_direction = response
        .wind
        .as_ref()
        .and_then(|w| w.direction.as_ref())
        .and_then(|d| d.degrees)
        .filter(|deg| deg.is_finite())
        .map_or(0, |deg| deg.round().rem_euclid(360.0) as u16);

    Ok(WeatherSnapshot {
        temperature: round2(temperature),
        condition: response
            .weather_condition
            .as_ref()
            .map_or_else(|| normalize_condition(None), WeatherCondition::label),
        humidity: response.relative_humidity.unwrap_or(0.0),
        wind_speed: round2(response.wind.as_ref().and_then(Wind::speed).unwrap_or(0.0)),
        wind_direction,
        pressure: response
            .air_pressure
            .and_then(|p| p.mean_sea_level_millibars)
            .map_or(0.0, millibars_to_inhg),
        visibility: response.visibility.and_then(|v| v.distance).unwrap_or(0.0),
        uv_index,
        timestamp,
    })
}

fn build_forecast(response: DailyForecastResponse) -> Result<Vec<ForecastDay>, ProviderError> {
    if response.forecast_days.len() < FORECAST_DAYS {
        return Err(ProviderError::malformed(
            PROVIDER,
            format!(
                "expected {FORECAST_DAYS} forecast days, got {}",
                response.forecast_days.len()
            ),
        ));
    }

    let days = response
        .forecast_days
        .into_iter()
        .take(FORECAST_DAYS)
        .map(forecast_day)
        .collect::<Result<Vec<_>, _>>()?;

    if !is_consecutive_forecast(&days) {
        return Err(ProviderError::malformed(
            PROVIDER,
            "forecast dates are not consecutive",
        ));
    }
    Ok(days)
}

fn forecast_day(entry: DailyEntry) -> Result<ForecastDay, ProviderError> {
    let date = entry
        .display_date
        .and_then(|d| NaiveDate::from_ymd_opt(d.year, d.month, d.day))
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "forecast day without a valid date"))?;

    let high = entry.max_temperature.and_then(|t| t.degrees);
    let low = entry.min_temperature.and_then(|t| t.degrees);
    let (Some(high), Some(low)) = (high, low) else {
        return Err(ProviderError::malformed(
            PROVIDER,
            format!("forecast for {date} is missing a temperature"),
        ));
    };

    let day = entry.daytime_forecast.as_ref();
    let night = entry.nighttime_forecast.as_ref();

    let precipitation = round2(
        day.map_or(0.0, ForecastPeriod::precipitation) + night.map_or(0.0, ForecastPeriod::precipitation),
    );
    let wind_speed = round2(
        day.map_or(0.0, ForecastPeriod::wind_speed)
            .max(night.map_or(0.0, ForecastPeriod::wind_speed)),
    );
    let condition = day
        .or(night)
        .and_then(|p| p.weather_condition.as_ref())
        .map_or_else(|| normalize_condition(None), WeatherCondition::label);
    let humidity = day
        .and_then(|p| p.relative_humidity)
        .or_else(|| night.and_then(|p| p.relative_humidity))
        .unwrap_or(0.0);

    Ok(ForecastDay::new(
        date,
        round2(high),
        round2(low),
        condition,
        precipitation,
        wind_speed,
        humidity,
    ))
}
