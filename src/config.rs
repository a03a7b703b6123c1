//! Configuration management for Stormwatch
//!
//! Layers built-in defaults, an optional TOML file, `STORMWATCH__SECTION__KEY`
//! environment overrides and the plain provider credential variables, then
//! validates the result.

use crate::StormwatchError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "stormwatch.toml";

/// Environment variables that may carry the weather provider key, in priority order
pub const WEATHER_KEY_VARS: [&str; 2] = ["GOOGLE_WEATHER_API_KEY", "WEATHER_API_KEY"];
/// Environment variables that may carry the maps/places key, in priority order
pub const MAPS_KEY_VARS: [&str; 2] = ["GOOGLE_MAPS_API_KEY", "GCP_SERVER_MAPS_KEY"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StormwatchConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream endpoints and credentials
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Shared HTTP client behaviour
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Request defaults and the home region
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Google Weather API key; mock conditions are served without it
    #[serde(default)]
    pub weather_api_key: Option<String>,
    /// Google Maps/Places key; the mock shelter list is served without it
    #[serde(default)]
    pub maps_api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    /// National Weather Service API root
    #[serde(default = "default_alerts_base_url")]
    pub alerts_base_url: String,
    #[serde(default = "default_nhc_storms_url")]
    pub nhc_storms_url: String,
    #[serde(default = "default_gdacs_events_url")]
    pub gdacs_events_url: String,
    #[serde(default = "default_places_base_url")]
    pub places_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
    /// Retries for transient upstream failures
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
    /// Overall deadline for one adapter call, retries included
    #[serde(default = "default_upstream_deadline")]
    pub upstream_deadline_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_seconds: u64,
    #[serde(default = "default_hurricane_ttl")]
    pub hurricane_ttl_seconds: u64,
    /// Lifetime of mock and error entries
    #[serde(default = "default_fallback_ttl")]
    pub fallback_ttl_seconds: u64,
    /// Decimal places kept when quantizing coordinates into cache regions
    #[serde(default = "default_region_precision")]
    pub region_precision: u32,
    /// Most weather regions cached at once; the oldest is evicted beyond this
    #[serde(default = "default_max_regions")]
    pub max_regions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Name reported for points inside the home region
    #[serde(default = "default_location_name")]
    pub location_name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_region_radius")]
    pub region_radius_km: f64,
    /// IANA zone used for the calendar of synthetic data
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_shelter_radius")]
    pub shelter_radius_m: u32,
    #[serde(default = "default_shelter_query")]
    pub shelter_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Fixed seed for reproducible synthetic data
    #[serde(default)]
    pub seed: Option<u64>,
    /// Serve synthetic storms when every feed reports a quiet basin
    #[serde(default = "default_true")]
    pub synthesize_storms_when_quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP/HTTP collector root, e.g. `http://localhost:4318`
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_weather_base_url() -> String {
    "https://weather.googleapis.com/v1".to_string()
}

fn default_alerts_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_nhc_storms_url() -> String {
    "https://www.nhc.noaa.gov/CurrentStorms.json".to_string()
}

fn default_gdacs_events_url() -> String {
    "https://www.gdacs.org/gdacsapi/api/events/geteventlist/SEARCH?eventlist=TC".to_string()
}

fn default_places_base_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_http_timeout() -> u64 {
    4
}

fn default_http_max_retries() -> u32 {
    1
}

fn default_upstream_deadline() -> u64 {
    8
}

fn default_user_agent() -> String {
    format!("Stormwatch/{} (Emergency Resource Finder)", env!("CARGO_PKG_VERSION"))
}

fn default_weather_ttl() -> u64 {
    600
}

fn default_hurricane_ttl() -> u64 {
    900
}

fn default_fallback_ttl() -> u64 {
    60
}

fn default_region_precision() -> u32 {
    2
}

fn default_max_regions() -> usize {
    1024
}

fn default_location_name() -> String {
    "Miami".to_string()
}

fn default_latitude() -> f64 {
    25.774
}

fn default_longitude() -> f64 {
    -80.193
}

fn default_region_radius() -> f64 {
    50.0
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_shelter_radius() -> u32 {
    5000
}

fn default_shelter_query() -> String {
    "emergency shelter homeless shelter near Miami, FL".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_service_name() -> String {
    "stormwatch".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            maps_api_key: None,
            weather_base_url: default_weather_base_url(),
            alerts_base_url: default_alerts_base_url(),
            nhc_storms_url: default_nhc_storms_url(),
            gdacs_events_url: default_gdacs_events_url(),
            places_base_url: default_places_base_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
            upstream_deadline_seconds: default_upstream_deadline(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            weather_ttl_seconds: default_weather_ttl(),
            hurricane_ttl_seconds: default_hurricane_ttl(),
            fallback_ttl_seconds: default_fallback_ttl(),
            region_precision: default_region_precision(),
            max_regions: default_max_regions(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location_name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            region_radius_km: default_region_radius(),
            timezone: default_timezone(),
            shelter_radius_m: default_shelter_radius(),
            shelter_query: default_shelter_query(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            seed: None,
            synthesize_storms_when_quiet: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn upstream_deadline(&self) -> Duration {
        Duration::from_secs(self.upstream_deadline_seconds)
    }
}

impl DefaultsConfig {
    /// Home timezone; UTC if the configured name does not parse
    #[must_use]
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

impl StormwatchConfig {
    /// Load configuration from the process environment and an optional file
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with(config_path, std::env::vars().collect())
    }

    /// Load configuration against an explicit set of environment variables
    pub fn load_with(config_path: Option<PathBuf>, vars: HashMap<String, String>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if explicit && !config_file.exists() {
            return Err(StormwatchError::config(format!(
                "Configuration file not found: {}",
                config_file.display()
            ))
            .into());
        }
        builder = builder.add_source(
            File::from(config_file)
                .required(false)
                .format(FileFormat::Toml),
        );

        // STORMWATCH__HTTP__TIMEOUT_SECONDS -> http.timeout_seconds
        builder = builder.add_source(
            Environment::with_prefix("STORMWATCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: StormwatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_credentials(&vars);
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Fill missing provider keys from the plain credential variables
    pub fn apply_credentials(&mut self, vars: &HashMap<String, String>) {
        let lookup = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| vars.get(*name))
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
                .map(str::to_string)
        };
        if blank(self.providers.weather_api_key.as_deref()) {
            self.providers.weather_api_key = lookup(&WEATHER_KEY_VARS);
        }
        if blank(self.providers.maps_api_key.as_deref()) {
            self.providers.maps_api_key = lookup(&MAPS_KEY_VARS);
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if blank(self.providers.weather_api_key.as_deref()) {
            self.providers.weather_api_key = None;
        }
        if blank(self.providers.maps_api_key.as_deref()) {
            self.providers.maps_api_key = None;
        }
        if blank(self.telemetry.otlp_endpoint.as_deref()) {
            self.telemetry.otlp_endpoint = None;
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.http.upstream_deadline_seconds == 0 {
            self.http.upstream_deadline_seconds = default_upstream_deadline();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.cache.weather_ttl_seconds == 0 {
            self.cache.weather_ttl_seconds = default_weather_ttl();
        }
        if self.cache.hurricane_ttl_seconds == 0 {
            self.cache.hurricane_ttl_seconds = default_hurricane_ttl();
        }
        if self.cache.max_regions == 0 {
            self.cache.max_regions = default_max_regions();
        }
        if self.defaults.location_name.is_empty() {
            self.defaults.location_name = default_location_name();
        }
        if self.defaults.timezone.is_empty() {
            self.defaults.timezone = default_timezone();
        }
        if self.defaults.shelter_radius_m == 0 {
            self.defaults.shelter_radius_m = default_shelter_radius();
        }
        if self.defaults.shelter_query.is_empty() {
            self.defaults.shelter_query = default_shelter_query();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.telemetry.service_name.is_empty() {
            self.telemetry.service_name = default_service_name();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(1..=60).contains(&self.http.timeout_seconds) {
            return Err(StormwatchError::config(
                "HTTP timeout must be between 1 and 60 seconds"
            ).into());
        }

        if self.http.max_retries > 5 {
            return Err(StormwatchError::config(
                "HTTP max retries cannot exceed 5"
            ).into());
        }

        if self.http.upstream_deadline_seconds < self.http.timeout_seconds {
            return Err(StormwatchError::config(
                "Upstream deadline cannot be shorter than the HTTP timeout"
            ).into());
        }

        let ttls = [
            self.cache.weather_ttl_seconds,
            self.cache.hurricane_ttl_seconds,
            self.cache.fallback_ttl_seconds,
        ];
        if ttls.iter().any(|ttl| *ttl > 86_400) {
            return Err(StormwatchError::config(
                "Cache TTL cannot exceed 86400 seconds (1 day)"
            ).into());
        }

        if self.cache.region_precision > 4 {
            return Err(StormwatchError::config(
                "Cache region precision cannot exceed 4 decimal places"
            ).into());
        }

        let home = crate::models::Point::new(self.defaults.latitude, self.defaults.longitude);
        if !home.is_valid() {
            return Err(StormwatchError::config(
                "Default coordinates are out of range"
            ).into());
        }

        if !(self.defaults.region_radius_km.is_finite() && self.defaults.region_radius_km >= 0.0) {
            return Err(StormwatchError::config(
                "Home region radius must be a non-negative number of kilometers"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(StormwatchError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(StormwatchError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        if self.defaults.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(StormwatchError::config(
                format!("Unknown timezone '{}'", self.defaults.timezone)
            ).into());
        }

        let urls = [
            ("weather_base_url", self.providers.weather_base_url.as_str()),
            ("alerts_base_url", self.providers.alerts_base_url.as_str()),
            ("nhc_storms_url", self.providers.nhc_storms_url.as_str()),
            ("gdacs_events_url", self.providers.gdacs_events_url.as_str()),
            ("places_base_url", self.providers.places_base_url.as_str()),
        ];
        for (name, url) in urls.into_iter().chain(
            self.telemetry
                .otlp_endpoint
                .as_deref()
                .map(|endpoint| ("otlp_endpoint", endpoint)),
        ) {
            if !is_http_url(url) {
                return Err(StormwatchError::config(
                    format!("{name} must be a valid HTTP or HTTPS URL")
                ).into());
            }
        }

        Ok(())
    }
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
