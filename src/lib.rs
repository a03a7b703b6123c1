//! Stormwatch - weather, severe-alert and hurricane aggregation
//!
//! This library fetches conditions, forecasts, alerts and active storms from
//! several upstream providers, normalizes them into one model, caches them and
//! falls back to synthetic data whenever a provider cannot answer.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheEntry, FreshnessPolicy};
pub use config::StormwatchConfig;
pub use error::StormwatchError;
pub use fallback::FallbackGenerator;
pub use models::{DataSource, HurricaneRecord, Point, WeatherAlert};
pub use services::{HurricaneService, WeatherReport, WeatherService};
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, StormwatchError>;
