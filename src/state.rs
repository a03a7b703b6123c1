//! Shared application state handed to every handler

use std::sync::Arc;

use anyhow::Result;

use crate::config::{DefaultsConfig, StormwatchConfig};
use crate::fallback::FallbackGenerator;
use crate::providers::{
    GdacsClient, GooglePlacesClient, GoogleWeatherClient, NhcClient, NwsAlertsClient, PlaceSearch,
    StormProvider, build_client,
};
use crate::services::{HurricaneService, HurricaneSettings, WeatherService, WeatherSettings};

#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
    pub hurricanes: HurricaneService,
    pub places: Arc<dyn PlaceSearch>,
    pub fallback: Arc<FallbackGenerator>,
    /// Request defaults: coordinates, shelter radius and query
    pub defaults: Arc<DefaultsConfig>,
}

impl AppState {
    pub fn new(
        weather: WeatherService,
        hurricanes: HurricaneService,
        places: Arc<dyn PlaceSearch>,
        fallback: Arc<FallbackGenerator>,
        defaults: DefaultsConfig,
    ) -> Self {
        Self {
            weather,
            hurricanes,
            places,
            fallback,
            defaults: Arc::new(defaults),
        }
    }

    /// Wire the live provider adapters described by `config`
    pub fn from_config(config: &StormwatchConfig) -> Result<Self> {
        let client = build_client(&config.http)?;
        let providers = &config.providers;

        let fallback = Arc::new(match config.fallback.seed {
            Some(seed) => FallbackGenerator::seeded(seed),
            None => FallbackGenerator::new(),
        });

        let weather = WeatherService::new(
            Arc::new(GoogleWeatherClient::new(
                client.clone(),
                providers.weather_api_key.clone(),
                &providers.weather_base_url,
            )),
            Arc::new(NwsAlertsClient::new(client.clone(), &providers.alerts_base_url)),
            Arc::clone(&fallback),
            WeatherSettings::from_config(config),
        );

        let storm_feeds: Vec<Arc<dyn StormProvider>> = vec![
            Arc::new(NhcClient::new(client.clone(), &providers.nhc_storms_url)),
            Arc::new(GdacsClient::new(client.clone(), &providers.gdacs_events_url)),
        ];
        let hurricanes = HurricaneService::new(
            storm_feeds,
            Arc::clone(&fallback),
            HurricaneSettings::from_config(config),
        );

        let places = Arc::new(GooglePlacesClient::new(
            client,
            providers.maps_api_key.clone(),
            &providers.places_base_url,
        ));

        Ok(Self::new(
            weather,
            hurricanes,
            places,
            fallback,
            config.defaults.clone(),
        ))
    }
}
