//! Point-scoped weather aggregation: conditions, forecast and alerts

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, instrument};

use super::{settle, with_deadline};
use crate::cache::{CacheEntry, FreshnessPolicy, RegionCache};
use crate::config::StormwatchConfig;
use crate::fallback::FallbackGenerator;
use crate::models::{
    DataSource, ForecastDay, LocationInfo, Point, RegionKey, WeatherAlert, WeatherSnapshot,
};
use crate::providers::{AlertsProvider, ConditionsProvider, ConditionsReport};

/// Everything the weather routes serve for one region
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    pub forecast: Vec<ForecastDay>,
    pub alerts: Vec<WeatherAlert>,
    /// Tag of the alerts provider; the entry tag covers conditions and forecast
    pub alerts_source: DataSource,
}

/// The named area around the default coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct HomeRegion {
    pub name: String,
    pub center: Point,
    pub radius_km: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub freshness: FreshnessPolicy,
    pub upstream_deadline: Duration,
    pub region_precision: u32,
    pub max_regions: usize,
    /// Calendar used for synthetic data
    pub timezone: Tz,
    pub home: HomeRegion,
}

impl WeatherSettings {
    #[must_use]
    pub fn from_config(config: &StormwatchConfig) -> Self {
        Self {
            freshness: FreshnessPolicy::new(
                Duration::from_secs(config.cache.weather_ttl_seconds),
                Duration::from_secs(config.cache.fallback_ttl_seconds),
            ),
            upstream_deadline: config.http.upstream_deadline(),
            region_precision: config.cache.region_precision,
            max_regions: config.cache.max_regions,
            timezone: config.defaults.tz(),
            home: HomeRegion {
                name: config.defaults.location_name.clone(),
                center: Point::new(config.defaults.latitude, config.defaults.longitude),
                radius_km: config.defaults.region_radius_km,
            },
        }
    }
}

/// Cache-fronted weather aggregation; cheap to clone
#[derive(Clone)]
pub struct WeatherService {
    inner: Arc<WeatherInner>,
}

struct WeatherInner {
    conditions: Arc<dyn ConditionsProvider>,
    alerts: Arc<dyn AlertsProvider>,
    fallback: Arc<FallbackGenerator>,
    cache: RegionCache<RegionKey, WeatherReport>,
    settings: WeatherSettings,
}

impl WeatherService {
    pub fn new(
        conditions: Arc<dyn ConditionsProvider>,
        alerts: Arc<dyn AlertsProvider>,
        fallback: Arc<FallbackGenerator>,
        settings: WeatherSettings,
    ) -> Self {
        Self {
            inner: Arc::new(WeatherInner {
                conditions,
                alerts,
                fallback,
                cache: RegionCache::new(settings.freshness, settings.max_regions),
                settings,
            }),
        }
    }

    /// Weather for `point`, served from cache while fresh.
    ///
    /// Never fails: provider failures are replaced with fallback data. The
    /// refresh runs in its own task, so a caller that stops waiting does not
    /// prevent the cache from being populated.
    #[instrument(skip(self), fields(lat = point.lat, lng = point.lng))]
    pub async fn get(&self, point: &Point, force_refresh: bool) -> Arc<CacheEntry<WeatherReport>> {
        let key = point.region_key(self.inner.settings.region_precision);

        if !force_refresh {
            if let Some(entry) = self.inner.cache.fresh(&key).await {
                debug!("Weather cache hit ({})", entry.source.as_str());
                return entry;
            }
        }

        let inner = Arc::clone(&self.inner);
        let target = point.clone();
        match tokio::spawn(async move { inner.refresh(key, target).await }).await {
            Ok(entry) => entry,
            Err(err) => {
                error!("Weather refresh task failed: {err}");
                Arc::new(CacheEntry::new(
                    self.inner.fallback_report(DataSource::Error),
                    DataSource::Error,
                ))
            }
        }
    }

    /// Location block for a response about `point`
    #[must_use]
    pub fn describe_location(&self, point: &Point) -> LocationInfo {
        let home = &self.inner.settings.home;
        let name = match &point.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ if point.distance_km(&home.center) <= home.radius_km => home.name.clone(),
            _ => point.format_coordinates(),
        };
        LocationInfo {
            name,
            lat: point.lat,
            lng: point.lng,
        }
    }

    /// Number of cached regions
    pub async fn cached_regions(&self) -> usize {
        self.inner.cache.len().await
    }
}

impl WeatherInner {
    fn local_now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.settings.timezone)
    }

    async fn refresh(&self, key: RegionKey, point: Point) -> Arc<CacheEntry<WeatherReport>> {
        let deadline = self.settings.upstream_deadline;
        let (conditions, alerts) = futures::join!(
            with_deadline(self.conditions.name(), deadline, self.conditions.fetch(&point)),
            with_deadline(self.alerts.name(), deadline, self.alerts.fetch(&point)),
        );

        let now = self.local_now();
        let (report, source) = settle(self.conditions.name(), conditions, || ConditionsReport {
            current: self.fallback.current_conditions(&now),
            forecast: self.fallback.forecast(&now),
        });
        let (alerts, alerts_source) =
            settle(self.alerts.name(), alerts, || self.fallback.alerts(&now));

        debug!(
            "Weather refreshed: conditions {}, alerts {}",
            source.as_str(),
            alerts_source.as_str()
        );

        // Failed alerts must not ride on the live conditions TTL
        let freshness = match alerts_source {
            DataSource::Error => DataSource::Error,
            _ => source,
        };
        let entry = CacheEntry::new(
            WeatherReport {
                current: report.current,
                forecast: report.forecast,
                alerts,
                alerts_source,
            },
            source,
        )
        .expiring_as(freshness);
        self.cache.store(key, entry).await
    }

    fn fallback_report(&self, alerts_source: DataSource) -> WeatherReport {
        let now = self.local_now();
        WeatherReport {
            current: self.fallback.current_conditions(&now),
            forecast: self.fallback.forecast(&now),
            alerts: self.fallback.alerts(&now),
            alerts_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    #[async_trait::async_trait]
    impl ConditionsProvider for Unused {
        fn name(&self) -> &'static str {
            "unused"
        }

        async fn fetch(&self, _point: &Point) -> crate::providers::FetchOutcome<ConditionsReport> {
            crate::providers::FetchOutcome::Empty
        }
    }

    #[async_trait::async_trait]
    impl AlertsProvider for Unused {
        fn name(&self) -> &'static str {
            "unused"
        }

        async fn fetch(&self, _point: &Point) -> crate::providers::FetchOutcome<Vec<WeatherAlert>> {
            crate::providers::FetchOutcome::Empty
        }
    }

    fn service() -> WeatherService {
        WeatherService::new(
            Arc::new(Unused),
            Arc::new(Unused),
            Arc::new(FallbackGenerator::seeded(1)),
            WeatherSettings::from_config(&StormwatchConfig::default()),
        )
    }

    #[test]
    fn test_describe_location_names() {
        let service = service();

        let named = Point::with_name(40.71, -74.0, "New York");
        assert_eq!(service.describe_location(&named).name, "New York");

        let near_home = Point::new(25.80, -80.20);
        assert_eq!(service.describe_location(&near_home).name, "Miami");

        let far = Point::new(40.7128, -74.006);
        let info = service.describe_location(&far);
        assert_eq!(info.name, "40.7128, -74.0060");
        assert_eq!(info.lat, 40.7128);
    }

    #[tokio::test]
    async fn test_empty_providers_yield_mock_report() {
        let service = service();
        let entry = service.get(&Point::new(25.774, -80.193), false).await;
        assert_eq!(entry.source, DataSource::Mock);
        assert_eq!(entry.payload.alerts_source, DataSource::Mock);
        assert_eq!(entry.payload.forecast.len(), 5);
        assert!(!entry.payload.alerts.is_empty());
        assert_eq!(service.cached_regions().await, 1);
    }
}
