//! Global active-storm aggregation across every storm feed

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use futures::future::join_all;
use tracing::{debug, info, instrument};

use super::{log_failure, with_deadline};
use crate::cache::{CacheEntry, CacheSlot, FreshnessPolicy};
use crate::config::StormwatchConfig;
use crate::error::StormwatchError;
use crate::fallback::FallbackGenerator;
use crate::models::{DataSource, HurricaneRecord};
use crate::normalize::is_placeholder_storm_name;
use crate::providers::{FetchOutcome, StormProvider};

/// Farthest apart two reports of one storm can be, across feeds
const DUPLICATE_RADIUS_KM: f64 = 500.0;

#[derive(Debug, Clone)]
pub struct HurricaneSettings {
    pub freshness: FreshnessPolicy,
    pub upstream_deadline: Duration,
    /// Serve synthetic storms, tagged mock, when every feed reports none
    pub synthesize_when_quiet: bool,
    pub timezone: Tz,
}

impl HurricaneSettings {
    #[must_use]
    pub fn from_config(config: &StormwatchConfig) -> Self {
        Self {
            freshness: FreshnessPolicy::new(
                Duration::from_secs(config.cache.hurricane_ttl_seconds),
                Duration::from_secs(config.cache.fallback_ttl_seconds),
            ),
            upstream_deadline: config.http.upstream_deadline(),
            synthesize_when_quiet: config.fallback.synthesize_storms_when_quiet,
            timezone: config.defaults.tz(),
        }
    }
}

/// Cache-fronted hurricane aggregation; cheap to clone
#[derive(Clone)]
pub struct HurricaneService {
    inner: Arc<HurricaneInner>,
}

struct HurricaneInner {
    /// Merged in this order; earlier feeds win name collisions
    providers: Vec<Arc<dyn StormProvider>>,
    fallback: Arc<FallbackGenerator>,
    cache: CacheSlot<Vec<HurricaneRecord>>,
    settings: HurricaneSettings,
}

impl HurricaneService {
    pub fn new(
        providers: Vec<Arc<dyn StormProvider>>,
        fallback: Arc<FallbackGenerator>,
        settings: HurricaneSettings,
    ) -> Self {
        Self {
            inner: Arc::new(HurricaneInner {
                providers,
                fallback,
                cache: CacheSlot::new(settings.freshness),
                settings,
            }),
        }
    }

    /// Active storms, served from cache while fresh.
    ///
    /// Provider failures fall back to synthetic storms; only a failure of the
    /// aggregation itself is returned as an error.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<CacheEntry<Vec<HurricaneRecord>>>, StormwatchError> {
        if !force_refresh {
            if let Some(entry) = self.inner.cache.fresh().await {
                debug!("Hurricane cache hit ({})", entry.source.as_str());
                return Ok(entry);
            }
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.refresh().await })
            .await
            .map_err(|err| StormwatchError::aggregation(format!("hurricane refresh failed: {err}")))
    }
}

/// Same name and close together; unnamed systems never match
fn is_same_storm(a: &HurricaneRecord, b: &HurricaneRecord) -> bool {
    !is_placeholder_storm_name(&a.name)
        && a.name.trim().eq_ignore_ascii_case(b.name.trim())
        && a.position.distance_km(&b.position) <= DUPLICATE_RADIUS_KM
}

impl HurricaneInner {
    async fn refresh(&self) -> Arc<CacheEntry<Vec<HurricaneRecord>>> {
        let deadline = self.settings.upstream_deadline;
        let outcomes = join_all(
            self.providers
                .iter()
                .map(|provider| with_deadline(provider.name(), deadline, provider.fetch())),
        )
        .await;

        let mut storms: Vec<HurricaneRecord> = Vec::new();
        let mut failures = 0;

        for (provider, outcome) in self.providers.iter().zip(outcomes) {
            match outcome {
                FetchOutcome::Fetched(records) => {
                    debug!(provider = provider.name(), "Received {} storms", records.len());
                    for record in records {
                        if storms.iter().any(|kept| is_same_storm(kept, &record)) {
                            debug!(provider = provider.name(), "Dropping duplicate of {}", record.name);
                        } else {
                            storms.push(record);
                        }
                    }
                }
                FetchOutcome::Empty => {
                    info!(provider = provider.name(), "No active storms reported");
                }
                FetchOutcome::Failed(err) => {
                    log_failure(&err);
                    failures += 1;
                }
            }
        }

        let now = Utc::now().with_timezone(&self.settings.timezone);
        let all_failed = !self.providers.is_empty() && failures == self.providers.len();

        let (payload, source) = if !storms.is_empty() {
            (storms, DataSource::Live)
        } else if all_failed {
            (self.fallback.storms(&now), DataSource::Error)
        } else if self.settings.synthesize_when_quiet {
            info!("All storm feeds quiet, serving synthetic storms");
            (self.fallback.storms(&now), DataSource::Mock)
        } else {
            (storms, DataSource::Live)
        };

        self.cache.store(CacheEntry::new(payload, source)).await
    }
}
