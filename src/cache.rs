//! In-process cache entries with source-aware freshness
//!
//! Entries are immutable and shared behind `Arc`; writers swap whole entries
//! under a `tokio::sync::RwLock`, so readers observe either the previous entry
//! or the new one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::DataSource;

/// How long entries stay fresh, by source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// Lifetime of entries fetched from a provider
    pub live_ttl: Duration,
    /// Lifetime of mock and error entries
    pub fallback_ttl: Duration,
}

impl FreshnessPolicy {
    #[must_use]
    pub fn new(live_ttl: Duration, fallback_ttl: Duration) -> Self {
        Self {
            live_ttl,
            fallback_ttl,
        }
    }

    #[must_use]
    pub fn ttl_for(&self, source: DataSource) -> Duration {
        match source {
            DataSource::Live => self.live_ttl,
            DataSource::Mock | DataSource::Error => self.fallback_ttl,
        }
    }
}

/// A fully populated cached payload
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub fetched_at: DateTime<Utc>,
    pub source: DataSource,
    /// Source whose TTL governs expiry; usually `source`
    freshness: DataSource,
}

impl<T> CacheEntry<T> {
    #[must_use]
    pub fn new(payload: T, source: DataSource) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
            source,
            freshness: source,
        }
    }

    /// Expire on the schedule of `source` instead of the entry's own tag
    #[must_use]
    pub fn expiring_as(mut self, source: DataSource) -> Self {
        self.freshness = source;
        self
    }

    /// Age of this entry; zero if the clock went backwards
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.fetched_at).to_std().unwrap_or_default()
    }

    #[must_use]
    pub fn is_fresh(&self, policy: &FreshnessPolicy) -> bool {
        self.age() < policy.ttl_for(self.freshness)
    }
}

/// Single global entry, used for the hurricane feed
pub struct CacheSlot<T> {
    entry: RwLock<Option<Arc<CacheEntry<T>>>>,
    policy: FreshnessPolicy,
}

impl<T> CacheSlot<T> {
    #[must_use]
    pub fn new(policy: FreshnessPolicy) -> Self {
        Self {
            entry: RwLock::new(None),
            policy,
        }
    }

    /// The stored entry if it is still fresh
    pub async fn fresh(&self) -> Option<Arc<CacheEntry<T>>> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.is_fresh(&self.policy))
            .cloned()
    }

    pub async fn store(&self, entry: CacheEntry<T>) -> Arc<CacheEntry<T>> {
        let entry = Arc::new(entry);
        *self.entry.write().await = Some(Arc::clone(&entry));
        entry
    }
}

/// Entries keyed by region, used for point-scoped weather
pub struct RegionCache<K, T> {
    entries: RwLock<HashMap<K, Arc<CacheEntry<T>>>>,
    policy: FreshnessPolicy,
    /// Most regions held at once
    capacity: usize,
}

impl<K: Eq + Hash + Clone, T> RegionCache<K, T> {
    #[must_use]
    pub fn new(policy: FreshnessPolicy, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
            capacity: capacity.max(1),
        }
    }

    pub async fn fresh(&self, key: &K) -> Option<Arc<CacheEntry<T>>> {
        self.entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_fresh(&self.policy))
            .cloned()
    }

    /// Insert `entry` for `key`, dropping every stale region and, when full,
    /// the oldest one
    pub async fn store(&self, key: K, entry: CacheEntry<T>) -> Arc<CacheEntry<T>> {
        let entry = Arc::new(entry);
        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.is_fresh(&self.policy));

        while !entries.contains_key(&key) && entries.len() >= self.capacity {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, existing)| existing.fetched_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            entries.remove(&oldest);
        }

        entries.insert(key, Arc::clone(&entry));
        entry
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
