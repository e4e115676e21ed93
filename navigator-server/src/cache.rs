//! Caching layer for realtime leg responses.
//!
//! Several sessions tracking the same trip poll the same leg ids. A short
//! TTL (shorter than the poll period) lets them share one upstream request
//! per cycle while every cycle still sees fresh data.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::digitransit::{DigitransitError, LegSource};
use crate::domain::{LegId, RealtimeLeg};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// Leg source with caching.
///
/// Wraps any [`LegSource`] and caches successful responses by leg id.
/// Failures are never cached, so the next cycle retries upstream.
pub struct CachedLegSource<S> {
    source: S,
    legs: MokaCache<LegId, RealtimeLeg>,
}

impl<S: LegSource> CachedLegSource<S> {
    /// Create a new cached source.
    pub fn new(source: S, config: &CacheConfig) -> Self {
        let legs = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { source, legs }
    }

    /// Access the underlying source for operations that bypass cache.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.legs.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.legs.invalidate_all();
    }
}

impl<S: LegSource> LegSource for CachedLegSource<S> {
    async fn fetch_leg(&self, id: &LegId) -> Result<RealtimeLeg, DigitransitError> {
        if let Some(cached) = self.legs.get(id).await {
            debug!(leg = %id, "leg cache hit");
            return Ok(cached);
        }

        let leg = self.source.fetch_leg(id).await?;
        self.legs.insert(id.clone(), leg.clone()).await;

        Ok(leg)
    }
}
