//! Resilient wrapper around a fundamentals source.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use peerval_primitives::{RawFundamentals, Symbol};
use peerval_traits::{FundamentalsSource, SourceError};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};

use crate::{RetryPolicy, TtlCache};

/// Fundamentals cache inserts between sweeps of expired entries.
pub const CACHE_PURGE_INTERVAL: usize = 256;

/// Fetch-layer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Deadline for a single upstream call.
    pub timeout: Duration,
    /// Retry schedule for transient errors.
    pub retry: RetryPolicy,
    /// Minimum spacing between upstream calls.
    pub min_interval: Duration,
    /// Fundamentals cache lifetime; `None` disables caching.
    pub cache_ttl: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            min_interval: Duration::from_millis(300),
            cache_ttl: Some(Duration::from_secs(60 * 60)),
        }
    }
}

/// Serializes upstream calls so consecutive calls start at least
/// `min_interval` apart.
#[derive(Debug)]
struct Pacer {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: Mutex::new(None) }
    }

    async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// A [`FundamentalsSource`] adding timeout, retry, pacing and caching to
/// another source.
#[derive(Debug)]
pub struct ResilientSource<S> {
    inner: S,
    config: FetchConfig,
    pacer: Pacer,
    cache: Option<TtlCache<Symbol, RawFundamentals>>,
}

impl<S: FundamentalsSource> ResilientSource<S> {
    /// Wrap `inner` with the default settings.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, FetchConfig::default())
    }

    /// Wrap `inner` with explicit settings.
    pub fn with_config(inner: S, config: FetchConfig) -> Self {
        Self {
            inner,
            pacer: Pacer::new(config.min_interval),
            cache: config.cache_ttl.map(|ttl| TtlCache::new(ttl).with_purge_every(CACHE_PURGE_INTERVAL)),
            config,
        }
    }

    /// The settings in use.
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The wrapped source.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop a cached snapshot.
    pub fn invalidate(&self, symbol: &Symbol) -> bool {
        self.cache.as_ref().is_some_and(|c| c.invalidate(symbol))
    }

    /// Drop every expired snapshot, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.purge_expired(Utc::now()))
    }

    /// Number of cached snapshots, expired or not.
    pub fn cached(&self) -> usize {
        self.cache.as_ref().map_or(0, TtlCache::len)
    }

    async fn fetch_once(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError> {
        self.pacer.wait().await;
        match tokio::time::timeout(self.config.timeout, self.inner.fetch(symbol)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.config.timeout)),
        }
    }
}

#[async_trait]
impl<S: FundamentalsSource> FundamentalsSource for ResilientSource<S> {
    async fn fetch(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(symbol)) {
            tracing::trace!(%symbol, "fundamentals cache hit");
            return Ok(hit);
        }

        let result =
            self.config.retry.run_if(move || self.fetch_once(symbol), SourceError::is_transient).await;

        match &result {
            Ok(fundamentals) => {
                if let Some(cache) = &self.cache {
                    cache.insert(symbol.clone(), fundamentals.clone());
                }
            }
            Err(err @ SourceError::Timeout(_)) => {
                tracing::warn!(source = self.inner.name(), %symbol, error = %err, "fetch timed out");
            }
            Err(err) => {
                tracing::debug!(source = self.inner.name(), %symbol, error = %err, "fetch failed");
            }
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::InMemorySource;

    fn quiet() -> FetchConfig {
        FetchConfig { min_interval: Duration::ZERO, cache_ttl: None, ..FetchConfig::default() }
    }

    fn one_ticker() -> InMemorySource {
        let mut source = InMemorySource::new();
        source.insert("TCS.NS", RawFundamentals { price: Some(3500.0), ..Default::default() });
        source
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let inner = one_ticker().with_latency(Duration::from_secs(30));
        let config = FetchConfig { retry: RetryPolicy::none(), ..quiet() };
        let source = ResilientSource::with_config(inner, config);

        let result = source.fetch(&Symbol::new("TCS.NS")).await;
        assert_eq!(result, Err(SourceError::Timeout(Duration::from_secs(10))));
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_retried() {
        let inner = Arc::new(one_ticker().with_latency(Duration::from_secs(30)));
        let source = ResilientSource::with_config(Arc::clone(&inner), quiet());

        assert!(source.fetch(&Symbol::new("TCS.NS")).await.is_err());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_not_retried() {
        let inner = Arc::new(one_ticker());
        let source = ResilientSource::with_config(Arc::clone(&inner), quiet());

        assert_eq!(
            source.fetch(&Symbol::new("NOPE")).await,
            Err(SourceError::NotFound(Symbol::new("NOPE")))
        );
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_serves_repeat_calls() {
        let inner = Arc::new(one_ticker());
        let config = FetchConfig { cache_ttl: Some(Duration::from_secs(3600)), ..quiet() };
        let source = ResilientSource::with_config(Arc::clone(&inner), config);
        let tcs = Symbol::new("TCS.NS");

        source.fetch(&tcs).await.unwrap();
        source.fetch(&tcs).await.unwrap();
        assert_eq!(inner.calls(), 1);

        assert!(source.invalidate(&tcs));
        source.fetch(&tcs).await.unwrap();
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_snapshots_survive_purge() {
        let config = FetchConfig { cache_ttl: Some(Duration::from_secs(3600)), ..quiet() };
        let source = ResilientSource::with_config(one_ticker(), config);

        source.fetch(&Symbol::new("TCS.NS")).await.unwrap();
        assert_eq!(source.cached(), 1);
        assert_eq!(source.purge_expired(), 0);
        assert_eq!(source.cached(), 1);

        let uncached = ResilientSource::with_config(one_ticker(), quiet());
        assert_eq!(uncached.purge_expired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_are_spaced() {
        let config = FetchConfig { min_interval: Duration::from_millis(300), ..quiet() };
        let source = ResilientSource::with_config(one_ticker(), config);
        let tcs = Symbol::new("TCS.NS");
        let start = Instant::now();

        for _ in 0..3 {
            source.fetch(&tcs).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(600));
    }
}
