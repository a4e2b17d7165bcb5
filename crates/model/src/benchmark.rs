//! Dynamic peer-group benchmarks.

use std::{collections::BTreeMap, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::{FutureExt, StreamExt, stream};
use ndarray::Array1;
use peerval_math::{IqrFilter, mean, sanitize_all};
use peerval_peers::PeerGroupRegistry;
use peerval_primitives::{
    BenchmarkRecord, Metric, MetricOrigin, RawFundamentals, StaticBenchmark, Symbol,
};
use peerval_traits::FundamentalsSource;
use peerval_utils::TtlCache;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Lifetime of a cached benchmark record.
pub const DEFAULT_BENCHMARK_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Cache of benchmark records keyed by peer-group name.
pub type BenchmarkCache = TtlCache<String, Arc<BenchmarkRecord>>;

/// Configuration for benchmark aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Members sampled per peer group (0 samples every member).
    pub sample_size: usize,
    /// Sanitized values needed before a metric is computed from data.
    pub min_samples: usize,
    /// IQR fence multiplier.
    pub iqr_fence: f64,
    /// Concurrent fetches while sampling.
    pub concurrency: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self { sample_size: 50, min_samples: 5, iqr_fence: 1.5, concurrency: 8 }
    }
}

impl BenchmarkConfig {
    /// Check the configuration.
    ///
    /// # Errors
    /// Returns `ModelError` for a zero sample floor, zero concurrency or an
    /// invalid fence.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.min_samples == 0 {
            return Err(ModelError::InvalidConfig("min_samples must be positive".to_string()));
        }
        if self.concurrency == 0 {
            return Err(ModelError::InvalidConfig("concurrency must be positive".to_string()));
        }
        IqrFilter::new(self.iqr_fence)?;
        Ok(())
    }
}

/// Evenly spaced subsample of `members`.
///
/// Picks index `floor(i * n / sample_size)` for `i in 0..sample_size`; when
/// `sample_size` is zero or not smaller than `n`, every member is kept.
#[must_use]
pub fn subsample<T>(members: &[T], sample_size: usize) -> Vec<&T> {
    let n = members.len();
    if sample_size == 0 || n <= sample_size {
        return members.iter().collect();
    }
    (0..sample_size).map(|i| &members[i * n / sample_size]).collect()
}

/// Robust mean of one metric across fetched snapshots.
///
/// Returns the mean of the sanitized, IQR-filtered values and the origin
/// describing the sample, or `None` when fewer than `min_samples` values
/// survive sanitization.
#[must_use]
pub fn aggregate_metric(
    metric: Metric,
    samples: &[RawFundamentals],
    filter: &IqrFilter,
    min_samples: usize,
) -> Option<(f64, MetricOrigin)> {
    let clean: Array1<f64> = sanitize_all(metric, samples.iter().map(|f| f.metric(metric)));
    if clean.len() < min_samples {
        return None;
    }
    let kept = filter.apply(&clean).ok()?;
    let value = mean(&kept)?;
    Some((value, MetricOrigin::Sampled { samples: clean.len(), retained: kept.len() }))
}

/// Build a record from fetched snapshots, filling thin metrics from `defaults`.
#[must_use]
pub fn aggregate(
    peer_group: &str,
    samples: &[RawFundamentals],
    defaults: StaticBenchmark,
    filter: &IqrFilter,
    min_samples: usize,
) -> BenchmarkRecord {
    let mut record = BenchmarkRecord::from_static(peer_group, defaults);
    let mut origins = BTreeMap::new();

    for metric in Metric::ALL {
        let (value, origin) = aggregate_metric(metric, samples, filter, min_samples)
            .unwrap_or((defaults.get(metric), MetricOrigin::Default));
        match metric {
            Metric::Pe => record.pe = value,
            Metric::Pb => record.pb = value,
            Metric::EvEbitda => record.ev_ebitda = value,
            Metric::Roe => record.roe = value,
        }
        origins.insert(metric, origin);
    }

    record.origins = origins;
    record
}

/// Computes peer-group benchmarks from live fundamentals.
///
/// Samples the group's members, fetches their fundamentals with bounded
/// concurrency and reduces each metric independently. Any failure, a panic
/// included, degrades to the group's static defaults.
pub struct BenchmarkAggregator {
    registry: Arc<PeerGroupRegistry>,
    source: Arc<dyn FundamentalsSource>,
    config: BenchmarkConfig,
    filter: IqrFilter,
    cache: Option<Arc<BenchmarkCache>>,
}

impl std::fmt::Debug for BenchmarkAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkAggregator")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("cached", &self.cache.as_ref().map(|c| c.len()))
            .finish_non_exhaustive()
    }
}

impl BenchmarkAggregator {
    /// Create an aggregator with the default configuration and no cache.
    #[must_use]
    pub fn new(registry: Arc<PeerGroupRegistry>, source: Arc<dyn FundamentalsSource>) -> Self {
        Self { registry, source, config: BenchmarkConfig::default(), filter: IqrFilter::default(), cache: None }
    }

    /// Create an aggregator with a custom configuration.
    ///
    /// # Errors
    /// Returns `ModelError` if the configuration is invalid.
    pub fn with_config(
        registry: Arc<PeerGroupRegistry>,
        source: Arc<dyn FundamentalsSource>,
        config: BenchmarkConfig,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        let filter = IqrFilter::new(config.iqr_fence)?;
        Ok(Self { registry, source, config, filter, cache: None })
    }

    /// Attach a benchmark cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<BenchmarkCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// The peer-group registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<PeerGroupRegistry> {
        &self.registry
    }

    /// The fundamentals source.
    #[must_use]
    pub const fn source(&self) -> &Arc<dyn FundamentalsSource> {
        &self.source
    }

    /// Drop a cached record so the next `compute` recomputes it.
    pub fn invalidate(&self, peer_group: &str) -> bool {
        self.cache.as_ref().is_some_and(|c| c.invalidate(&peer_group.to_string()))
    }

    /// Benchmark record for a peer group.
    ///
    /// Never fails: unknown groups get the global default, empty groups their
    /// static default, and thin metrics fall back one by one.
    pub async fn compute(&self, peer_group: &str) -> Arc<BenchmarkRecord> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&peer_group.to_string())) {
            tracing::debug!(peer_group, "benchmark cache hit");
            return hit;
        }

        let record = match AssertUnwindSafe(self.compute_dynamic(peer_group)).catch_unwind().await {
            Ok(record) => Arc::new(record),
            Err(_) => {
                tracing::error!(peer_group, "benchmark computation failed, using static defaults");
                return Arc::new(self.registry.static_default(peer_group));
            }
        };

        if let Some(cache) = &self.cache {
            cache.insert(peer_group.to_string(), Arc::clone(&record));
        }
        record
    }

    async fn compute_dynamic(&self, peer_group: &str) -> BenchmarkRecord {
        let Some(members) = self.registry.members(peer_group) else {
            tracing::debug!(peer_group, "unknown peer group, using global default");
            return self.registry.static_default(peer_group);
        };
        if members.is_empty() {
            tracing::debug!(peer_group, "peer group has no members, using static default");
            return self.registry.static_default(peer_group);
        }

        let sampled = subsample(members, self.config.sample_size);
        let samples = self.fetch_all(&sampled).await;
        let defaults = self.registry.defaults().resolve(peer_group);
        let record = aggregate(peer_group, &samples, defaults, &self.filter, self.config.min_samples);

        tracing::info!(
            peer_group,
            members = members.len(),
            sampled = sampled.len(),
            fetched = samples.len(),
            pe = record.pe,
            pb = record.pb,
            ev_ebitda = record.ev_ebitda,
            roe = record.roe,
            "computed benchmark"
        );
        record
    }

    async fn fetch_all(&self, symbols: &[&Symbol]) -> Vec<RawFundamentals> {
        let results: Vec<_> = stream::iter(symbols.iter().copied())
            .map(|symbol| async move { (symbol, self.source.fetch(symbol).await) })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(symbol, result)| match result {
                Ok(fundamentals) => Some(fundamentals),
                Err(err) => {
                    tracing::debug!(%symbol, error = %err, "skipping benchmark sample");
                    None
                }
            })
            .collect()
    }
}
