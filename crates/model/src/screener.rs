//! Screening pipeline.

use std::{collections::BTreeMap, sync::Arc};

use futures_util::{StreamExt, stream};
use peerval_primitives::{
    BenchmarkRecord, MarketCapBucket, MarketCapLadder, OTHER_PEER_GROUP, RawFundamentals,
    Recommendation, Symbol, UNCATEGORIZED, ValuationResult,
};
use peerval_traits::SourceError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    BenchmarkAggregator, FairValueEstimator, ModelError, Observation, Predicate, Preset,
    ScreenCriteria, Strategy,
};

/// Screening settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Upside above which a valuation is treated as a data error
    /// (`None` disables the check).
    pub upside_ceiling: Option<f64>,
    /// Concurrent fetches per pass.
    pub concurrency: usize,
    /// Market-cap bucket thresholds.
    pub ladder: MarketCapLadder,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self { upside_ceiling: Some(500.0), concurrency: 8, ladder: MarketCapLadder::default() }
    }
}

impl ScreenConfig {
    /// Check the configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for zero concurrency or a NaN
    /// ceiling.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.concurrency == 0 {
            return Err(ModelError::InvalidConfig("concurrency must be positive".to_string()));
        }
        if self.upside_ceiling.is_some_and(f64::is_nan) {
            return Err(ModelError::InvalidConfig("upside_ceiling is NaN".to_string()));
        }
        Ok(())
    }
}

/// One qualifying security.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenRow {
    /// Ticker.
    pub ticker: Symbol,
    /// Display name.
    pub name: String,
    /// Listing category.
    pub category: String,
    /// Peer group the benchmark came from.
    pub peer_group: String,
    /// Last price.
    pub price: f64,
    /// Blended fair value.
    pub fair_value: f64,
    /// Upside of the blended fair value, percent.
    pub upside_pct: f64,
    /// Trailing P/E.
    pub pe: Option<f64>,
    /// Trailing P/E over the benchmark P/E.
    pub pe_vs_benchmark: Option<f64>,
    /// ROE, percent.
    pub roe_pct: Option<f64>,
    /// Price to book.
    pub pb: Option<f64>,
    /// Profit margin, percent.
    pub profit_margin_pct: Option<f64>,
    /// Raw market capitalization.
    pub market_cap: Option<f64>,
    /// Market-cap bucket.
    pub market_cap_bucket: Option<MarketCapBucket>,
    /// Percentage below the 52-week high.
    pub pct_from_high: Option<f64>,
    /// Percentage above the 52-week low.
    pub pct_from_low: Option<f64>,
    /// Label derived from the upside.
    pub recommendation: Recommendation,
    /// Full valuation detail.
    pub valuation: ValuationResult,
}

/// Counts of what happened to each candidate in a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreenSummary {
    /// Candidates offered to the pass.
    pub candidates: usize,
    /// Candidates whose fetch completed before the pass ended.
    pub processed: usize,
    /// Fetch errors.
    pub fetch_failed: usize,
    /// No valuation method produced an upside.
    pub no_valid_method: usize,
    /// Upside above the ceiling.
    pub outlier_rejected: usize,
    /// Failed a predicate.
    pub filtered_out: usize,
    /// Predicate failures by predicate.
    pub filtered_by: BTreeMap<Predicate, usize>,
    /// Rows returned.
    pub matched: usize,
    /// The pass stopped on the result limit.
    pub limit_reached: bool,
    /// The pass was cancelled by the caller.
    pub cancelled: bool,
}

impl ScreenSummary {
    /// Candidates excluded for any reason.
    #[must_use]
    pub const fn excluded(&self) -> usize {
        self.fetch_failed + self.no_valid_method + self.outlier_rejected + self.filtered_out
    }

    /// One-line description of the exclusions.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut text = format!(
            "matched {} of {}; excluded {} of {}: {} fetch failed, {} no valid method, {} outlier, {} filtered",
            self.matched,
            self.candidates,
            self.excluded(),
            self.processed,
            self.fetch_failed,
            self.no_valid_method,
            self.outlier_rejected,
            self.filtered_out,
        );
        if !self.filtered_by.is_empty() {
            let parts: Vec<String> = self.filtered_by.iter().map(|(p, n)| format!("{p} {n}")).collect();
            text.push_str(&format!(" ({})", parts.join(", ")));
        }
        if self.limit_reached {
            text.push_str("; stopped at limit");
        }
        if self.cancelled {
            text.push_str("; cancelled");
        }
        text
    }

    fn record(&mut self, exclusion: Exclusion) {
        match exclusion {
            Exclusion::FetchFailed => self.fetch_failed += 1,
            Exclusion::NoValidMethod => self.no_valid_method += 1,
            Exclusion::OutlierRejected => self.outlier_rejected += 1,
            Exclusion::Filtered(predicate) => {
                self.filtered_out += 1;
                *self.filtered_by.entry(predicate).or_default() += 1;
            }
        }
    }
}

/// Result of a screening pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenReport {
    /// Qualifying rows, best first for the strategy.
    pub rows: Vec<ScreenRow>,
    /// Exclusion counts.
    pub summary: ScreenSummary,
    /// Strategy the rows are ordered for.
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exclusion {
    FetchFailed,
    NoValidMethod,
    OutlierRejected,
    Filtered(Predicate),
}

/// Screens candidates against their peer benchmarks.
#[derive(Debug)]
pub struct Screener {
    aggregator: Arc<BenchmarkAggregator>,
    estimator: Arc<FairValueEstimator>,
    config: ScreenConfig,
}

impl Screener {
    /// Create a screener with the default configuration.
    #[must_use]
    pub fn new(aggregator: Arc<BenchmarkAggregator>, estimator: Arc<FairValueEstimator>) -> Self {
        Self { aggregator, estimator, config: ScreenConfig::default() }
    }

    /// Create a screener with a custom configuration.
    ///
    /// # Errors
    /// Returns `ModelError` if the configuration is invalid.
    pub fn with_config(
        aggregator: Arc<BenchmarkAggregator>,
        estimator: Arc<FairValueEstimator>,
        config: ScreenConfig,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { aggregator, estimator, config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// The benchmark aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &Arc<BenchmarkAggregator> {
        &self.aggregator
    }

    /// Screen `candidates` against one peer group's benchmark.
    ///
    /// Stops after `limit` qualifying rows (0 = no limit).
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the criteria are invalid.
    pub async fn screen(
        &self,
        candidates: &[Symbol],
        peer_group: &str,
        criteria: &ScreenCriteria,
        limit: usize,
    ) -> Result<ScreenReport, ModelError> {
        self.screen_with_cancel(candidates, peer_group, criteria, limit, &CancellationToken::new()).await
    }

    /// [`Screener::screen`], ending early when `cancel` fires. Cancellation
    /// also interrupts the benchmark computation.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the criteria are invalid.
    pub async fn screen_with_cancel(
        &self,
        candidates: &[Symbol],
        peer_group: &str,
        criteria: &ScreenCriteria,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<ScreenReport, ModelError> {
        criteria.validate()?;
        let Some(benchmark) = self.benchmark(peer_group, cancel).await else {
            return Ok(cancelled_report(candidates.len(), criteria.strategy));
        };
        let jobs = candidates.iter().map(|s| (s.clone(), Arc::clone(&benchmark))).collect();
        Ok(self.run(jobs, criteria, limit, cancel).await)
    }

    /// Screen the first `candidate_limit` members of a peer group
    /// (0 = every member).
    ///
    /// # Errors
    /// Returns `ModelError::UnknownPeerGroup` if the group is not declared,
    /// or `ModelError::InvalidConfig` if the criteria are invalid.
    pub async fn screen_peer_group(
        &self,
        peer_group: &str,
        criteria: &ScreenCriteria,
        limit: usize,
        candidate_limit: usize,
    ) -> Result<ScreenReport, ModelError> {
        let members = self
            .aggregator
            .registry()
            .members(peer_group)
            .ok_or_else(|| ModelError::UnknownPeerGroup(peer_group.to_string()))?;
        let candidates = take_candidates(members, candidate_limit);
        self.screen(candidates, peer_group, criteria, limit).await
    }

    /// Screen candidates from mixed peer groups, each against its own group's
    /// benchmark. Every distinct group is computed once, before any candidate
    /// is fetched. Unlisted tickers use the [`OTHER_PEER_GROUP`] benchmark.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the criteria are invalid.
    pub async fn screen_listed(
        &self,
        candidates: &[Symbol],
        criteria: &ScreenCriteria,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<ScreenReport, ModelError> {
        criteria.validate()?;
        let registry = self.aggregator.registry();
        let mut benchmarks: BTreeMap<&str, Arc<BenchmarkRecord>> = BTreeMap::new();
        let mut jobs = Vec::with_capacity(candidates.len());

        for symbol in candidates {
            let group = registry.peer_group_of(symbol).unwrap_or(OTHER_PEER_GROUP);
            let benchmark = match benchmarks.get(group) {
                Some(b) => Arc::clone(b),
                None => {
                    let Some(b) = self.benchmark(group, cancel).await else {
                        return Ok(cancelled_report(candidates.len(), criteria.strategy));
                    };
                    benchmarks.insert(group, Arc::clone(&b));
                    b
                }
            };
            jobs.push((symbol.clone(), benchmark));
        }

        Ok(self.run(jobs, criteria, limit, cancel).await)
    }

    /// Run a preset over the registry's listings.
    ///
    /// # Errors
    /// Returns `ModelError` if the preset names an unknown peer group or its
    /// criteria are invalid.
    pub async fn screen_preset(&self, preset: &Preset, cancel: &CancellationToken) -> Result<ScreenReport, ModelError> {
        let registry = self.aggregator.registry();

        let candidates: Vec<Symbol> = if preset.peer_groups.is_empty() {
            take_candidates(registry.symbols(), preset.candidate_limit).to_vec()
        } else {
            let mut pooled = Vec::new();
            for group in &preset.peer_groups {
                let members =
                    registry.members(group).ok_or_else(|| ModelError::UnknownPeerGroup(group.clone()))?;
                pooled.extend_from_slice(members);
            }
            take_candidates(&pooled, preset.candidate_limit).to_vec()
        };

        tracing::info!(preset = %preset.name, candidates = candidates.len(), "running preset");
        self.screen_listed(&candidates, &preset.criteria, preset.result_limit, cancel).await
    }

    /// Benchmark for `peer_group`, or `None` if `cancel` fires first.
    async fn benchmark(&self, peer_group: &str, cancel: &CancellationToken) -> Option<Arc<BenchmarkRecord>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            record = self.aggregator.compute(peer_group) => Some(record),
        }
    }

    async fn run(
        &self,
        jobs: Vec<(Symbol, Arc<BenchmarkRecord>)>,
        criteria: &ScreenCriteria,
        limit: usize,
        cancel: &CancellationToken,
    ) -> ScreenReport {
        let mut summary = ScreenSummary { candidates: jobs.len(), ..ScreenSummary::default() };
        let mut rows = Vec::new();
        let source = self.aggregator.source();

        let mut fetched = stream::iter(jobs)
            .map(|(symbol, benchmark)| async move {
                let result = source.fetch(&symbol).await;
                (symbol, benchmark, result)
            })
            .buffered(self.config.concurrency.max(1));

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                next = fetched.next() => next,
            };
            let Some((symbol, benchmark, result)) = next else { break };

            summary.processed += 1;
            match self.evaluate(&symbol, &benchmark, result, criteria) {
                Ok(row) => rows.push(row),
                Err(exclusion) => summary.record(exclusion),
            }

            if limit > 0 && rows.len() >= limit {
                summary.limit_reached = true;
                break;
            }
        }
        drop(fetched);

        match criteria.strategy {
            Strategy::Overvalued => rows.sort_by(|a, b| a.upside_pct.total_cmp(&b.upside_pct)),
            Strategy::Undervalued | Strategy::Any => rows.sort_by(|a, b| b.upside_pct.total_cmp(&a.upside_pct)),
        }
        summary.matched = rows.len();

        tracing::info!(
            candidates = summary.candidates,
            processed = summary.processed,
            matched = summary.matched,
            excluded = summary.excluded(),
            cancelled = summary.cancelled,
            "screening pass complete"
        );
        ScreenReport { rows, summary, strategy: criteria.strategy }
    }

    fn evaluate(
        &self,
        symbol: &Symbol,
        benchmark: &Arc<BenchmarkRecord>,
        fetched: Result<RawFundamentals, SourceError>,
        criteria: &ScreenCriteria,
    ) -> Result<ScreenRow, Exclusion> {
        let fundamentals = fetched.map_err(|err| {
            tracing::debug!(%symbol, error = %err, "skipping candidate");
            Exclusion::FetchFailed
        })?;

        let valuation = self.estimator.estimate(&fundamentals, benchmark);
        let (Some(price), Some(fair_value), Some(upside)) =
            (fundamentals.positive_price(), valuation.blended_fair_value, valuation.upside_pct)
        else {
            return Err(Exclusion::NoValidMethod);
        };

        if self.config.upside_ceiling.is_some_and(|ceiling| upside > ceiling) {
            tracing::debug!(%symbol, upside, "upside above ceiling, treating as data error");
            return Err(Exclusion::OutlierRejected);
        }

        let bucket = self.config.ladder.classify(fundamentals.market_cap);
        let observation = Observation { fundamentals: &fundamentals, valuation: &valuation, bucket };
        if let Some(predicate) = criteria.first_failure(&observation) {
            return Err(Exclusion::Filtered(predicate));
        }

        let registry = self.aggregator.registry();
        let (name, category) = registry.security(symbol).map_or_else(
            || (symbol.to_string(), UNCATEGORIZED.to_string()),
            |s| (s.name.clone(), s.category.clone()),
        );
        let pe = fundamentals.pe();

        Ok(ScreenRow {
            ticker: symbol.clone(),
            name,
            category,
            peer_group: benchmark.peer_group.clone(),
            price,
            fair_value,
            upside_pct: upside,
            pe,
            pe_vs_benchmark: pe.and_then(|pe| peerval_math::checked_div(pe, benchmark.pe)),
            roe_pct: fundamentals.roe_pct(),
            pb: fundamentals.pb(),
            profit_margin_pct: fundamentals.profit_margin_pct(),
            market_cap: fundamentals.market_cap,
            market_cap_bucket: bucket,
            pct_from_high: fundamentals.pct_from_high(),
            pct_from_low: fundamentals.pct_from_low(),
            recommendation: Recommendation::from_upside(upside),
            valuation,
        })
    }
}

fn cancelled_report(candidates: usize, strategy: Strategy) -> ScreenReport {
    tracing::info!(candidates, "screening pass cancelled before fetching candidates");
    let summary = ScreenSummary { candidates, cancelled: true, ..ScreenSummary::default() };
    ScreenReport { rows: Vec::new(), summary, strategy }
}

fn take_candidates(members: &[Symbol], candidate_limit: usize) -> &[Symbol] {
    if candidate_limit == 0 { members } else { &members[..candidate_limit.min(members.len())] }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use approx::assert_relative_eq;
    use peerval_peers::PeerGroupRegistry;
    use peerval_primitives::Security;
    use peerval_traits::{FundamentalsSource, async_trait};
    use peerval_utils::InMemorySource;
    use rstest::rstest;

    use super::*;

    fn scenario_stock() -> RawFundamentals {
        RawFundamentals {
            price: Some(100.0),
            trailing_pe: Some(20.0),
            trailing_eps: Some(5.0),
            market_cap: Some(3e11),
            ..Default::default()
        }
    }

    fn stock_with_upside(upside: f64) -> RawFundamentals {
        // Benchmark PE 25, own PE 20: target 22.6, so EPS sets the fair value.
        let eps = 100.0 * (1.0 + upside / 100.0) / 22.6;
        RawFundamentals { trailing_eps: Some(eps), ..scenario_stock() }
    }

    /// Registry with an empty "Technology" group plus `n` listed "Other" tickers.
    fn registry_with(n: usize) -> Arc<PeerGroupRegistry> {
        let listings = (0..n).map(|i| Security::from_listing(&format!("S{i}"), &format!("Stock {i}"), None));
        Arc::new(PeerGroupRegistry::builtin().with_listings(listings).unwrap())
    }

    fn screener(source: Arc<dyn FundamentalsSource>, registry: Arc<PeerGroupRegistry>, concurrency: usize) -> Screener {
        let aggregator = Arc::new(BenchmarkAggregator::new(registry, source));
        let config = ScreenConfig { concurrency, ..ScreenConfig::default() };
        Screener::with_config(aggregator, Arc::new(FairValueEstimator::new()), config).unwrap()
    }

    fn symbols(n: usize) -> Vec<Symbol> {
        (0..n).map(|i| Symbol::new(format!("S{i}"))).collect()
    }

    #[rstest]
    #[case(15.0, 0)]
    #[case(10.0, 1)]
    #[tokio::test]
    async fn upside_floor_scenario(#[case] upside_min: f64, #[case] expected: usize) {
        let mut source = InMemorySource::new();
        source.insert("S0", scenario_stock());
        let screener = screener(Arc::new(source), registry_with(1), 8);
        let criteria = ScreenCriteria::new(Strategy::Undervalued).with_upside_min(upside_min);

        let report = screener.screen(&symbols(1), "Technology", &criteria, 0).await.unwrap();
        assert_eq!(report.rows.len(), expected);
        if let Some(row) = report.rows.first() {
            assert_relative_eq!(row.fair_value, 113.0, epsilon = 1e-9);
            assert_relative_eq!(row.upside_pct, 13.0, epsilon = 1e-9);
            assert_eq!(row.recommendation, Recommendation::Hold);
            assert_eq!(row.market_cap_bucket, Some(MarketCapBucket::Mid));
            assert_relative_eq!(row.pe_vs_benchmark.unwrap(), 0.8);
            assert_eq!(row.name, "Stock 0");
            assert_eq!(row.peer_group, "Technology");
        } else {
            assert_eq!(report.summary.filtered_by.get(&Predicate::UpsideMin), Some(&1));
        }
    }

    #[tokio::test]
    async fn monotone_in_upside_min() {
        let upsides = [-20.0, -5.0, 3.0, 8.0, 12.0, 18.0, 26.0, 40.0, 75.0];
        let source: InMemorySource = upsides
            .iter()
            .enumerate()
            .map(|(i, u)| (Symbol::new(format!("S{i}")), stock_with_upside(*u)))
            .collect();
        let screener = screener(Arc::new(source), registry_with(upsides.len()), 4);
        let candidates = symbols(upsides.len());

        let mut previous = usize::MAX;
        for floor in [-50.0, 0.0, 5.0, 10.0, 20.0, 50.0, 100.0] {
            let criteria = ScreenCriteria::default().with_upside_min(floor);
            let n = screener.screen(&candidates, "Technology", &criteria, 0).await.unwrap().rows.len();
            assert!(n <= previous, "floor {floor}: {n} > {previous}");
            previous = n;
        }
        assert_eq!(previous, 0);
    }

    #[tokio::test]
    async fn exclusions_are_counted() {
        let mut source = InMemorySource::new();
        source.insert("S0", scenario_stock());
        source.insert("S1", RawFundamentals { price: Some(50.0), ..Default::default() });
        source.insert("S2", stock_with_upside(900.0));
        source.insert("S3", stock_with_upside(-30.0));
        source.insert_error("S4", SourceError::RateLimited);
        let screener = screener(Arc::new(source), registry_with(6), 8);

        let report = screener
            .screen(&symbols(6), "Technology", &ScreenCriteria::new(Strategy::Undervalued), 0)
            .await
            .unwrap();
        let summary = &report.summary;

        assert_eq!(report.rows.len(), 1);
        assert_eq!(summary.candidates, 6);
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.fetch_failed, 2);
        assert_eq!(summary.no_valid_method, 1);
        assert_eq!(summary.outlier_rejected, 1);
        assert_eq!(summary.filtered_out, 1);
        assert_eq!(summary.filtered_by.get(&Predicate::Strategy), Some(&1));
        assert_eq!(summary.excluded(), 5);
        assert!(summary.describe().starts_with("matched 1 of 6; excluded 5 of 6"));
    }

    #[tokio::test]
    async fn disabled_ceiling_keeps_extreme_upside() {
        let mut source = InMemorySource::new();
        source.insert("S0", stock_with_upside(900.0));
        let aggregator = Arc::new(BenchmarkAggregator::new(registry_with(1), Arc::new(source)));
        let config = ScreenConfig { upside_ceiling: None, ..ScreenConfig::default() };
        let screener = Screener::with_config(aggregator, Arc::new(FairValueEstimator::new()), config).unwrap();

        let report = screener.screen(&symbols(1), "Technology", &ScreenCriteria::default(), 0).await.unwrap();
        assert_eq!(report.rows.len(), 1);
    }

    struct Counting {
        inner: InMemorySource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FundamentalsSource for Counting {
        async fn fetch(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(symbol).await
        }
    }

    #[rstest]
    #[case(1)]
    #[case(8)]
    #[tokio::test]
    async fn limit_stops_early_and_sorts(#[case] concurrency: usize) {
        let inner: InMemorySource = (0..200)
            .map(|i| (Symbol::new(format!("S{i}")), stock_with_upside(1.0 + f64::from(i % 37))))
            .collect();
        let source = Arc::new(Counting { inner, calls: AtomicUsize::new(0) });
        let screener = screener(source.clone(), registry_with(200), concurrency);

        let report = screener
            .screen(&symbols(200), "Technology", &ScreenCriteria::new(Strategy::Undervalued), 25)
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 25);
        assert!(report.summary.limit_reached);
        assert!(report.rows.windows(2).all(|w| w[0].upside_pct >= w[1].upside_pct));
        assert!(source.calls.load(Ordering::SeqCst) <= 25 + concurrency);
    }

    #[tokio::test]
    async fn overvalued_sorts_ascending() {
        let source: InMemorySource = [-40.0, -12.0, -25.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, u)| (Symbol::new(format!("S{i}")), stock_with_upside(*u)))
            .collect();
        let screener = screener(Arc::new(source), registry_with(4), 2);

        let report = screener
            .screen(&symbols(4), "Technology", &ScreenCriteria::new(Strategy::Overvalued), 0)
            .await
            .unwrap();
        let upsides: Vec<f64> = report.rows.iter().map(|r| r.upside_pct.round()).collect();
        assert_eq!(upsides, vec![-40.0, -25.0, -12.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_pass() {
        let source: InMemorySource =
            (0..50).map(|i| (Symbol::new(format!("S{i}")), scenario_stock())).collect();
        let source = source.with_latency(Duration::from_secs(1));
        let screener = screener(Arc::new(source), registry_with(50), 1);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3_500)).await;
            trigger.cancel();
        });

        let report = screener
            .screen_with_cancel(&symbols(50), "Technology", &ScreenCriteria::default(), 0, &cancel)
            .await
            .unwrap();

        assert!(report.summary.cancelled);
        assert_eq!(report.summary.processed, 3);
        assert_eq!(report.rows.len(), 3);
    }

    #[tokio::test]
    async fn peer_group_candidates_are_limited() {
        let mut source = InMemorySource::new();
        let mut listings = Vec::new();
        for i in 0..10 {
            source.insert(format!("T{i}").as_str(), scenario_stock());
            listings.push(Security::from_listing(&format!("T{i}"), "Tech", Some("Business Software & Services")));
        }
        let registry = Arc::new(PeerGroupRegistry::builtin().with_listings(listings).unwrap());
        let screener = screener(Arc::new(source), registry, 4);

        let report = screener.screen_peer_group("Technology", &ScreenCriteria::default(), 0, 4).await.unwrap();
        assert_eq!(report.summary.candidates, 4);

        let err = screener.screen_peer_group("Crypto", &ScreenCriteria::default(), 0, 4).await;
        assert!(matches!(err, Err(ModelError::UnknownPeerGroup(_))));
    }

    #[tokio::test]
    async fn listed_candidates_use_their_own_group() {
        let mut source = InMemorySource::new();
        source.insert("T0", scenario_stock());
        source.insert("S0", scenario_stock());
        let listings = vec![
            Security::from_listing("T0", "Tech", Some("Business Software & Services")),
            Security::from_listing("S0", "Misc", None),
        ];
        let registry = Arc::new(PeerGroupRegistry::builtin().with_listings(listings).unwrap());
        let screener = screener(Arc::new(source), registry, 4);
        let candidates = vec![Symbol::new("T0"), Symbol::new("S0")];

        let report = screener
            .screen_listed(&candidates, &ScreenCriteria::default(), 0, &CancellationToken::new())
            .await
            .unwrap();
        let groups: Vec<&str> = report.rows.iter().map(|r| r.peer_group.as_str()).collect();

        // Technology PE 25 gives 13% upside; the global PE 20 gives -4.5%.
        assert_eq!(groups, vec!["Technology", OTHER_PEER_GROUP]);
        assert_relative_eq!(report.rows[1].upside_pct, -4.5, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn preset_runs_over_listings() {
        let mut source = InMemorySource::new();
        for i in 0..3 {
            source.insert(format!("S{i}").as_str(), stock_with_upside(10.0 * f64::from(i + 1)));
        }
        let screener = screener(Arc::new(source), registry_with(3), 4);
        let preset = crate::preset("growth-at-reasonable-price").unwrap();

        let report = screener.screen_preset(&preset, &CancellationToken::new()).await.unwrap();
        // Valued against the global benchmark, nothing clears the 15% floor.
        assert_eq!(report.rows.len(), 0);
        assert_eq!(report.summary.candidates, 3);
        assert_eq!(report.summary.filtered_out, 3);
    }

    /// Registry whose "Technology" group has `n` listed members `T0..Tn`.
    fn tech_registry(n: usize) -> Arc<PeerGroupRegistry> {
        let listings =
            (0..n).map(|i| Security::from_listing(&format!("T{i}"), "Tech", Some("Business Software & Services")));
        Arc::new(PeerGroupRegistry::builtin().with_listings(listings).unwrap())
    }

    fn tech_source(n: usize) -> InMemorySource {
        (0..n).map(|i| (Symbol::new(format!("T{i}")), scenario_stock())).collect()
    }

    #[tokio::test]
    async fn benchmark_computed_once_per_group_pass() {
        let source = Arc::new(tech_source(10));
        let screener = screener(source.clone(), tech_registry(10), 4);

        let report = screener.screen_peer_group("Technology", &ScreenCriteria::default(), 0, 0).await.unwrap();

        // Ten benchmark samples plus ten candidate fetches.
        assert_eq!(report.rows.len(), 10);
        assert_eq!(source.calls(), 20);
    }

    #[tokio::test]
    async fn listed_pass_computes_each_group_once() {
        let mut source = tech_source(6);
        let mut listings: Vec<Security> = (0..6)
            .map(|i| Security::from_listing(&format!("T{i}"), "Tech", Some("Business Software & Services")))
            .collect();
        for i in 0..4 {
            source.insert(format!("B{i}").as_str(), scenario_stock());
            listings.push(Security::from_listing(&format!("B{i}"), "Bank", Some("Money Center Banks")));
        }
        let source = Arc::new(source);
        let registry = Arc::new(PeerGroupRegistry::builtin().with_listings(listings).unwrap());
        let candidates = registry.symbols().to_vec();
        let screener = screener(source.clone(), registry, 4);

        let report = screener
            .screen_listed(&candidates, &ScreenCriteria::default(), 0, &CancellationToken::new())
            .await
            .unwrap();

        // One sample per member for each of the two groups, then one fetch per candidate.
        assert_eq!(report.summary.processed, 10);
        assert_eq!(source.calls(), 10 + 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_pass_skips_benchmark() {
        let source = Arc::new(tech_source(40).with_latency(Duration::from_secs(5)));
        let screener = screener(source.clone(), tech_registry(40), 8);
        let candidates: Vec<Symbol> = (0..40).map(|i| Symbol::new(format!("T{i}"))).collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = screener
            .screen_with_cancel(&candidates, "Technology", &ScreenCriteria::default(), 0, &cancel)
            .await
            .unwrap();

        assert!(report.summary.cancelled);
        assert_eq!(report.summary.candidates, 40);
        assert_eq!(report.summary.processed, 0);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_benchmark() {
        let source = Arc::new(tech_source(40).with_latency(Duration::from_secs(5)));
        let screener = screener(source.clone(), tech_registry(40), 8);
        let candidates: Vec<Symbol> = (0..40).map(|i| Symbol::new(format!("T{i}"))).collect();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });

        let start = tokio::time::Instant::now();
        let report = screener
            .screen_listed(&candidates, &ScreenCriteria::default(), 0, &cancel)
            .await
            .unwrap();

        assert!(report.summary.cancelled);
        assert_eq!(report.summary.processed, 0);
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(source.calls() < 40);
    }

    #[rstest]
    #[case(ScreenCriteria::default().with_upside_min(30.0).with_upside_max(10.0))]
    #[case(ScreenCriteria::default().with_upside_min(f64::NAN))]
    #[tokio::test]
    async fn invalid_criteria_are_rejected(#[case] criteria: ScreenCriteria) {
        let source = Arc::new(tech_source(3));
        let screener = screener(source.clone(), tech_registry(3), 4);
        let candidates: Vec<Symbol> = (0..3).map(|i| Symbol::new(format!("T{i}"))).collect();

        let err = screener.screen(&candidates, "Technology", &criteria, 0).await;
        assert!(matches!(err, Err(ModelError::InvalidConfig(_))));
        let err = screener.screen_listed(&candidates, &criteria, 0, &CancellationToken::new()).await;
        assert!(matches!(err, Err(ModelError::InvalidConfig(_))));
        assert_eq!(source.calls(), 0);
    }
}
