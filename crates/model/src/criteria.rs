//! Screening criteria.

use peerval_primitives::{MarketCapBucket, RawFundamentals, ValuationResult};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Direction of a screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Positive upside only; cheapest first.
    Undervalued,
    /// Negative upside only; most expensive first.
    Overvalued,
    /// No sign constraint.
    #[default]
    Any,
}

/// One screening predicate, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Upside sign matches the strategy.
    Strategy,
    /// Upside at or above the floor.
    UpsideMin,
    /// Upside at or below the cap.
    UpsideMax,
    /// Price at or above the floor.
    PriceMin,
    /// Price at or below the cap.
    PriceMax,
    /// Trailing P/E at or below an absolute cap.
    PeMax,
    /// Trailing P/E against a multiple of the benchmark P/E.
    PeVsBenchmark,
    /// ROE (percent) at or above the floor.
    RoeMin,
    /// P/B at or below the cap.
    PbMax,
    /// Distance below the 52-week high at or below the cap.
    BelowHighMax,
    /// Distance above the 52-week low at or below the cap.
    AboveLowMax,
    /// Market-cap bucket is one of the allowed buckets.
    MarketCap,
    /// Net debt over market cap (percent) at or below the cap.
    NetDebtMax,
}

impl Predicate {
    /// Short label for summaries.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::UpsideMin => "upside min",
            Self::UpsideMax => "upside max",
            Self::PriceMin => "price min",
            Self::PriceMax => "price max",
            Self::PeMax => "pe max",
            Self::PeVsBenchmark => "pe vs benchmark",
            Self::RoeMin => "roe min",
            Self::PbMax => "pb max",
            Self::BelowHighMax => "below 52w high",
            Self::AboveLowMax => "above 52w low",
            Self::MarketCap => "market cap",
            Self::NetDebtMax => "net debt",
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What the predicates look at for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// Fetched fundamentals.
    pub fundamentals: &'a RawFundamentals,
    /// Valuation against the peer benchmark.
    pub valuation: &'a ValuationResult,
    /// Market-cap bucket, if classifiable.
    pub bucket: Option<MarketCapBucket>,
}

/// Screening criteria. Every field is optional; absent fields impose nothing.
///
/// Predicates run in [`Predicate`] order and short-circuit. A predicate whose
/// input is missing for a candidate fails: a `roe_min` screen drops companies
/// that report no ROE instead of letting them through unchecked. Presets that
/// expect missing data to pass a filter should leave that filter unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenCriteria {
    /// Direction of the screen.
    pub strategy: Strategy,
    /// Minimum upside, percent.
    pub upside_min: Option<f64>,
    /// Maximum upside, percent.
    pub upside_max: Option<f64>,
    /// Minimum price.
    pub price_min: Option<f64>,
    /// Maximum price.
    pub price_max: Option<f64>,
    /// Maximum absolute trailing P/E.
    pub pe_max: Option<f64>,
    /// Multiple `m` of the benchmark P/E: undervalued and any screens require
    /// `PE <= m * benchmark`, overvalued screens `PE >= m * benchmark`.
    pub pe_vs_benchmark: Option<f64>,
    /// Minimum ROE, percent.
    pub roe_min: Option<f64>,
    /// Maximum price to book.
    pub pb_max: Option<f64>,
    /// Maximum percentage below the 52-week high.
    pub below_high_max: Option<f64>,
    /// Maximum percentage above the 52-week low.
    pub above_low_max: Option<f64>,
    /// Allowed market-cap buckets; empty allows all.
    pub market_caps: Vec<MarketCapBucket>,
    /// Maximum absolute net debt over market cap, percent.
    pub net_debt_max: Option<f64>,
}

fn at_least(value: Option<f64>, floor: f64) -> bool {
    value.is_some_and(|v| v >= floor)
}

fn at_most(value: Option<f64>, cap: f64) -> bool {
    value.is_some_and(|v| v <= cap)
}

impl ScreenCriteria {
    /// Criteria with only a strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy, ..Self::default() }
    }

    /// Set the upside floor.
    #[must_use]
    pub fn with_upside_min(mut self, pct: f64) -> Self {
        self.upside_min = Some(pct);
        self
    }

    /// Set the upside cap.
    #[must_use]
    pub fn with_upside_max(mut self, pct: f64) -> Self {
        self.upside_max = Some(pct);
        self
    }

    /// Set the price range.
    #[must_use]
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    /// Set the absolute P/E cap.
    #[must_use]
    pub fn with_pe_max(mut self, pe: f64) -> Self {
        self.pe_max = Some(pe);
        self
    }

    /// Set the benchmark P/E multiple.
    #[must_use]
    pub fn with_pe_vs_benchmark(mut self, multiple: f64) -> Self {
        self.pe_vs_benchmark = Some(multiple);
        self
    }

    /// Set the ROE floor, percent.
    #[must_use]
    pub fn with_roe_min(mut self, pct: f64) -> Self {
        self.roe_min = Some(pct);
        self
    }

    /// Set the P/B cap.
    #[must_use]
    pub fn with_pb_max(mut self, pb: f64) -> Self {
        self.pb_max = Some(pb);
        self
    }

    /// Require the price within `pct` percent of the 52-week high.
    #[must_use]
    pub fn with_below_high_max(mut self, pct: f64) -> Self {
        self.below_high_max = Some(pct);
        self
    }

    /// Require the price within `pct` percent above the 52-week low.
    #[must_use]
    pub fn with_above_low_max(mut self, pct: f64) -> Self {
        self.above_low_max = Some(pct);
        self
    }

    /// Restrict to market-cap buckets.
    #[must_use]
    pub fn with_market_caps(mut self, buckets: impl IntoIterator<Item = MarketCapBucket>) -> Self {
        self.market_caps = buckets.into_iter().collect();
        self
    }

    /// Set the net-debt cap, percent of market cap.
    #[must_use]
    pub fn with_net_debt_max(mut self, pct: f64) -> Self {
        self.net_debt_max = Some(pct);
        self
    }

    /// Check that thresholds are usable.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for NaN thresholds, inverted
    /// ranges or a non-positive benchmark multiple.
    pub fn validate(&self) -> Result<(), ModelError> {
        let thresholds = [
            ("upside_min", self.upside_min),
            ("upside_max", self.upside_max),
            ("price_min", self.price_min),
            ("price_max", self.price_max),
            ("pe_max", self.pe_max),
            ("pe_vs_benchmark", self.pe_vs_benchmark),
            ("roe_min", self.roe_min),
            ("pb_max", self.pb_max),
            ("below_high_max", self.below_high_max),
            ("above_low_max", self.above_low_max),
            ("net_debt_max", self.net_debt_max),
        ];
        if let Some((name, _)) = thresholds.iter().find(|(_, v)| v.is_some_and(f64::is_nan)) {
            return Err(ModelError::InvalidConfig(format!("{name} is NaN")));
        }
        if let (Some(min), Some(max)) = (self.upside_min, self.upside_max) {
            if min > max {
                return Err(ModelError::InvalidConfig(format!("upside range inverted: {min} > {max}")));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(ModelError::InvalidConfig(format!("price range inverted: {min} > {max}")));
            }
        }
        if self.pe_vs_benchmark.is_some_and(|m| m <= 0.0) {
            return Err(ModelError::InvalidConfig("pe_vs_benchmark must be positive".to_string()));
        }
        Ok(())
    }

    /// Outcome of one predicate, or `None` when the criteria do not set it.
    #[must_use]
    pub fn check(&self, predicate: Predicate, obs: &Observation<'_>) -> Option<bool> {
        let f = obs.fundamentals;
        let upside = obs.valuation.upside_pct;
        let passes = match predicate {
            Predicate::Strategy => match self.strategy {
                Strategy::Undervalued => upside.is_some_and(|u| u > 0.0),
                Strategy::Overvalued => upside.is_some_and(|u| u < 0.0),
                Strategy::Any => return None,
            },
            Predicate::UpsideMin => at_least(upside, self.upside_min?),
            Predicate::UpsideMax => at_most(upside, self.upside_max?),
            Predicate::PriceMin => at_least(f.positive_price(), self.price_min?),
            Predicate::PriceMax => at_most(f.positive_price(), self.price_max?),
            Predicate::PeMax => at_most(f.pe().filter(|pe| *pe > 0.0), self.pe_max?),
            Predicate::PeVsBenchmark => {
                let threshold = self.pe_vs_benchmark? * obs.valuation.benchmark.pe;
                let pe = f.pe().filter(|pe| *pe > 0.0);
                match self.strategy {
                    Strategy::Overvalued => at_least(pe, threshold),
                    Strategy::Undervalued | Strategy::Any => at_most(pe, threshold),
                }
            }
            Predicate::RoeMin => at_least(f.roe_pct(), self.roe_min?),
            Predicate::PbMax => at_most(f.pb(), self.pb_max?),
            Predicate::BelowHighMax => at_most(f.pct_from_high(), self.below_high_max?),
            Predicate::AboveLowMax => at_most(f.pct_from_low(), self.above_low_max?),
            Predicate::MarketCap => {
                if self.market_caps.is_empty() {
                    return None;
                }
                obs.bucket.is_some_and(|b| self.market_caps.contains(&b))
            }
            Predicate::NetDebtMax => at_most(f.net_debt_to_market_cap_pct(), self.net_debt_max?),
        };
        Some(passes)
    }

    /// First predicate the candidate fails, or `None` if it passes all.
    #[must_use]
    pub fn first_failure(&self, obs: &Observation<'_>) -> Option<Predicate> {
        PREDICATE_ORDER.into_iter().find(|p| self.check(*p, obs) == Some(false))
    }

    /// Whether the candidate passes every set predicate.
    #[must_use]
    pub fn passes(&self, obs: &Observation<'_>) -> bool {
        self.first_failure(obs).is_none()
    }
}

/// Evaluation order of the predicates.
pub const PREDICATE_ORDER: [Predicate; 13] = [
    Predicate::Strategy,
    Predicate::UpsideMin,
    Predicate::UpsideMax,
    Predicate::PriceMin,
    Predicate::PriceMax,
    Predicate::PeMax,
    Predicate::PeVsBenchmark,
    Predicate::RoeMin,
    Predicate::PbMax,
    Predicate::BelowHighMax,
    Predicate::AboveLowMax,
    Predicate::MarketCap,
    Predicate::NetDebtMax,
];

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use peerval_primitives::{BenchmarkRecord, StaticBenchmark};
    use rstest::rstest;

    use super::*;
    use crate::FairValueEstimator;

    fn fundamentals() -> RawFundamentals {
        RawFundamentals {
            price: Some(100.0),
            trailing_pe: Some(20.0),
            trailing_eps: Some(5.0),
            book_value: Some(50.0),
            market_cap: Some(3e11),
            total_debt: Some(1e10),
            return_on_equity: Some(0.18),
            fifty_two_week_high: Some(105.0),
            fifty_two_week_low: Some(60.0),
            ..Default::default()
        }
    }

    fn valuation(f: &RawFundamentals) -> ValuationResult {
        let tech = Arc::new(BenchmarkRecord::from_static("Technology", StaticBenchmark::new(25.0, 3.5, 15.0, 20.0)));
        FairValueEstimator::new().estimate(f, &tech)
    }

    fn first_failure(criteria: &ScreenCriteria, f: &RawFundamentals) -> Option<Predicate> {
        let v = valuation(f);
        criteria.first_failure(&Observation { fundamentals: f, valuation: &v, bucket: Some(MarketCapBucket::Mid) })
    }

    #[test]
    fn empty_criteria_pass_everything() {
        assert_eq!(first_failure(&ScreenCriteria::default(), &fundamentals()), None);
        assert_eq!(first_failure(&ScreenCriteria::default(), &RawFundamentals::default()), None);
    }

    #[rstest]
    #[case(ScreenCriteria::new(Strategy::Undervalued), None)]
    #[case(ScreenCriteria::new(Strategy::Overvalued), Some(Predicate::Strategy))]
    #[case(ScreenCriteria::default().with_upside_min(15.0), Some(Predicate::UpsideMin))]
    #[case(ScreenCriteria::default().with_upside_min(10.0), None)]
    #[case(ScreenCriteria::default().with_upside_max(10.0), Some(Predicate::UpsideMax))]
    #[case(ScreenCriteria::default().with_price_range(Some(150.0), None), Some(Predicate::PriceMin))]
    #[case(ScreenCriteria::default().with_price_range(None, Some(90.0)), Some(Predicate::PriceMax))]
    #[case(ScreenCriteria::default().with_pe_max(15.0), Some(Predicate::PeMax))]
    #[case(ScreenCriteria::default().with_pe_vs_benchmark(0.7), Some(Predicate::PeVsBenchmark))]
    #[case(ScreenCriteria::default().with_pe_vs_benchmark(0.9), None)]
    #[case(ScreenCriteria::default().with_roe_min(20.0), Some(Predicate::RoeMin))]
    #[case(ScreenCriteria::default().with_pb_max(1.5), Some(Predicate::PbMax))]
    #[case(ScreenCriteria::default().with_below_high_max(5.0), None)]
    #[case(ScreenCriteria::default().with_below_high_max(4.0), Some(Predicate::BelowHighMax))]
    #[case(ScreenCriteria::default().with_above_low_max(50.0), Some(Predicate::AboveLowMax))]
    #[case(ScreenCriteria::default().with_market_caps([MarketCapBucket::Large]), Some(Predicate::MarketCap))]
    #[case(ScreenCriteria::default().with_net_debt_max(1.0), Some(Predicate::NetDebtMax))]
    #[case(ScreenCriteria::default().with_net_debt_max(5.0), None)]
    fn single_predicates(#[case] criteria: ScreenCriteria, #[case] expected: Option<Predicate>) {
        assert_eq!(first_failure(&criteria, &fundamentals()), expected);
    }

    #[test]
    fn overvalued_flips_benchmark_comparison() {
        let criteria = ScreenCriteria::default().with_pe_vs_benchmark(0.7);
        let overvalued = ScreenCriteria { strategy: Strategy::Overvalued, ..criteria.clone() };
        let f = fundamentals();
        let v = valuation(&f);
        let obs = Observation { fundamentals: &f, valuation: &v, bucket: None };

        // PE 20 vs threshold 17.5.
        assert_eq!(criteria.check(Predicate::PeVsBenchmark, &obs), Some(false));
        assert_eq!(overvalued.check(Predicate::PeVsBenchmark, &obs), Some(true));
    }

    #[test]
    fn missing_input_fails() {
        let f = RawFundamentals { return_on_equity: None, market_cap: None, ..fundamentals() };
        assert_eq!(first_failure(&ScreenCriteria::default().with_roe_min(5.0), &f), Some(Predicate::RoeMin));
        assert_eq!(first_failure(&ScreenCriteria::default().with_net_debt_max(30.0), &f), Some(Predicate::NetDebtMax));

        let v = valuation(&f);
        let criteria = ScreenCriteria::default().with_market_caps([MarketCapBucket::Mid]);
        let obs = Observation { fundamentals: &f, valuation: &v, bucket: None };
        assert!(!criteria.passes(&obs));
    }

    #[test]
    fn first_failure_follows_order() {
        let criteria = ScreenCriteria::new(Strategy::Overvalued).with_roe_min(50.0).with_pb_max(0.1);
        assert_eq!(first_failure(&criteria, &fundamentals()), Some(Predicate::Strategy));

        let criteria = ScreenCriteria::default().with_roe_min(50.0).with_pb_max(0.1);
        assert_eq!(first_failure(&criteria, &fundamentals()), Some(Predicate::RoeMin));
    }

    #[rstest]
    #[case(ScreenCriteria::default().with_upside_min(20.0).with_upside_max(10.0))]
    #[case(ScreenCriteria::default().with_price_range(Some(500.0), Some(100.0)))]
    #[case(ScreenCriteria::default().with_pe_vs_benchmark(0.0))]
    #[case(ScreenCriteria::default().with_pb_max(f64::NAN))]
    fn invalid_criteria_rejected(#[case] criteria: ScreenCriteria) {
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn builders_leave_other_fields_unset() {
        let criteria = ScreenCriteria::new(Strategy::Undervalued).with_upside_min(20.0);
        assert!(criteria.validate().is_ok());
        assert_eq!(criteria.upside_max, None);
        assert!(criteria.market_caps.is_empty());
    }
}
