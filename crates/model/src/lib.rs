#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod benchmark;
pub use benchmark::{
    BenchmarkAggregator, BenchmarkCache, BenchmarkConfig, DEFAULT_BENCHMARK_TTL, aggregate,
    aggregate_metric, subsample,
};

mod valuation;
pub use valuation::{EarningsMultipleModel, EnterpriseValueModel, EstimatorConfig, FairValueEstimator};

mod criteria;
pub use criteria::{Observation, PREDICATE_ORDER, Predicate, ScreenCriteria, Strategy};

mod presets;
pub use presets::{LOW_DEBT_PCT, NEAR_HIGH_PCT, NEAR_LOW_PCT, Preset, preset, presets};

mod screener;
pub use screener::{ScreenConfig, ScreenReport, ScreenRow, ScreenSummary, Screener};

mod report;

mod error;
pub use error::ModelError;

pub use tokio_util::sync::CancellationToken;

/// Re-export commonly used types.
pub mod prelude {
    pub use peerval_traits::{FundamentalsSource, ValuationModel};

    pub use super::{
        BenchmarkAggregator, BenchmarkConfig, CancellationToken, EstimatorConfig, FairValueEstimator,
        ModelError, ScreenConfig, ScreenCriteria, ScreenReport, Screener, Strategy,
    };
}
