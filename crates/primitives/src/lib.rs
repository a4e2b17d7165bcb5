#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod asset;
pub use asset::{Security, Symbol, UNCATEGORIZED};

mod metric;
pub use metric::Metric;

mod fundamentals;
pub use fundamentals::RawFundamentals;

mod peer;
pub use peer::{OTHER_PEER_GROUP, PeerGroup};

mod benchmark;
pub use benchmark::{BenchmarkRecord, MetricOrigin, StaticBenchmark};

mod valuation;
pub use valuation::{MethodEstimate, Recommendation, ValuationMethod, ValuationResult, upside_pct};

mod market_cap;
pub use market_cap::{MarketCapBucket, MarketCapLadder};
