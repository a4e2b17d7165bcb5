#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod sanitize;
pub use sanitize::{sanitize, sanitize_all};

mod outliers;
pub use outliers::{
    DEFAULT_FENCE, IqrFilter, MIN_FILTER_LEN, iqr_bounds, iqr_filter, quantile_linear,
};

mod stats;
pub use stats::{blend, checked_div, mean, validate_weight};

mod error;
pub use error::MathError;
