#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod source;
pub use source::{FundamentalsSource, SourceError};

mod model;
pub use model::ValuationModel;

/// Re-exported so implementors do not need a direct dependency.
pub use async_trait::async_trait;
