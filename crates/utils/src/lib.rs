#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cache;
pub use cache::TtlCache;

mod retry;
pub use retry::RetryPolicy;

mod fetch;
pub use fetch::{CACHE_PURGE_INTERVAL, FetchConfig, ResilientSource};

mod memory;
pub use memory::InMemorySource;
