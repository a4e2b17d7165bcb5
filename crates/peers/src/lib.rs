#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod taxonomy;
pub use taxonomy::Taxonomy;

mod defaults;
pub use defaults::{DefaultTable, GLOBAL_DEFAULT};

mod registry;
pub use registry::PeerGroupRegistry;

mod error;
pub use error::PeerError;
