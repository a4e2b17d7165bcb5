#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/peerval/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use peerval_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use peerval_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use peerval_math as math;
#[cfg(feature = "peers")]
#[doc(inline)]
pub use peerval_peers as peers;
#[cfg(feature = "model")]
#[doc(inline)]
pub use peerval_model as model;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use peerval_utils as utils;
