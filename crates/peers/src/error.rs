//! Error types for peer-group configuration.

use peerval_primitives::{Metric, Symbol};

/// Errors that can occur while building peer-group configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PeerError {
    /// A category was declared under two peer groups.
    #[error("category {category:?} declared in both {first:?} and {second:?}")]
    DuplicateCategory {
        /// Category name.
        category: String,
        /// First peer group declaring it.
        first: String,
        /// Second peer group declaring it.
        second: String,
    },

    /// A security was listed twice.
    #[error("duplicate listing: {0}")]
    DuplicateSecurity(Symbol),

    /// A static default lies outside its metric's plausible range.
    #[error("default {metric} for {peer_group:?} out of range: {value}")]
    InvalidDefault {
        /// Peer group name.
        peer_group: String,
        /// Offending metric.
        metric: Metric,
        /// Offending value.
        value: f64,
    },
}
