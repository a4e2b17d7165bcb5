//! Error types for the valuation engine.

use peerval_math::MathError;
use peerval_peers::PeerError;

/// Errors that can occur while configuring or running the engine.
///
/// Data problems during a screening pass never surface here; they are
/// counted in the pass summary instead.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Peer-group configuration error.
    #[error("peer configuration error: {0}")]
    Peer(#[from] PeerError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Peer group not declared in the registry.
    #[error("unknown peer group: {0}")]
    UnknownPeerGroup(String),

    /// No preset with that name.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

impl ModelError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownPeerGroup(_) | Self::UnknownPreset(_))
    }
}
