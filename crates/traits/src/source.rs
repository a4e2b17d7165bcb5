//! External fundamentals source.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use peerval_primitives::{RawFundamentals, Symbol};

/// Errors a fundamentals source can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source has no data for the ticker.
    #[error("no data for {0}")]
    NotFound(Symbol),

    /// The source returned too few fields to be useful.
    #[error("insufficient fields for {symbol}: got {fields}")]
    InsufficientFields {
        /// Ticker requested.
        symbol: Symbol,
        /// Number of populated fields.
        fields: usize,
    },

    /// The source throttled the request.
    #[error("rate limited")]
    RateLimited,

    /// The call exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Transport or decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl SourceError {
    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout(_) | Self::Transport(_))
    }
}

/// A provider of per-security fundamentals.
///
/// Implementations must be safe to call concurrently. Callers treat every
/// error as "skip this ticker"; no error is fatal to a screening pass.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Fetch a fundamentals snapshot for one ticker.
    async fn fetch(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "source"
    }
}

#[async_trait]
impl<S: FundamentalsSource + ?Sized> FundamentalsSource for Arc<S> {
    async fn fetch(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError> {
        (**self).fetch(symbol).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
