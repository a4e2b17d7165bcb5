//! Fixed-map fundamentals source.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use peerval_primitives::{RawFundamentals, Symbol};
use peerval_traits::{FundamentalsSource, SourceError};

/// A source answering from a fixed map.
///
/// Unknown tickers yield [`SourceError::NotFound`]. Every call is counted,
/// and an optional latency is simulated with `tokio::time::sleep`.
#[derive(Debug, Default)]
pub struct InMemorySource {
    entries: HashMap<Symbol, Result<RawFundamentals, SourceError>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add or replace a ticker's fundamentals.
    pub fn insert(&mut self, symbol: impl Into<Symbol>, fundamentals: RawFundamentals) {
        self.entries.insert(symbol.into(), Ok(fundamentals));
    }

    /// Make a ticker always fail with `error`.
    pub fn insert_error(&mut self, symbol: impl Into<Symbol>, error: SourceError) {
        self.entries.insert(symbol.into(), Err(error));
    }

    /// Check if `symbol` has an entry, failing or not.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of tickers held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no ticker is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Symbol, RawFundamentals)> for InMemorySource {
    fn from_iter<I: IntoIterator<Item = (Symbol, RawFundamentals)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(s, f)| (s, Ok(f))).collect();
        Self { entries, ..Self::default() }
    }
}

#[async_trait]
impl FundamentalsSource for InMemorySource {
    async fn fetch(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.entries.get(symbol).cloned().unwrap_or_else(|| Err(SourceError::NotFound(symbol.clone())))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_from_map() {
        let mut source = InMemorySource::new();
        source.insert("TCS.NS", RawFundamentals { price: Some(3500.0), ..Default::default() });
        source.insert_error("BAD.NS", SourceError::RateLimited);

        let tcs = source.fetch(&Symbol::new("TCS.NS")).await.unwrap();
        assert_eq!(tcs.price, Some(3500.0));
        assert_eq!(source.fetch(&Symbol::new("BAD.NS")).await, Err(SourceError::RateLimited));
        assert_eq!(
            source.fetch(&Symbol::new("NOPE")).await,
            Err(SourceError::NotFound(Symbol::new("NOPE")))
        );
        assert_eq!(source.calls(), 3);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn collects_from_pairs() {
        let source: InMemorySource =
            [(Symbol::new("A"), RawFundamentals::default())].into_iter().collect();
        assert_eq!(source.len(), 1);
        assert_eq!(source.calls(), 0);
    }
}
