//! Live price overlay from Yahoo Finance.

use std::fmt;

use async_trait::async_trait;
use peerval::{
    primitives::{RawFundamentals, Symbol},
    traits::{FundamentalsSource, SourceError},
};
use time::{Duration, OffsetDateTime};
use yahoo_finance_api as yahoo;

/// Trading history used for the 52-week range.
const LOOKBACK_DAYS: i64 = 365;

/// A source that refreshes price and the 52-week range of another source's
/// snapshots from Yahoo daily quotes.
///
/// Tickers the inner source does not know stay unknown. A failed quote lookup
/// keeps the snapshot values.
pub(crate) struct YahooOverlay<S> {
    inner: S,
    connector: yahoo::YahooConnector,
    suffix: String,
}

impl<S> YahooOverlay<S> {
    /// `suffix` is appended to each ticker for the Yahoo lookup (e.g. `.NS`).
    pub(crate) fn new(inner: S, suffix: impl Into<String>) -> Result<Self, yahoo::YahooError> {
        Ok(Self { inner, connector: yahoo::YahooConnector::new()?, suffix: suffix.into() })
    }

    async fn daily_quotes(&self, symbol: &Symbol) -> Result<Vec<yahoo::Quote>, yahoo::YahooError> {
        let end = OffsetDateTime::now_utc();
        let start = end - Duration::days(LOOKBACK_DAYS);
        let ticker = format!("{}{}", symbol.as_str(), self.suffix);
        self.connector.get_quote_history(&ticker, start, end).await?.quotes()
    }
}

impl<S> fmt::Debug for YahooOverlay<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YahooOverlay").field("suffix", &self.suffix).finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: FundamentalsSource> FundamentalsSource for YahooOverlay<S> {
    async fn fetch(&self, symbol: &Symbol) -> Result<RawFundamentals, SourceError> {
        let mut fundamentals = self.inner.fetch(symbol).await?;
        match self.daily_quotes(symbol).await {
            Ok(quotes) => overlay(&mut fundamentals, quotes.iter().map(|q| (q.close, q.high, q.low))),
            Err(err) => tracing::warn!(%symbol, error = %err, "live quote unavailable, keeping snapshot"),
        }
        Ok(fundamentals)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// Apply daily `(close, high, low)` bars in chronological order: the last
/// close becomes the price, the extremes become the 52-week range. Market cap
/// follows the price when shares outstanding are known.
fn overlay(fundamentals: &mut RawFundamentals, bars: impl IntoIterator<Item = (f64, f64, f64)>) {
    let mut last = None;
    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;

    for (close, h, l) in bars {
        if close.is_finite() && close > 0.0 {
            last = Some(close);
        }
        if h.is_finite() && h > 0.0 {
            high = high.max(h);
        }
        if l.is_finite() && l > 0.0 {
            low = low.min(l);
        }
    }

    if let Some(price) = last {
        fundamentals.price = Some(price);
        if let Some(shares) = fundamentals.shares_outstanding.filter(|s| *s > 0.0) {
            fundamentals.market_cap = Some(price * shares);
        }
    }
    if high.is_finite() {
        fundamentals.fifty_two_week_high = Some(high);
    }
    if low.is_finite() {
        fundamentals.fifty_two_week_low = Some(low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_close_and_extremes() {
        let mut f = RawFundamentals {
            price: Some(90.0),
            shares_outstanding: Some(1_000.0),
            fifty_two_week_high: Some(200.0),
            ..RawFundamentals::default()
        };
        overlay(&mut f, [(100.0, 104.0, 98.0), (110.0, 120.0, 95.0), (105.0, 111.0, f64::NAN)]);

        assert_eq!(f.price, Some(105.0));
        assert_eq!(f.market_cap, Some(105_000.0));
        assert_eq!(f.fifty_two_week_high, Some(120.0));
        assert_eq!(f.fifty_two_week_low, Some(95.0));
    }

    #[test]
    fn no_bars_keeps_snapshot() {
        let mut f = RawFundamentals { price: Some(90.0), ..RawFundamentals::default() };
        let before = f.clone();
        overlay(&mut f, []);
        assert_eq!(f, before);
    }
}
