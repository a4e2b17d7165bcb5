//! Per-security fundamentals snapshot.

use serde::{Deserialize, Serialize};

use crate::Metric;

/// Divide, returning `None` for a zero or non-finite divisor or result.
fn checked_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Raw fundamentals for one security as returned by a data source.
///
/// Every field is optional: vendors routinely omit fields, and a missing
/// field must never be confused with zero. Monetary fields share the
/// currency of `price`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFundamentals {
    /// Last traded price.
    pub price: Option<f64>,
    /// Trailing twelve-month price/earnings.
    pub trailing_pe: Option<f64>,
    /// Forward price/earnings.
    pub forward_pe: Option<f64>,
    /// Trailing twelve-month earnings per share.
    pub trailing_eps: Option<f64>,
    /// Enterprise value.
    pub enterprise_value: Option<f64>,
    /// Trailing EBITDA.
    pub ebitda: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
    /// Book value per share.
    pub book_value: Option<f64>,
    /// Total debt.
    pub total_debt: Option<f64>,
    /// Total cash and equivalents.
    pub total_cash: Option<f64>,
    /// Total revenue.
    pub total_revenue: Option<f64>,
    /// Return on equity as a fraction (0.15 = 15%).
    pub return_on_equity: Option<f64>,
    /// Net profit margin as a fraction.
    pub profit_margin: Option<f64>,
    /// 52-week high price.
    pub fifty_two_week_high: Option<f64>,
    /// 52-week low price.
    pub fifty_two_week_low: Option<f64>,
    /// Dividend yield as a fraction.
    pub dividend_yield: Option<f64>,
    /// Beta against the local market index.
    pub beta: Option<f64>,
}

impl RawFundamentals {
    /// Price, if strictly positive.
    #[must_use]
    pub fn positive_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Trailing P/E as reported.
    #[must_use]
    pub const fn pe(&self) -> Option<f64> {
        self.trailing_pe
    }

    /// Price to book value.
    #[must_use]
    pub fn pb(&self) -> Option<f64> {
        let book = self.book_value.filter(|b| *b > 0.0)?;
        checked_ratio(self.price?, book)
    }

    /// Enterprise value to EBITDA (EBITDA must be positive).
    #[must_use]
    pub fn ev_ebitda(&self) -> Option<f64> {
        let ebitda = self.ebitda.filter(|e| *e > 0.0)?;
        checked_ratio(self.enterprise_value?, ebitda)
    }

    /// Return on equity in percent.
    #[must_use]
    pub fn roe_pct(&self) -> Option<f64> {
        self.return_on_equity.filter(|r| r.is_finite()).map(|r| r * 100.0)
    }

    /// Raw value of a benchmarked metric, before sanitization.
    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pe => self.pe(),
            Metric::Pb => self.pb(),
            Metric::EvEbitda => self.ev_ebitda(),
            Metric::Roe => self.roe_pct(),
        }
    }

    /// Profit margin in percent.
    #[must_use]
    pub fn profit_margin_pct(&self) -> Option<f64> {
        self.profit_margin.filter(|m| m.is_finite()).map(|m| m * 100.0)
    }

    /// Price to sales (market cap over revenue).
    #[must_use]
    pub fn ps(&self) -> Option<f64> {
        let revenue = self.total_revenue.filter(|r| *r > 0.0)?;
        checked_ratio(self.market_cap?, revenue)
    }

    /// Total debt minus total cash; missing components count as zero.
    #[must_use]
    pub fn net_debt(&self) -> f64 {
        self.total_debt.unwrap_or(0.0) - self.total_cash.unwrap_or(0.0)
    }

    /// Absolute net debt as a percentage of market capitalization.
    #[must_use]
    pub fn net_debt_to_market_cap_pct(&self) -> Option<f64> {
        let mcap = self.market_cap.filter(|m| *m > 0.0)?;
        checked_ratio(self.net_debt().abs(), mcap).map(|r| r * 100.0)
    }

    fn valid_52w_range(&self) -> Option<(f64, f64)> {
        let high = self.fifty_two_week_high?;
        let low = self.fifty_two_week_low?;
        (low > 0.0 && high > low).then_some((high, low))
    }

    /// Percentage below the 52-week high, `(high - price) / high * 100`.
    #[must_use]
    pub fn pct_from_high(&self) -> Option<f64> {
        let (high, _) = self.valid_52w_range()?;
        let price = self.positive_price()?;
        checked_ratio(high - price, high).map(|r| r * 100.0)
    }

    /// Percentage above the 52-week low, `(price - low) / low * 100`.
    #[must_use]
    pub fn pct_from_low(&self) -> Option<f64> {
        let (_, low) = self.valid_52w_range()?;
        let price = self.positive_price()?;
        checked_ratio(price - low, low).map(|r| r * 100.0)
    }
}
