//! Benchmarked valuation metrics.

use serde::{Deserialize, Serialize};

/// A valuation or profitability multiple that is benchmarked per peer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Trailing price to earnings.
    Pe,
    /// Price to book value.
    Pb,
    /// Enterprise value to EBITDA.
    EvEbitda,
    /// Return on equity, in percent.
    Roe,
}

impl Metric {
    /// Every benchmarked metric, in record order.
    pub const ALL: [Self; 4] = [Self::Pe, Self::Pb, Self::EvEbitda, Self::Roe];

    /// Open interval `(lower, upper)` of plausible values.
    ///
    /// Values on or outside the bounds are treated as bad data.
    #[must_use]
    pub const fn plausible_range(self) -> (f64, f64) {
        match self {
            Self::Pe => (0.0, 200.0),
            Self::Pb => (0.0, 20.0),
            Self::EvEbitda => (0.0, 100.0),
            Self::Roe => (-50.0, 100.0),
        }
    }

    /// Short column-style name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pe => "pe",
            Self::Pb => "pb",
            Self::EvEbitda => "ev_ebitda",
            Self::Roe => "roe",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
