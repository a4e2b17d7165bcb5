//! Market-capitalization buckets.

use serde::{Deserialize, Serialize};

/// Size bucket of a security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCapBucket {
    /// Largest companies.
    Large,
    /// Mid-sized companies.
    Mid,
    /// Small companies.
    Small,
    /// Everything below the small-cap floor.
    Micro,
}

impl MarketCapBucket {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Large => "Large Cap",
            Self::Mid => "Mid Cap",
            Self::Small => "Small Cap",
            Self::Micro => "Micro Cap",
        }
    }
}

impl std::fmt::Display for MarketCapBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed threshold ladder mapping a market cap to a bucket.
///
/// Thresholds are expressed in `unit`s of the reporting currency. The default
/// ladder is in INR crores (1 crore = 10^7).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCapLadder {
    /// Currency amount per threshold unit.
    pub unit: f64,
    /// Large-cap floor, in units.
    pub large: f64,
    /// Mid-cap floor, in units.
    pub mid: f64,
    /// Small-cap floor, in units.
    pub small: f64,
}

impl Default for MarketCapLadder {
    fn default() -> Self {
        Self { unit: 1e7, large: 100_000.0, mid: 25_000.0, small: 5_000.0 }
    }
}

impl MarketCapLadder {
    /// Market cap expressed in ladder units.
    #[must_use]
    pub fn in_units(&self, market_cap: f64) -> f64 {
        market_cap / self.unit
    }

    /// Classify a raw market cap; absent or non-positive caps are unclassified.
    #[must_use]
    pub fn classify(&self, market_cap: Option<f64>) -> Option<MarketCapBucket> {
        let cap = market_cap.filter(|c| c.is_finite() && *c > 0.0)?;
        let units = self.in_units(cap);
        Some(if units >= self.large {
            MarketCapBucket::Large
        } else if units >= self.mid {
            MarketCapBucket::Mid
        } else if units >= self.small {
            MarketCapBucket::Small
        } else {
            MarketCapBucket::Micro
        })
    }
}
