//! Fair-value estimates.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::BenchmarkRecord;

/// Independent fair-value estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    /// EPS times a blended target P/E.
    EarningsMultiple,
    /// EBITDA times a blended target EV/EBITDA, less net debt, per share.
    EnterpriseValue,
}

impl std::fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EarningsMultiple => write!(f, "earnings_multiple"),
            Self::EnterpriseValue => write!(f, "enterprise_value"),
        }
    }
}

/// Output of one valuation method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodEstimate {
    /// Per-share fair value.
    pub fair_value: f64,
    /// Upside versus price in percent; absent without a positive price.
    pub upside_pct: Option<f64>,
}

/// Percentage upside of `fair_value` over `price`.
///
/// Absent when the price is not strictly positive or the result is not finite.
#[must_use]
pub fn upside_pct(fair_value: f64, price: f64) -> Option<f64> {
    if price <= 0.0 || !price.is_finite() {
        return None;
    }
    let upside = (fair_value - price) / price * 100.0;
    upside.is_finite().then_some(upside)
}

/// Fair value of one security against its peer benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Every attempted method; `None` when the method's inputs were unusable.
    pub methods: BTreeMap<ValuationMethod, Option<MethodEstimate>>,
    /// Mean of the methods that produced a value.
    pub blended_fair_value: Option<f64>,
    /// Upside of the blended fair value in percent.
    pub upside_pct: Option<f64>,
    /// Benchmark the estimate was computed against.
    pub benchmark: Arc<BenchmarkRecord>,
}

impl ValuationResult {
    /// Fair value produced by a method, if any.
    #[must_use]
    pub fn fair_value(&self, method: ValuationMethod) -> Option<f64> {
        self.methods.get(&method).copied().flatten().map(|e| e.fair_value)
    }

    /// Upside produced by a method, if any.
    #[must_use]
    pub fn method_upside(&self, method: ValuationMethod) -> Option<f64> {
        self.methods.get(&method).copied().flatten().and_then(|e| e.upside_pct)
    }

    /// Number of methods that produced a value.
    #[must_use]
    pub fn valid_methods(&self) -> usize {
        self.methods.values().filter(|e| e.is_some()).count()
    }

    /// Whether any method produced a value.
    #[must_use]
    pub const fn is_valued(&self) -> bool {
        self.blended_fair_value.is_some()
    }
}

/// Coarse call derived from the blended upside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Upside above 25%.
    StrongBuy,
    /// Upside above 15%.
    Buy,
    /// Upside above zero.
    Hold,
    /// Downside within 10%.
    WeakHold,
    /// Everything else.
    Avoid,
}

impl Recommendation {
    /// Classify an upside percentage.
    #[must_use]
    pub fn from_upside(upside_pct: f64) -> Self {
        if upside_pct > 25.0 {
            Self::StrongBuy
        } else if upside_pct > 15.0 {
            Self::Buy
        } else if upside_pct > 0.0 {
            Self::Hold
        } else if upside_pct > -10.0 {
            Self::WeakHold
        } else {
            Self::Avoid
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::WeakHold => "Weak Hold",
            Self::Avoid => "Avoid",
        }
    }
}
