//! Fair-value estimation against a peer benchmark.

use std::{collections::BTreeMap, sync::Arc};

use ndarray::Array1;
use peerval_math::{blend, checked_div, mean, validate_weight};
use peerval_primitives::{
    BenchmarkRecord, MethodEstimate, RawFundamentals, ValuationMethod, ValuationResult, upside_pct,
};
use peerval_traits::ValuationModel;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Blend weights and ceilings for the built-in valuation models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Weight of the benchmark P/E in the target multiple.
    pub pe_benchmark_weight: f64,
    /// Discount applied to the security's own P/E.
    pub pe_self_discount: f64,
    /// Weight of the benchmark EV/EBITDA in the target multiple.
    pub ev_benchmark_weight: f64,
    /// Discount applied to the security's own EV/EBITDA.
    pub ev_self_discount: f64,
    /// Own EV/EBITDA at or above which the enterprise-value method is skipped.
    pub max_ev_ebitda: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            pe_benchmark_weight: 0.7,
            pe_self_discount: 0.85,
            ev_benchmark_weight: 0.7,
            ev_self_discount: 0.85,
            max_ev_ebitda: 100.0,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

impl EstimatorConfig {
    /// Check the configuration.
    ///
    /// # Errors
    /// Returns `ModelError` for a weight outside `[0, 1]` or a non-positive
    /// discount or ceiling.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_weight(self.pe_benchmark_weight)?;
        validate_weight(self.ev_benchmark_weight)?;
        positive("pe_self_discount", self.pe_self_discount)?;
        positive("ev_self_discount", self.ev_self_discount)?;
        positive("max_ev_ebitda", self.max_ev_ebitda)?;
        Ok(())
    }
}

/// Earnings-multiple model: EPS times a blended target P/E.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarningsMultipleModel {
    weight: f64,
    discount: f64,
}

impl EarningsMultipleModel {
    /// Create the model from a benchmark weight and own-multiple discount.
    #[must_use]
    pub const fn new(weight: f64, discount: f64) -> Self {
        Self { weight, discount }
    }
}

impl Default for EarningsMultipleModel {
    fn default() -> Self {
        let config = EstimatorConfig::default();
        Self::new(config.pe_benchmark_weight, config.pe_self_discount)
    }
}

impl ValuationModel for EarningsMultipleModel {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::EarningsMultiple
    }

    fn fair_value(&self, fundamentals: &RawFundamentals, benchmark: &BenchmarkRecord) -> Option<f64> {
        fundamentals.positive_price()?;
        let pe = fundamentals.trailing_pe.filter(|pe| pe.is_finite() && *pe > 0.0)?;
        let eps = fundamentals.trailing_eps.filter(|eps| eps.is_finite() && *eps > 0.0)?;

        let target = blend(benchmark.pe, pe, self.weight, self.discount);
        Some(eps * target).filter(|v| v.is_finite())
    }
}

/// Enterprise-value model: EBITDA times a blended target EV/EBITDA, less net
/// debt, per share.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnterpriseValueModel {
    weight: f64,
    discount: f64,
    max_ev_ebitda: f64,
}

impl EnterpriseValueModel {
    /// Create the model from a benchmark weight, own-multiple discount and
    /// the EV/EBITDA ceiling.
    #[must_use]
    pub const fn new(weight: f64, discount: f64, max_ev_ebitda: f64) -> Self {
        Self { weight, discount, max_ev_ebitda }
    }
}

impl Default for EnterpriseValueModel {
    fn default() -> Self {
        let config = EstimatorConfig::default();
        Self::new(config.ev_benchmark_weight, config.ev_self_discount, config.max_ev_ebitda)
    }
}

impl ValuationModel for EnterpriseValueModel {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::EnterpriseValue
    }

    fn fair_value(&self, fundamentals: &RawFundamentals, benchmark: &BenchmarkRecord) -> Option<f64> {
        let ev = fundamentals.enterprise_value.filter(|ev| *ev > 0.0)?;
        let ebitda = fundamentals.ebitda.filter(|e| *e > 0.0)?;
        let own = checked_div(ev, ebitda).filter(|r| *r > 0.0 && *r < self.max_ev_ebitda)?;
        let shares = fundamentals.shares_outstanding.filter(|s| *s > 0.0)?;

        let target = blend(benchmark.ev_ebitda, own, self.weight, self.discount);
        let equity = ebitda * target - fundamentals.net_debt();
        // Negative equity is kept, not clamped.
        checked_div(equity, shares)
    }
}

/// Runs every configured valuation model and blends their results.
#[derive(Debug)]
pub struct FairValueEstimator {
    config: EstimatorConfig,
    models: Vec<Box<dyn ValuationModel>>,
}

impl FairValueEstimator {
    /// Create an estimator with both built-in models and default weights.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(EstimatorConfig::default())
    }

    /// Create an estimator with both built-in models and custom weights.
    ///
    /// # Errors
    /// Returns `ModelError` if the configuration is invalid.
    pub fn with_config(config: EstimatorConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: EstimatorConfig) -> Self {
        let models: Vec<Box<dyn ValuationModel>> = vec![
            Box::new(EarningsMultipleModel::new(config.pe_benchmark_weight, config.pe_self_discount)),
            Box::new(EnterpriseValueModel::new(
                config.ev_benchmark_weight,
                config.ev_self_discount,
                config.max_ev_ebitda,
            )),
        ];
        Self { config, models }
    }

    /// Replace the model set.
    ///
    /// A later model with the same method overwrites an earlier one's entry.
    #[must_use]
    pub fn with_models(mut self, models: Vec<Box<dyn ValuationModel>>) -> Self {
        self.models = models;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Methods this estimator runs, in order.
    pub fn methods(&self) -> impl Iterator<Item = ValuationMethod> + '_ {
        self.models.iter().map(|m| m.method())
    }

    /// Value one security against a benchmark.
    ///
    /// The blended fair value is the mean of the methods that produced a
    /// value; it is absent when none did. Upsides need a positive price.
    #[must_use]
    pub fn estimate(&self, fundamentals: &RawFundamentals, benchmark: &Arc<BenchmarkRecord>) -> ValuationResult {
        let price = fundamentals.positive_price();
        let mut methods = BTreeMap::new();

        for model in &self.models {
            let estimate = model.fair_value(fundamentals, benchmark).map(|fair_value| MethodEstimate {
                fair_value,
                upside_pct: price.and_then(|p| upside_pct(fair_value, p)),
            });
            methods.insert(model.method(), estimate);
        }

        let valid: Array1<f64> = methods.values().flatten().map(|e| e.fair_value).collect();
        let blended_fair_value = mean(&valid);
        let upside = blended_fair_value.zip(price).and_then(|(fv, p)| upside_pct(fv, p));

        ValuationResult { methods, blended_fair_value, upside_pct: upside, benchmark: Arc::clone(benchmark) }
    }
}

impl Default for FairValueEstimator {
    fn default() -> Self {
        Self::new()
    }
}
