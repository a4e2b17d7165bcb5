//! Plausible-range validation for raw ratios.

use ndarray::Array1;
use peerval_primitives::Metric;

/// Validate one raw ratio against its metric's plausible range.
///
/// Returns the value unchanged when it lies strictly inside the open range,
/// otherwise `None`. Absent, zero and non-finite inputs are always rejected.
#[must_use]
pub fn sanitize(metric: Metric, value: Option<f64>) -> Option<f64> {
    let value = value?;
    if !value.is_finite() || value == 0.0 {
        return None;
    }
    let (lower, upper) = metric.plausible_range();
    (value > lower && value < upper).then_some(value)
}

/// Sanitize a batch of raw values, keeping survivors in input order.
pub fn sanitize_all<I>(metric: Metric, values: I) -> Array1<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().filter_map(|v| sanitize(metric, v)).collect()
}
