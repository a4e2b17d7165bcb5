//! Interquartile-range outlier removal.

use ndarray::Array1;

use crate::MathError;

/// Tukey fence multiplier applied to the IQR.
pub const DEFAULT_FENCE: f64 = 1.5;

/// Samples needed before filtering is attempted.
pub const MIN_FILTER_LEN: usize = 4;

/// Quantile of pre-sorted data using linear interpolation.
///
/// The quantile sits at position `(n - 1) * q` of the sorted values,
/// interpolating between the neighbouring order statistics.
///
/// # Errors
/// Returns `MathError::InvalidQuantile` if `q` is outside `[0, 1]` and
/// `MathError::EmptyData` for an empty slice.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Result<f64, MathError> {
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidQuantile(q));
    }
    if sorted.is_empty() {
        return Err(MathError::EmptyData);
    }

    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Inclusive `[Q1 - fence * IQR, Q3 + fence * IQR]` bounds of the finite values.
///
/// # Errors
/// Returns `MathError::InvalidFence` for a negative or non-finite fence and
/// `MathError::EmptyData` when no finite value exists.
pub fn iqr_bounds(data: &Array1<f64>, fence: f64) -> Result<(f64, f64), MathError> {
    if !fence.is_finite() || fence < 0.0 {
        return Err(MathError::InvalidFence(fence));
    }

    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_linear(&sorted, 0.25)?;
    let q3 = quantile_linear(&sorted, 0.75)?;
    let iqr = q3 - q1;

    Ok((q1 - fence * iqr, q3 + fence * iqr))
}

/// Remove IQR outliers from a sample, preserving input order.
///
/// Samples shorter than [`MIN_FILTER_LEN`] are returned unchanged, as is the
/// original sample if filtering would leave nothing.
///
/// # Errors
/// Returns `MathError::InvalidFence` for a negative or non-finite fence.
pub fn iqr_filter(data: &Array1<f64>, fence: f64) -> Result<Array1<f64>, MathError> {
    IqrFilter::new(fence)?.apply(data)
}

/// IQR outlier filter configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFilter {
    fence: f64,
    min_len: usize,
}

impl IqrFilter {
    /// Create a filter with the given fence multiplier.
    ///
    /// # Errors
    /// Returns `MathError::InvalidFence` if the fence is negative or not finite.
    pub fn new(fence: f64) -> Result<Self, MathError> {
        if !fence.is_finite() || fence < 0.0 {
            return Err(MathError::InvalidFence(fence));
        }
        Ok(Self { fence, min_len: MIN_FILTER_LEN })
    }

    /// Override the minimum sample length needed to filter.
    #[must_use]
    pub const fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Get the fence multiplier.
    #[must_use]
    pub const fn fence(&self) -> f64 {
        self.fence
    }

    /// Get the minimum sample length.
    #[must_use]
    pub const fn min_len(&self) -> usize {
        self.min_len
    }

    /// Apply the filter.
    ///
    /// # Errors
    /// Propagates bound computation errors other than empty data.
    pub fn apply(&self, data: &Array1<f64>) -> Result<Array1<f64>, MathError> {
        if data.len() < self.min_len.max(1) {
            return Ok(data.clone());
        }

        let (lower, upper) = match iqr_bounds(data, self.fence) {
            Ok(bounds) => bounds,
            Err(MathError::EmptyData) => return Ok(data.clone()),
            Err(e) => return Err(e),
        };

        let kept: Array1<f64> = data.iter().copied().filter(|x| *x >= lower && *x <= upper).collect();

        if kept.is_empty() { Ok(data.clone()) } else { Ok(kept) }
    }
}

impl Default for IqrFilter {
    fn default() -> Self {
        Self { fence: DEFAULT_FENCE, min_len: MIN_FILTER_LEN }
    }
}
