//! Error types for statistical operations.

/// Errors that can occur when configuring statistical operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    /// Invalid IQR fence multiplier.
    #[error("invalid IQR fence: {0} (must be finite and non-negative)")]
    InvalidFence(f64),

    /// Invalid quantile.
    #[error("invalid quantile: {0} (must be in [0, 1])")]
    InvalidQuantile(f64),

    /// Invalid blend weight.
    #[error("invalid blend weight: {0} (must be in [0, 1])")]
    InvalidWeight(f64),

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MathError::InvalidFence(-1.5);
        assert!(err.to_string().contains("-1.5"));

        let err = MathError::InvalidWeight(1.2);
        assert!(err.to_string().contains("1.2"));
    }
}
