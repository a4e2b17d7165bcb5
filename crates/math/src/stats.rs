//! Small numeric helpers that never leak NaN or infinity.

use ndarray::Array1;

use crate::MathError;

/// Arithmetic mean of the sample, `None` when empty or non-finite.
#[must_use]
pub fn mean(data: &Array1<f64>) -> Option<f64> {
    data.mean().filter(|m| m.is_finite())
}

/// Divide, returning `None` for a zero or non-finite divisor or result.
#[must_use]
pub fn checked_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Blend an anchor multiple with an own multiple after a discount.
///
/// `target = anchor * weight + own * discount * (1 - weight)`; a weight of 1
/// ignores the security's own multiple entirely.
#[must_use]
pub fn blend(anchor: f64, own: f64, weight: f64, discount: f64) -> f64 {
    anchor * weight + own * discount * (1.0 - weight)
}

/// Check that a blend weight lies in `[0, 1]`.
///
/// # Errors
/// Returns `MathError::InvalidWeight` otherwise.
pub fn validate_weight(weight: f64) -> Result<f64, MathError> {
    if (0.0..=1.0).contains(&weight) { Ok(weight) } else { Err(MathError::InvalidWeight(weight)) }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    #[test]
    fn mean_of_sample() {
        assert_relative_eq!(mean(&array![1.0, 2.0, 3.0, 6.0]).unwrap(), 3.0);
        assert_eq!(mean(&Array1::<f64>::zeros(0)), None);
    }

    #[test]
    fn checked_div_guards() {
        assert_eq!(checked_div(10.0, 4.0), Some(2.5));
        assert_eq!(checked_div(10.0, 0.0), None);
        assert_eq!(checked_div(10.0, f64::NAN), None);
        assert_eq!(checked_div(f64::INFINITY, 2.0), None);
    }

    #[test]
    fn blend_pulls_toward_anchor() {
        assert_relative_eq!(blend(25.0, 20.0, 0.7, 0.85), 22.6, epsilon = 1e-12);
        assert_relative_eq!(blend(12.0, 40.0, 1.0, 0.9), 12.0);
        assert_relative_eq!(blend(12.0, 40.0, 0.0, 0.9), 36.0);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.7, true)]
    #[case(1.0, true)]
    #[case(-0.01, false)]
    #[case(1.5, false)]
    #[case(f64::NAN, false)]
    fn weight_validation(#[case] weight: f64, #[case] ok: bool) {
        assert_eq!(validate_weight(weight).is_ok(), ok);
    }
}
