//! Valuation model trait definitions.

use peerval_primitives::{BenchmarkRecord, RawFundamentals, ValuationMethod};

/// One independent fair-value method.
///
/// A model returns `None` whenever its required inputs are missing or
/// implausible; it never substitutes the price or zero for a missing value.
pub trait ValuationModel: Send + Sync + std::fmt::Debug {
    /// The method this model implements.
    fn method(&self) -> ValuationMethod;

    /// Per-share fair value of a security against its peer benchmark.
    fn fair_value(&self, fundamentals: &RawFundamentals, benchmark: &BenchmarkRecord) -> Option<f64>;

    /// Whether the model can run at all on these fundamentals.
    ///
    /// Used for diagnostics; `fair_value` performs its own checks.
    fn applicable(&self, fundamentals: &RawFundamentals, benchmark: &BenchmarkRecord) -> bool {
        self.fair_value(fundamentals, benchmark).is_some()
    }
}

#[cfg(test)]
mod tests {
    use peerval_primitives::StaticBenchmark;

    use super::*;

    #[derive(Debug)]
    struct BookMultiple;

    impl ValuationModel for BookMultiple {
        fn method(&self) -> ValuationMethod {
            ValuationMethod::EarningsMultiple
        }

        fn fair_value(&self, f: &RawFundamentals, b: &BenchmarkRecord) -> Option<f64> {
            f.book_value.filter(|v| *v > 0.0).map(|v| v * b.pb)
        }
    }

    #[test]
    fn applicable_follows_fair_value() {
        let benchmark = BenchmarkRecord::from_static("Default", StaticBenchmark::new(20.0, 2.0, 12.0, 15.0));
        let with_book = RawFundamentals { book_value: Some(10.0), ..Default::default() };
        let model: Box<dyn ValuationModel> = Box::new(BookMultiple);

        assert_eq!(model.fair_value(&with_book, &benchmark), Some(20.0));
        assert!(model.applicable(&with_book, &benchmark));
        assert!(!model.applicable(&RawFundamentals::default(), &benchmark));
    }
}
