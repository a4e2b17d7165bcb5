//! Peer-group benchmark records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Metric;

/// Static default multiples for a peer group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticBenchmark {
    /// Price to earnings.
    pub pe: f64,
    /// Price to book.
    pub pb: f64,
    /// Enterprise value to EBITDA.
    pub ev_ebitda: f64,
    /// Return on equity, in percent.
    pub roe: f64,
}

impl StaticBenchmark {
    /// Create a static benchmark.
    #[must_use]
    pub const fn new(pe: f64, pb: f64, ev_ebitda: f64, roe: f64) -> Self {
        Self { pe, pb, ev_ebitda, roe }
    }

    /// Value for a single metric.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Pe => self.pe,
            Metric::Pb => self.pb,
            Metric::EvEbitda => self.ev_ebitda,
            Metric::Roe => self.roe,
        }
    }
}

/// How a benchmark metric was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricOrigin {
    /// Mean of live peer samples.
    Sampled {
        /// Sanitized samples collected.
        samples: usize,
        /// Samples left after outlier removal.
        retained: usize,
    },
    /// Static default table.
    Default,
}

impl MetricOrigin {
    /// Whether the value came from live samples.
    #[must_use]
    pub const fn is_sampled(&self) -> bool {
        matches!(self, Self::Sampled { .. })
    }
}

/// Representative multiples for one peer group.
///
/// Records are immutable once built; a refreshed benchmark replaces the
/// previous record rather than updating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Peer group the record describes.
    pub peer_group: String,
    /// Price to earnings.
    pub pe: f64,
    /// Price to book.
    pub pb: f64,
    /// Enterprise value to EBITDA.
    pub ev_ebitda: f64,
    /// Return on equity, in percent.
    pub roe: f64,
    /// Origin of each metric.
    pub origins: BTreeMap<Metric, MetricOrigin>,
    /// When the record was produced.
    pub computed_at: DateTime<Utc>,
}

impl BenchmarkRecord {
    /// Build a record entirely from static defaults.
    #[must_use]
    pub fn from_static(peer_group: impl Into<String>, defaults: StaticBenchmark) -> Self {
        Self {
            peer_group: peer_group.into(),
            pe: defaults.pe,
            pb: defaults.pb,
            ev_ebitda: defaults.ev_ebitda,
            roe: defaults.roe,
            origins: Metric::ALL.into_iter().map(|m| (m, MetricOrigin::Default)).collect(),
            computed_at: Utc::now(),
        }
    }

    /// Value for a single metric.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Pe => self.pe,
            Metric::Pb => self.pb,
            Metric::EvEbitda => self.ev_ebitda,
            Metric::Roe => self.roe,
        }
    }

    /// Origin of a single metric.
    #[must_use]
    pub fn origin(&self, metric: Metric) -> MetricOrigin {
        self.origins.get(&metric).copied().unwrap_or(MetricOrigin::Default)
    }

    /// Whether every metric fell back to the static defaults.
    #[must_use]
    pub fn is_fully_static(&self) -> bool {
        Metric::ALL.into_iter().all(|m| !self.origin(m).is_sampled())
    }

    /// The multiples without provenance.
    #[must_use]
    pub const fn multiples(&self) -> StaticBenchmark {
        StaticBenchmark::new(self.pe, self.pb, self.ev_ebitda, self.roe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_static_is_fully_static() {
        let record = BenchmarkRecord::from_static("Technology", StaticBenchmark::new(25.0, 3.5, 15.0, 20.0));
        assert_eq!(record.peer_group, "Technology");
        assert_eq!(record.get(Metric::Pe), 25.0);
        assert_eq!(record.get(Metric::EvEbitda), 15.0);
        assert!(record.is_fully_static());
        assert_eq!(record.multiples(), StaticBenchmark::new(25.0, 3.5, 15.0, 20.0));
    }

    #[test]
    fn sampled_origin_breaks_static() {
        let mut record = BenchmarkRecord::from_static("Textiles", StaticBenchmark::new(20.0, 1.5, 12.0, 15.0));
        record.origins.insert(Metric::Pb, MetricOrigin::Sampled { samples: 9, retained: 8 });
        assert!(!record.is_fully_static());
        assert!(record.origin(Metric::Pb).is_sampled());
        assert!(!record.origin(Metric::Pe).is_sampled());
    }
}
