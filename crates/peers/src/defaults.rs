//! Static default benchmarks.

use std::collections::BTreeMap;

use peerval_primitives::{Metric, StaticBenchmark};
use serde::{Deserialize, Serialize};

use crate::PeerError;

/// Name of the global fallback row.
pub const GLOBAL_DEFAULT: &str = "Default";

/// Static benchmark table with a global fallback row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultTable {
    global: StaticBenchmark,
    groups: BTreeMap<String, StaticBenchmark>,
}

fn validate(peer_group: &str, row: StaticBenchmark) -> Result<StaticBenchmark, PeerError> {
    for metric in Metric::ALL {
        let value = row.get(metric);
        let (lower, upper) = metric.plausible_range();
        // Record range is (lower, upper].
        if !value.is_finite() || value <= lower || value > upper {
            return Err(PeerError::InvalidDefault { peer_group: peer_group.to_string(), metric, value });
        }
    }
    Ok(row)
}

impl DefaultTable {
    /// Create a table holding only a global default.
    ///
    /// # Errors
    /// Returns `PeerError::InvalidDefault` if a value is out of range.
    pub fn new(global: StaticBenchmark) -> Result<Self, PeerError> {
        Ok(Self { global: validate(GLOBAL_DEFAULT, global)?, groups: BTreeMap::new() })
    }

    /// Add or replace a peer group's row.
    ///
    /// # Errors
    /// Returns `PeerError::InvalidDefault` if a value is out of range.
    pub fn insert(&mut self, peer_group: impl Into<String>, row: StaticBenchmark) -> Result<(), PeerError> {
        let peer_group = peer_group.into();
        let row = validate(&peer_group, row)?;
        self.groups.insert(peer_group, row);
        Ok(())
    }

    /// The table the screener ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let groups = BUILTIN_DEFAULTS
            .iter()
            .map(|&(name, pe, ev_ebitda, pb, roe)| {
                (name.to_string(), StaticBenchmark::new(pe, pb, ev_ebitda, roe))
            })
            .collect();
        Self { global: StaticBenchmark::new(20.0, 2.0, 12.0, 15.0), groups }
    }

    /// Row for a peer group, if declared.
    #[must_use]
    pub fn get(&self, peer_group: &str) -> Option<StaticBenchmark> {
        self.groups.get(peer_group).copied()
    }

    /// The global fallback row.
    #[must_use]
    pub const fn global(&self) -> StaticBenchmark {
        self.global
    }

    /// Row for a peer group, or the global row.
    #[must_use]
    pub fn resolve(&self, peer_group: &str) -> StaticBenchmark {
        self.get(peer_group).unwrap_or(self.global)
    }
}

impl Default for DefaultTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// (peer group, pe, ev_ebitda, pb, roe %)
const BUILTIN_DEFAULTS: &[(&str, f64, f64, f64, f64)] = &[
    ("Financial Services", 18.0, 12.0, 1.5, 15.0),
    ("Technology", 25.0, 15.0, 3.5, 20.0),
    ("Healthcare & Pharma", 28.0, 14.0, 3.0, 18.0),
    ("Industrial & Manufacturing", 22.0, 12.0, 2.0, 14.0),
    ("Energy & Utilities", 15.0, 8.0, 1.2, 12.0),
    ("Consumer & Retail", 30.0, 14.0, 2.5, 16.0),
    ("Materials & Chemicals", 18.0, 10.0, 1.8, 13.0),
    ("Real Estate & Construction", 25.0, 18.0, 1.5, 12.0),
    ("Transportation", 20.0, 12.0, 1.8, 14.0),
    ("Textiles", 20.0, 12.0, 1.5, 15.0),
];
