//! Security identity types.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Stock ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Create a symbol from a listing entry, trimming whitespace and upper-casing.
    #[must_use]
    pub fn normalized(s: &str) -> Self {
        Self(s.trim().to_uppercase())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Category assigned to listings without one.
pub const UNCATEGORIZED: &str = "Miscellaneous";

/// A listed security with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Display name.
    pub name: String,
    /// Fine-grained category (rolls up to a peer group).
    pub category: String,
}

impl Security {
    /// Create a new security.
    #[must_use]
    pub const fn new(symbol: Symbol, name: String, category: String) -> Self {
        Self { symbol, name, category }
    }

    /// Create a security from raw listing fields.
    ///
    /// The ticker is normalized, the name trimmed, and an empty category
    /// replaced by [`UNCATEGORIZED`].
    #[must_use]
    pub fn from_listing(ticker: &str, name: &str, category: Option<&str>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string();
        Self { symbol: Symbol::normalized(ticker), name: name.trim().to_string(), category }
    }
}
