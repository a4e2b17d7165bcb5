//! Peer group definitions.

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// Peer group collecting securities whose category is not mapped anywhere.
pub const OTHER_PEER_GROUP: &str = "Other";

/// A named set of comparable securities.
///
/// A peer group is a broad sector composed of finer categories. Members are
/// kept in listing order so that subsampling and screening are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerGroup {
    /// Peer group name.
    pub name: String,
    /// Categories rolling up to this group.
    pub categories: Vec<String>,
    /// Member tickers, in listing order.
    pub members: Vec<Symbol>,
}

impl PeerGroup {
    /// Create an empty peer group over the given categories.
    #[must_use]
    pub fn new(name: impl Into<String>, categories: Vec<String>) -> Self {
        Self { name: name.into(), categories, members: Vec::new() }
    }

    /// Number of members.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the group has no members.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check whether a category rolls up to this group.
    #[must_use]
    pub fn covers(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
