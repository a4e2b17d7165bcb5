//! Peer-group registry.

use std::collections::HashMap;

use peerval_primitives::{BenchmarkRecord, OTHER_PEER_GROUP, PeerGroup, Security, Symbol};

use crate::{DefaultTable, PeerError, Taxonomy};

/// Peer groups, their members and their static fallback benchmarks.
///
/// Built once at startup from a taxonomy, a default table and the security
/// listings; read-only afterwards and safe to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PeerGroupRegistry {
    taxonomy: Taxonomy,
    defaults: DefaultTable,
    groups: Vec<PeerGroup>,
    group_index: HashMap<String, usize>,
    securities: HashMap<Symbol, Security>,
    membership: HashMap<Symbol, usize>,
    listing_order: Vec<Symbol>,
}

impl PeerGroupRegistry {
    /// Create a registry with one empty group per taxonomy entry.
    #[must_use]
    pub fn new(taxonomy: Taxonomy, defaults: DefaultTable) -> Self {
        let groups: Vec<PeerGroup> = taxonomy
            .groups()
            .map(|(name, categories)| PeerGroup::new(name, categories.to_vec()))
            .collect();
        let group_index = groups.iter().enumerate().map(|(i, g)| (g.name.clone(), i)).collect();

        Self {
            taxonomy,
            defaults,
            groups,
            group_index,
            securities: HashMap::new(),
            membership: HashMap::new(),
            listing_order: Vec::new(),
        }
    }

    /// Registry over the built-in taxonomy and default table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Taxonomy::builtin(), DefaultTable::builtin())
    }

    /// Add every listing, in order.
    ///
    /// # Errors
    /// Returns `PeerError::DuplicateSecurity` if a ticker is listed twice.
    pub fn with_listings<I>(mut self, listings: I) -> Result<Self, PeerError>
    where
        I: IntoIterator<Item = Security>,
    {
        for security in listings {
            self.add_security(security)?;
        }
        Ok(self)
    }

    /// Register one security, returning the peer group it joined.
    ///
    /// Securities whose category is not in the taxonomy join the
    /// [`OTHER_PEER_GROUP`] group.
    ///
    /// # Errors
    /// Returns `PeerError::DuplicateSecurity` if the ticker is already listed.
    pub fn add_security(&mut self, security: Security) -> Result<&str, PeerError> {
        if self.securities.contains_key(&security.symbol) {
            return Err(PeerError::DuplicateSecurity(security.symbol));
        }

        let group_name = match self.taxonomy.peer_group_of(&security.category) {
            Some(name) => name.to_string(),
            None => {
                tracing::debug!(
                    symbol = %security.symbol,
                    category = %security.category,
                    "unmapped category, assigning to {OTHER_PEER_GROUP}"
                );
                OTHER_PEER_GROUP.to_string()
            }
        };

        let idx = match self.group_index.get(&group_name) {
            Some(&idx) => idx,
            None => {
                self.groups.push(PeerGroup::new(group_name.clone(), Vec::new()));
                self.group_index.insert(group_name, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[idx];
        group.members.push(security.symbol.clone());
        if !group.covers(&security.category) && group.name == OTHER_PEER_GROUP {
            group.categories.push(security.category.clone());
        }
        self.membership.insert(security.symbol.clone(), idx);
        self.listing_order.push(security.symbol.clone());
        self.securities.insert(security.symbol.clone(), security);

        Ok(&self.groups[idx].name)
    }

    /// Look up a peer group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&PeerGroup> {
        self.group_index.get(name).map(|&i| &self.groups[i])
    }

    /// Members of a peer group, in listing order.
    #[must_use]
    pub fn members(&self, name: &str) -> Option<&[Symbol]> {
        self.group(name).map(|g| g.members.as_slice())
    }

    /// All peer groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = &PeerGroup> {
        self.groups.iter()
    }

    /// Whether the peer group is declared.
    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.group_index.contains_key(name)
    }

    /// Peer group a category rolls up to.
    #[must_use]
    pub fn peer_group_of_category<'a>(&'a self, category: &str) -> &'a str {
        self.taxonomy.peer_group_of(category).unwrap_or(OTHER_PEER_GROUP)
    }

    /// Peer group a listed security belongs to.
    #[must_use]
    pub fn peer_group_of(&self, symbol: &Symbol) -> Option<&str> {
        self.membership.get(symbol).map(|&i| self.groups[i].name.as_str())
    }

    /// Listing metadata for a security.
    #[must_use]
    pub fn security(&self, symbol: &Symbol) -> Option<&Security> {
        self.securities.get(symbol)
    }

    /// Every listed ticker, in listing order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.listing_order
    }

    /// Number of listed securities.
    #[must_use]
    pub fn n_securities(&self) -> usize {
        self.securities.len()
    }

    /// The static default table.
    #[must_use]
    pub const fn defaults(&self) -> &DefaultTable {
        &self.defaults
    }

    /// Static fallback benchmark for a peer group.
    ///
    /// Known groups use their own row, falling back to the global row when
    /// the table has none. Unknown groups get the global row.
    #[must_use]
    pub fn static_default(&self, name: &str) -> BenchmarkRecord {
        let row = if self.is_known(name) { self.defaults.resolve(name) } else { self.defaults.global() };
        BenchmarkRecord::from_static(name, row)
    }
}

impl Default for PeerGroupRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
