//! Category to peer-group mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::PeerError;

/// Ordered declaration of peer groups and the categories rolling up to each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    groups: Vec<(String, Vec<String>)>,
}

impl Taxonomy {
    /// Build a taxonomy, rejecting categories declared under two groups.
    ///
    /// # Errors
    /// Returns `PeerError::DuplicateCategory` on a repeated category.
    pub fn new(groups: Vec<(String, Vec<String>)>) -> Result<Self, PeerError> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (group, categories) in &groups {
            for category in categories {
                if let Some(first) = seen.insert(category, group) {
                    return Err(PeerError::DuplicateCategory {
                        category: category.clone(),
                        first: first.to_string(),
                        second: group.clone(),
                    });
                }
            }
        }
        Ok(Self { groups })
    }

    /// The sector mapping the screener ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let groups = BUILTIN_TAXONOMY
            .iter()
            .map(|(group, cats)| {
                (group.to_string(), cats.iter().map(|c| c.to_string()).collect::<Vec<_>>())
            })
            .collect();
        Self { groups }
    }

    /// Peer groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(g, c)| (g.as_str(), c.as_slice()))
    }

    /// Peer group a category rolls up to.
    #[must_use]
    pub fn peer_group_of(&self, category: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, cats)| cats.iter().any(|c| c == category))
            .map(|(g, _)| g.as_str())
    }

    /// Number of declared peer groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no group is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

const BUILTIN_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "Financial Services",
        &[
            "Money Center Banks",
            "Financial Services",
            "Credit Services",
            "Investment Brokerage - National",
            "Mortgage Investment",
            "Asset Management",
        ],
    ),
    (
        "Technology",
        &[
            "Business Software & Services",
            "Information Technology Services",
            "Financial Technology",
            "Communication Technology",
        ],
    ),
    (
        "Healthcare & Pharma",
        &[
            "Drugs - Generic",
            "Drug Manufacturers - Major",
            "Medical Services",
            "Biotechnology",
            "Medical Diagnostics",
        ],
    ),
    (
        "Industrial & Manufacturing",
        &[
            "Industrial Products",
            "Steel & Iron",
            "Industrial Metals & Minerals",
            "Diversified Machinery",
            "Diversified Electronics",
            "Farm & Construction Machinery",
        ],
    ),
    (
        "Energy & Utilities",
        &[
            "Electric Utilities",
            "Oil & Gas Operations",
            "Gas Utilities",
            "Renewable Energy",
            "Oil & Gas Refining & Marketing",
        ],
    ),
    (
        "Consumer & Retail",
        &[
            "Food - Major Diversified",
            "Personal Products",
            "Retail - Apparel & Accessories",
            "Restaurants",
            "Lodging",
            "Jewelry Stores",
        ],
    ),
    (
        "Materials & Chemicals",
        &[
            "Chemicals - Major Diversified",
            "Agricultural Chemicals",
            "Paper & Paper Products",
            "Rubber & Plastics",
            "Cement & Aggregates",
        ],
    ),
    (
        "Real Estate & Construction",
        &["Real Estate Development", "General Contractors", "Heavy Construction"],
    ),
    ("Transportation", &["Shipping", "Transportation Services", "Major Airlines"]),
    ("Textiles", &["Textile Industrial", "Textile - Apparel Clothing"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_consistent() {
        let builtin = Taxonomy::builtin();
        assert_eq!(builtin.len(), 10);
        let rebuilt = Taxonomy::new(
            builtin.groups().map(|(g, c)| (g.to_string(), c.to_vec())).collect(),
        );
        assert_eq!(rebuilt, Ok(builtin));
    }

    #[test]
    fn category_lookup() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.peer_group_of("Shipping"), Some("Transportation"));
        assert_eq!(taxonomy.peer_group_of("Financial Technology"), Some("Technology"));
        assert_eq!(taxonomy.peer_group_of("Miscellaneous"), None);
    }

    #[test]
    fn duplicate_category_rejected() {
        let result = Taxonomy::new(vec![
            ("A".to_string(), vec!["x".to_string()]),
            ("B".to_string(), vec!["y".to_string(), "x".to_string()]),
        ]);
        assert!(matches!(result, Err(PeerError::DuplicateCategory { .. })));
    }
}
