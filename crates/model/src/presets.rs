//! Named screening presets.

use peerval_primitives::MarketCapBucket;
use serde::{Deserialize, Serialize};

use crate::{ModelError, ScreenCriteria, Strategy};

/// Distance below the 52-week high counted as "near the high".
pub const NEAR_HIGH_PCT: f64 = 10.0;
/// Distance above the 52-week low counted as "near the low".
pub const NEAR_LOW_PCT: f64 = 50.0;
/// Net debt over market cap counted as "low debt".
pub const LOW_DEBT_PCT: f64 = 30.0;

/// A ready-made screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Display name.
    pub name: String,
    /// Peer groups to draw candidates from; empty screens every listing.
    pub peer_groups: Vec<String>,
    /// Screening criteria.
    pub criteria: ScreenCriteria,
    /// Candidates examined, in listing order (0 = all).
    pub candidate_limit: usize,
    /// Rows returned (0 = all).
    pub result_limit: usize,
}

impl Preset {
    fn new(name: &str, criteria: ScreenCriteria, candidate_limit: usize) -> Self {
        Self { name: name.to_string(), peer_groups: Vec::new(), criteria, candidate_limit, result_limit: 25 }
    }

    fn in_group(mut self, peer_group: &str) -> Self {
        self.peer_groups.push(peer_group.to_string());
        self
    }

    /// Command-line friendly name: lower case, words joined by `-`.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Every built-in preset.
#[must_use]
pub fn presets() -> Vec<Preset> {
    let undervalued = || ScreenCriteria::new(Strategy::Undervalued);
    vec![
        Preset::new(
            "Top Undervalued Large Caps",
            undervalued().with_market_caps([MarketCapBucket::Large]).with_upside_min(20.0).with_pe_max(25.0),
            100,
        ),
        Preset::new(
            "High-Growth Mid Caps",
            undervalued().with_market_caps([MarketCapBucket::Mid]).with_upside_min(25.0).with_roe_min(15.0),
            150,
        ),
        Preset::new(
            "Small Cap Gems",
            undervalued().with_market_caps([MarketCapBucket::Small]).with_upside_min(30.0).with_pe_max(20.0),
            200,
        ),
        Preset::new(
            "Undervalued Near 52W High",
            undervalued().with_upside_min(15.0).with_below_high_max(NEAR_HIGH_PCT),
            200,
        ),
        Preset::new(
            "Value Picks Near 52W Low",
            undervalued().with_upside_min(25.0).with_above_low_max(NEAR_LOW_PCT),
            200,
        ),
        Preset::new(
            "Overvalued Large Caps",
            ScreenCriteria::new(Strategy::Overvalued)
                .with_market_caps([MarketCapBucket::Large])
                .with_upside_max(-15.0),
            100,
        ),
        Preset::new("Financial Sector", undervalued().with_upside_min(15.0).with_pb_max(2.0), 100)
            .in_group("Financial Services"),
        Preset::new("Technology", undervalued().with_upside_min(20.0).with_pe_max(30.0), 100)
            .in_group("Technology"),
        Preset::new("Healthcare & Pharma", undervalued().with_upside_min(20.0), 100)
            .in_group("Healthcare & Pharma"),
        Preset::new("Industrial", undervalued().with_upside_min(18.0).with_pe_max(25.0), 100)
            .in_group("Industrial & Manufacturing"),
        Preset::new(
            "Quality Stocks (High ROE)",
            undervalued().with_upside_min(15.0).with_roe_min(20.0).with_net_debt_max(LOW_DEBT_PCT),
            200,
        ),
        Preset::new(
            "Growth at Reasonable Price",
            ScreenCriteria::new(Strategy::Any)
                .with_upside_min(15.0)
                .with_upside_max(50.0)
                .with_pe_max(25.0)
                .with_roe_min(15.0),
            200,
        ),
    ]
}

/// Look up a preset by display name or slug, ignoring case.
///
/// # Errors
/// Returns `ModelError::UnknownPreset` if nothing matches.
pub fn preset(name: &str) -> Result<Preset, ModelError> {
    let wanted = name.trim();
    presets()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(wanted) || p.slug() == wanted.to_ascii_lowercase())
        .ok_or_else(|| ModelError::UnknownPreset(wanted.to_string()))
}

#[cfg(test)]
mod tests {
    use peerval_peers::Taxonomy;

    use super::*;

    #[test]
    fn twelve_valid_presets() {
        let all = presets();
        assert_eq!(all.len(), 12);
        for p in &all {
            assert!(p.criteria.validate().is_ok(), "{}", p.name);
            assert_eq!(p.result_limit, 25);
        }
    }

    #[test]
    fn preset_groups_exist_in_builtin_taxonomy() {
        let taxonomy = Taxonomy::builtin();
        let declared: Vec<&str> = taxonomy.groups().map(|(g, _)| g).collect();
        for p in presets() {
            for group in &p.peer_groups {
                assert!(declared.contains(&group.as_str()), "{group}");
            }
        }
    }

    #[test]
    fn slugs() {
        let all = presets();
        assert_eq!(all[0].slug(), "top-undervalued-large-caps");
        assert_eq!(all[8].slug(), "healthcare-pharma");
        assert_eq!(all[10].slug(), "quality-stocks-high-roe");
    }

    #[test]
    fn lookup_by_name_or_slug() {
        assert_eq!(preset("small-cap-gems").unwrap().candidate_limit, 200);
        assert_eq!(preset("Financial Sector").unwrap().peer_groups, vec!["Financial Services"]);
        assert_eq!(preset("overvalued large caps").unwrap().criteria.strategy, Strategy::Overvalued);
        assert!(matches!(preset("moon-shots"), Err(ModelError::UnknownPreset(_))));
    }
}
