//! Review index of ingested cards by subset, parallel and team.

use crate::CanonicalEntity;
use std::collections::BTreeMap;

/// subset -> parallel -> team -> card keys
pub type SummaryIndex = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>;

pub const BASE_PARALLEL: &str = "Base";
pub const UNKNOWN_TEAM: &str = "Unknown";

/// Group card keys for review. Non-card entities are ignored.
pub fn summary_index(cards: &BTreeMap<String, CanonicalEntity>) -> SummaryIndex {
    let mut index = SummaryIndex::new();
    for (key, card) in cards.iter().filter_map(|(k, e)| e.as_card().map(|c| (k, c))) {
        let subset = card
            .cardset
            .as_ref()
            .map(|s| s.subset_name.clone())
            .unwrap_or_default();
        let parallel = card
            .parallel
            .as_ref()
            .map(|p| p.parallel_name.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| BASE_PARALLEL.to_string());
        let team = if card.team_name.is_empty() {
            UNKNOWN_TEAM.to_string()
        } else {
            card.team_name.clone()
        };
        index
            .entry(subset)
            .or_default()
            .entry(parallel)
            .or_default()
            .entry(team)
            .or_default()
            .push(key.clone());
    }
    index
}
