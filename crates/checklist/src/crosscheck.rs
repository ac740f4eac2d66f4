//! Compare cards produced from per-sheet checklists against a master list.

use crate::{CanonicalEntity, CardRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MAX_EXAMPLES: usize = 10;

/// (card_number, player, team, parallel, subset)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardIdentity {
    pub card_number: String,
    pub name: String,
    pub team_name: String,
    pub parallel_name: String,
    pub subset_name: String,
}

impl CardIdentity {
    pub fn of(card: &CardRecord) -> Self {
        Self {
            card_number: card.card_number.trim().to_string(),
            name: card.name.trim().to_string(),
            team_name: card.team_name.trim().to_string(),
            parallel_name: card
                .parallel
                .as_ref()
                .map(|p| p.parallel_name.trim().to_string())
                .unwrap_or_default(),
            subset_name: card
                .cardset
                .as_ref()
                .map(|s| s.subset_name.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCheckReport {
    pub matched_count: usize,
    /// in the master list but not produced
    pub missing_count: usize,
    /// produced but absent from the master list
    pub extra_count: usize,
    pub missing_examples: Vec<CardIdentity>,
    pub extra_examples: Vec<CardIdentity>,
}

impl CrossCheckReport {
    pub fn is_clean(&self) -> bool {
        self.missing_count == 0 && self.extra_count == 0
    }
}

fn identities(cards: &BTreeMap<String, CanonicalEntity>) -> BTreeSet<CardIdentity> {
    cards
        .values()
        .filter_map(CanonicalEntity::as_card)
        .map(CardIdentity::of)
        .collect()
}

pub fn cross_check(
    fan_out: &BTreeMap<String, CanonicalEntity>,
    master: &BTreeMap<String, CanonicalEntity>,
) -> CrossCheckReport {
    let produced = identities(fan_out);
    let expected = identities(master);

    let missing: Vec<_> = expected.difference(&produced).collect();
    let extra: Vec<_> = produced.difference(&expected).collect();

    CrossCheckReport {
        matched_count: expected.intersection(&produced).count(),
        missing_count: missing.len(),
        extra_count: extra.len(),
        missing_examples: missing.into_iter().take(MAX_EXAMPLES).cloned().collect(),
        extra_examples: extra.into_iter().take(MAX_EXAMPLES).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, name: &str) -> CanonicalEntity {
        CanonicalEntity::Card(CardRecord {
            name: name.into(),
            card_number: number.into(),
            team_name: "Yankees".into(),
            print_run: String::new(),
            fields: Default::default(),
            cardset: None,
            parallel: None,
            provenance: None,
        })
    }

    fn map(cards: &[(&str, &str)]) -> BTreeMap<String, CanonicalEntity> {
        cards
            .iter()
            .map(|(n, p)| (format!("k-{n}"), card(n, p)))
            .collect()
    }

    #[test]
    fn test_cross_check_counts() {
        let master = map(&[("1", "A"), ("2", "B"), ("3", "C")]);
        let fan_out = map(&[("1", "A"), ("2", "B "), ("4", "D")]);
        let report = cross_check(&fan_out, &master);
        assert_eq!(report.matched_count, 2);
        assert_eq!(report.missing_count, 1);
        assert_eq!(report.extra_count, 1);
        assert_eq!(report.missing_examples[0].card_number, "3");
        assert_eq!(report.extra_examples[0].name, "D");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_examples_are_capped() {
        let numbers: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        let master: BTreeMap<_, _> = numbers
            .iter()
            .map(|n| (n.clone(), card(n, "X")))
            .collect();
        let report = cross_check(&BTreeMap::new(), &master);
        assert_eq!(report.missing_count, 25);
        assert_eq!(report.missing_examples.len(), MAX_EXAMPLES);
        assert!(cross_check(&master, &master).is_clean());
    }
}
