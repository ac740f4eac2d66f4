//! Staging rows: ingested cards with normalized fields and a review status.
//!
//! Status moves `Pending -> Validated | Error`, then `Validated -> Loaded`.

use crate::fields::{PARALLEL_NAME, PLAYER_NAME, PRINT_RUN, TEAM_NAME};
use crate::normalize::{
    canonical_set_year, normalize_card_number, normalize_parallel, normalize_player,
    normalize_print_run, normalize_set_name,
};
use crate::{CardRecord, ChecklistError, Provenance, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingStatus {
    #[default]
    Pending,
    Validated,
    Error,
    Loaded,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub set_year: Option<String>,
    pub set_name: Option<String>,
    pub subset_name: Option<String>,
    pub card_number: Option<String>,
    pub player_name: Option<String>,
    pub team_name: Option<String>,
    pub parallel_name: Option<String>,
    pub print_run: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingRow {
    pub key: String,
    /// raw values as extracted, never modified
    pub raw: BTreeMap<String, String>,
    pub provenance: Option<Provenance>,
    pub normalized: NormalizedRow,
    pub status: StagingStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

fn opt(s: &str) -> Option<&str> {
    (!s.trim().is_empty()).then_some(s)
}

impl StagingRow {
    pub fn from_card(key: &str, card: &CardRecord) -> Self {
        let mut raw = card.fields.clone();
        if let Some(set) = &card.cardset {
            raw.entry("set_year".into()).or_insert_with(|| set.year.clone());
            raw.entry("set_name".into()).or_insert_with(|| set.set_name.clone());
            raw.entry("subset_name".into()).or_insert_with(|| set.subset_name.clone());
        }
        if let Some(p) = &card.parallel {
            raw.entry(PARALLEL_NAME.into()).or_insert_with(|| p.parallel_name.clone());
        }
        raw.entry(PLAYER_NAME.into()).or_insert_with(|| card.name.clone());
        raw.entry(TEAM_NAME.into()).or_insert_with(|| card.team_name.clone());
        raw.entry(PRINT_RUN.into()).or_insert_with(|| card.print_run.clone());
        raw.retain(|_, v| !v.trim().is_empty());

        Self {
            key: key.to_string(),
            raw,
            provenance: card.provenance.clone(),
            normalized: NormalizedRow::default(),
            status: StagingStatus::Pending,
            errors: Vec::new(),
        }
    }

    fn raw(&self, field: &str) -> Option<&str> {
        self.raw.get(field).map(String::as_str).and_then(opt)
    }

    /// Fill `normalized` from `raw`.
    pub fn normalize(&mut self) {
        self.normalized = NormalizedRow {
            set_year: self.raw("set_year").map(canonical_set_year),
            set_name: normalize_set_name(self.raw("set_name")),
            subset_name: normalize_set_name(self.raw("subset_name")),
            card_number: normalize_card_number(self.raw("card_number")),
            player_name: normalize_player(self.raw(PLAYER_NAME)),
            team_name: normalize_set_name(self.raw(TEAM_NAME)),
            parallel_name: normalize_parallel(self.raw(PARALLEL_NAME)),
            print_run: self.raw(PRINT_RUN).and_then(normalize_print_run),
        };
    }

    /// Check required fields and set the status. Returns whether the row is valid.
    pub fn validate(&mut self, known_parallels: &BTreeSet<String>) -> bool {
        let n = &self.normalized;
        let mut errors = Vec::new();
        if n.set_name.is_none() {
            errors.push("missing set_name".to_string());
        }
        match &n.card_number {
            None => errors.push("missing card_number".to_string()),
            Some(num) if !num.chars().any(char::is_alphanumeric) => {
                errors.push(format!("invalid card_number '{num}'"))
            }
            Some(_) => {}
        }
        if n.player_name.is_none() {
            errors.push("missing player_name".to_string());
        }
        if let Some(parallel) = &n.parallel_name {
            if !known_parallels.contains(parallel) {
                errors.push(format!("unknown parallel '{parallel}'"));
            }
        }

        self.status = if errors.is_empty() {
            StagingStatus::Validated
        } else {
            StagingStatus::Error
        };
        self.errors = errors;
        self.status == StagingStatus::Validated
    }

    pub fn mark_loaded(&mut self) -> Result<()> {
        if self.status != StagingStatus::Validated {
            return Err(ChecklistError::Config(format!(
                "staging row '{}' is {:?}, only validated rows can be loaded",
                self.key, self.status
            )));
        }
        self.status = StagingStatus::Loaded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParallelRef, SetRecord};

    fn card(number: &str, player: &str) -> CardRecord {
        CardRecord {
            name: player.into(),
            card_number: number.into(),
            team_name: "new york yankees".into(),
            print_run: "/99".into(),
            fields: [("card_number".to_string(), number.to_string())].into_iter().collect(),
            cardset: Some(SetRecord {
                year: "2024".into(),
                brand: "Panini".into(),
                set_name: "select".into(),
                subset_name: "rookies".into(),
                sport: None,
                source_file: None,
                print_run: String::new(),
                friendly_name: "2024 Panini Select".into(),
            }),
            parallel: None,
            provenance: Some(Provenance {
                file: "Select.xlsx".into(),
                sheet: "Base".into(),
                row: 7,
            }),
        }
    }

    #[test]
    fn test_normalize_and_validate() {
        let mut row = StagingRow::from_card("k", &card(" 12a ", "john   doe"));
        assert_eq!(row.status, StagingStatus::Pending);
        row.normalize();
        assert_eq!(row.normalized.card_number.as_deref(), Some("12A"));
        assert_eq!(row.normalized.player_name.as_deref(), Some("John Doe"));
        assert_eq!(row.normalized.set_name.as_deref(), Some("Select"));
        assert_eq!(row.normalized.subset_name.as_deref(), Some("Rookies"));
        assert_eq!(row.normalized.print_run, Some(99));
        // raw is untouched
        assert_eq!(row.raw["card_number"], " 12a ");

        assert!(row.validate(&BTreeSet::new()));
        assert_eq!(row.status, StagingStatus::Validated);
        row.mark_loaded().unwrap();
        assert_eq!(row.status, StagingStatus::Loaded);
    }

    #[test]
    fn test_validation_errors() {
        let mut c = card("--", "");
        c.parallel = Some(ParallelRef {
            key: "p".into(),
            parallel_name: "gold foil".into(),
        });
        let mut row = StagingRow::from_card("k", &c);
        row.normalize();
        assert!(!row.validate(&BTreeSet::from(["Silver".to_string()])));
        assert_eq!(row.status, StagingStatus::Error);
        assert_eq!(row.errors.len(), 3);
        assert!(row.errors.iter().any(|e| e == "unknown parallel 'Gold Foil'"));
        assert!(row.mark_loaded().is_err());

        assert!(!row.validate(&BTreeSet::from(["Gold Foil".to_string()])));
        assert_eq!(row.errors.len(), 2);
    }
}
