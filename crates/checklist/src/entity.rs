//! Canonical entities produced by the builder.
//!
//! Plain data, independent of any storage layer. Persistence adapters convert
//! at their own boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a row came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub file: String,
    pub sheet: String,
    /// 1-based row number within the sheet
    pub row: usize,
}

/// A set, or one subset of it. Identity: (year, brand, set_name, subset_name).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    pub year: String,
    /// publisher
    pub brand: String,
    pub set_name: String,
    pub subset_name: String,
    pub sport: Option<String>,
    pub source_file: Option<String>,
    pub print_run: String,
    pub friendly_name: String,
}

/// Lookup-only link from a card to the parallel it was listed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelRef {
    pub key: String,
    pub parallel_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelRecord {
    pub parallel_name: String,
    pub print_run: String,
    /// every value extracted through the column map
    pub fields: BTreeMap<String, String>,
    pub cardset: Option<SetRecord>,
    pub provenance: Option<Provenance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// player name, or the parallel name for parallel-card rows
    pub name: String,
    pub card_number: String,
    pub team_name: String,
    pub print_run: String,
    pub fields: BTreeMap<String, String>,
    pub cardset: Option<SetRecord>,
    pub parallel: Option<ParallelRef>,
    pub provenance: Option<Provenance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalEntity {
    Set(SetRecord),
    Parallel(ParallelRecord),
    Card(CardRecord),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Set,
    Parallel,
    Card,
}

impl CanonicalEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            CanonicalEntity::Set(_) => EntityKind::Set,
            CanonicalEntity::Parallel(_) => EntityKind::Parallel,
            CanonicalEntity::Card(_) => EntityKind::Card,
        }
    }

    /// Owning subset. A set has none.
    pub fn cardset(&self) -> Option<&SetRecord> {
        match self {
            CanonicalEntity::Set(_) => None,
            CanonicalEntity::Parallel(p) => p.cardset.as_ref(),
            CanonicalEntity::Card(c) => c.cardset.as_ref(),
        }
    }

    pub fn set_cardset(&mut self, cardset: Option<SetRecord>) {
        match self {
            CanonicalEntity::Set(_) => {}
            CanonicalEntity::Parallel(p) => p.cardset = cardset,
            CanonicalEntity::Card(c) => c.cardset = cardset,
        }
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            CanonicalEntity::Set(_) => None,
            CanonicalEntity::Parallel(p) => p.provenance.as_ref(),
            CanonicalEntity::Card(c) => c.provenance.as_ref(),
        }
    }

    pub fn set_provenance(&mut self, provenance: Provenance) {
        match self {
            CanonicalEntity::Set(_) => {}
            CanonicalEntity::Parallel(p) => p.provenance = Some(provenance),
            CanonicalEntity::Card(c) => c.provenance = Some(provenance),
        }
    }

    pub fn as_set(&self) -> Option<&SetRecord> {
        match self {
            CanonicalEntity::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_parallel(&self) -> Option<&ParallelRecord> {
        match self {
            CanonicalEntity::Parallel(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_card(&self) -> Option<&CardRecord> {
        match self {
            CanonicalEntity::Card(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_card_mut(&mut self) -> Option<&mut CardRecord> {
        match self {
            CanonicalEntity::Card(c) => Some(c),
            _ => None,
        }
    }
}
