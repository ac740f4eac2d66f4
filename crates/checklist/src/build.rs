//! Entity construction and composite keys.

use crate::fields::{CARD_NUMBER, PARALLEL_NAME, PLAYER_NAME, PRINT_RUN, SUBSET_NAME, TEAM_NAME};
use crate::{
    CanonicalEntity, CardRecord, ChecklistError, ChecklistMeta, ColumnMap, ParallelRecord, RawRow,
    Result, SetRecord,
};
use std::collections::BTreeMap;

/// The three metadata fields every key starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetIdentity {
    pub year: String,
    pub brand: String,
    pub set_name: String,
}

impl SetIdentity {
    pub fn from_meta(checklist: &str, meta: &ChecklistMeta) -> Result<Self> {
        let require = |v: &Option<String>, field: &'static str| {
            v.clone().ok_or_else(|| ChecklistError::MissingMeta {
                checklist: checklist.to_string(),
                field,
            })
        };
        Ok(Self {
            year: require(&meta.year, "year")?,
            brand: require(&meta.brand, "brand")?,
            set_name: require(&meta.set_name, "set_name")?,
        })
    }

    pub fn friendly_name(&self) -> String {
        format!("{}-{}-{}", self.year, self.brand, self.set_name)
    }
}

/// `trim(row[idx])` for every mapped column; blanks become "".
pub fn extract_values(row: &RawRow, columns: &ColumnMap) -> BTreeMap<String, String> {
    columns
        .iter()
        .map(|(idx, field)| (field.to_string(), row.get(idx)))
        .collect()
}

/// year-brand-set, then subset, parallel and card number when present.
pub fn composite_key(id: &SetIdentity, vals: &BTreeMap<String, String>) -> String {
    let mut parts = vec![id.year.as_str(), id.brand.as_str(), id.set_name.as_str()];
    for field in [SUBSET_NAME, PARALLEL_NAME, CARD_NUMBER] {
        if let Some(v) = vals.get(field).filter(|v| !v.is_empty()) {
            parts.push(v);
        }
    }
    parts.join("-")
}

pub fn set_record(id: &SetIdentity, meta: &ChecklistMeta, vals: &BTreeMap<String, String>) -> SetRecord {
    SetRecord {
        year: id.year.clone(),
        brand: id.brand.clone(),
        set_name: id.set_name.clone(),
        subset_name: value(vals, SUBSET_NAME),
        sport: meta.sport.clone(),
        source_file: meta.source_file.clone(),
        print_run: value(vals, PRINT_RUN),
        friendly_name: id.friendly_name(),
    }
}

/// Build one entity from a row. Cross-entity links (owning subset, active
/// parallel, provenance) are left empty for the caller to attach.
///
/// Fails only when `meta` lacks year, brand or set_name.
pub fn build(row: &RawRow, columns: &ColumnMap, meta: &ChecklistMeta) -> Result<(String, CanonicalEntity)> {
    let id = SetIdentity::from_meta("", meta)?;
    Ok(build_with_identity(row, columns, meta, &id))
}

pub fn build_with_identity(
    row: &RawRow,
    columns: &ColumnMap,
    meta: &ChecklistMeta,
    id: &SetIdentity,
) -> (String, CanonicalEntity) {
    let vals = extract_values(row, columns);
    let key = composite_key(id, &vals);

    let card_number = value(&vals, CARD_NUMBER);
    let parallel_name = value(&vals, PARALLEL_NAME);

    let entity = if !card_number.is_empty() {
        let player = value(&vals, PLAYER_NAME);
        CanonicalEntity::Card(CardRecord {
            name: if player.is_empty() { parallel_name } else { player },
            card_number,
            team_name: value(&vals, TEAM_NAME),
            print_run: value(&vals, PRINT_RUN),
            fields: vals,
            cardset: None,
            parallel: None,
            provenance: None,
        })
    } else if !parallel_name.is_empty() {
        CanonicalEntity::Parallel(ParallelRecord {
            parallel_name,
            print_run: value(&vals, PRINT_RUN),
            fields: vals,
            cardset: None,
            provenance: None,
        })
    } else {
        CanonicalEntity::Set(set_record(id, meta, &vals))
    };

    (key, entity)
}

fn value(vals: &BTreeMap<String, String>, field: &str) -> String {
    vals.get(field).cloned().unwrap_or_default()
}
