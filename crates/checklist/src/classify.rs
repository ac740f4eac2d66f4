//! Row classification.
//!
//! Decides what a row represents from its first five positions alone. Rule
//! order matters: the parallel marker check runs before the subset check so a
//! "Parallel Inserts" header is never taken for a subset.

use crate::fields::{CARD_NUMBER, PARALLEL_NAME, PLAYER_NAME, PRINT_RUN, SUBSET_NAME, TEAM_NAME};
use crate::RawRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTag {
    Subset,
    ParallelMarker,
    Parallel,
    Card,
    Master,
    Unknown,
}

impl RowTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowTag::Subset => "subset",
            RowTag::ParallelMarker => "parallel_marker",
            RowTag::Parallel => "parallel",
            RowTag::Card => "card",
            RowTag::Master => "master",
            RowTag::Unknown => "unknown",
        }
    }

    /// Name of the column section used for this kind of row in `meta.columns`
    /// and `defaults.columns`. Card and master rows share `cards`.
    pub fn section(&self) -> &'static str {
        match self {
            RowTag::Card | RowTag::Master => "cards",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for RowTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    pub tag: RowTag,
    pub fields: BTreeMap<String, String>,
}

impl ClassifiedRow {
    fn new(tag: RowTag, fields: &[(&str, String)]) -> Self {
        Self {
            tag,
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }

    fn unknown() -> Self {
        Self::new(RowTag::Unknown, &[])
    }

    /// Extracted value for `name`, or "" when the rule did not extract it.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

pub fn classify_row(row: &RawRow, in_parallel: bool) -> ClassifiedRow {
    let first = row.get(0);
    if first.is_empty() {
        return ClassifiedRow::unknown();
    }

    if first.to_lowercase().contains("parallel") {
        return ClassifiedRow::new(RowTag::ParallelMarker, &[(PARALLEL_NAME, first)]);
    }

    // only the first column populated: a block header or a parallel entry
    if row.is_blank(1) && row.is_blank(2) {
        return if in_parallel {
            ClassifiedRow::new(RowTag::Parallel, &[(PARALLEL_NAME, first)])
        } else {
            ClassifiedRow::new(RowTag::Subset, &[(SUBSET_NAME, first)])
        };
    }

    if (1..=4).all(|i| row.is_filled(i)) {
        return ClassifiedRow::new(
            RowTag::Master,
            &[
                (CARD_NUMBER, row.get(1)),
                (PLAYER_NAME, row.get(2)),
                (TEAM_NAME, row.get(3)),
                (PRINT_RUN, row.get(4)),
            ],
        );
    }

    if row.is_filled(1) && row.is_filled(2) {
        return ClassifiedRow::new(
            RowTag::Card,
            &[
                (CARD_NUMBER, row.get(1)),
                (PLAYER_NAME, row.get(2)),
                (TEAM_NAME, row.get(3)),
            ],
        );
    }

    ClassifiedRow::unknown()
}
