//! Column maps and the override chain that picks one for a row.

use crate::config::{render_value, ChecklistMeta, SheetDef};
use crate::RowTag;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Column index -> canonical field name. Indices need not be contiguous.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap(BTreeMap<usize, String>);

impl ColumnMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, idx: usize, field: impl Into<String>) {
        self.0.insert(idx, field.into());
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(&idx).map(String::as_str)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.0.contains_key(&idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, f)| (*i, f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(i, f)| (i, f.into())).collect())
    }
}

/// Entry of a declared mapping that is not `integer -> string`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedEntry {
    NonIntegerIndex { index: String },
    NonStringField { index: usize, value: String },
}

/// A mapping as declared in the config: the well-typed entries plus whatever
/// could not be read as `index -> field`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingDecl {
    pub columns: ColumnMap,
    pub malformed: Vec<MalformedEntry>,
}

impl MappingDecl {
    pub fn from_mapping(mapping: &serde_yaml::Mapping) -> Self {
        let mut decl = MappingDecl::default();
        for (k, v) in mapping {
            match (index_key(k), v) {
                (Some(idx), Value::String(field)) => decl.columns.insert(idx, field.clone()),
                (Some(idx), other) => decl.malformed.push(MalformedEntry::NonStringField {
                    index: idx,
                    value: render_value(other),
                }),
                (None, _) => decl.malformed.push(MalformedEntry::NonIntegerIndex {
                    index: render_value(k),
                }),
            }
        }
        decl
    }
}

impl From<ColumnMap> for MappingDecl {
    fn from(columns: ColumnMap) -> Self {
        Self { columns, malformed: vec![] }
    }
}

/// Either one mapping for every row kind, or one mapping per section
/// (`cards`, `subset`, `parallel`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnLayout {
    Flat(MappingDecl),
    Sections {
        sections: BTreeMap<String, MappingDecl>,
        /// section names whose value was not a mapping
        invalid: Vec<String>,
    },
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout::Sections { sections: BTreeMap::new(), invalid: vec![] }
    }
}

impl ColumnLayout {
    /// Flat when every key reads as a column index, sectioned otherwise.
    pub fn from_mapping(mapping: &serde_yaml::Mapping) -> Self {
        if !mapping.is_empty() && mapping.keys().all(|k| index_key(k).is_some()) {
            return ColumnLayout::Flat(MappingDecl::from_mapping(mapping));
        }

        let mut sections = BTreeMap::new();
        let mut invalid = vec![];
        for (k, v) in mapping {
            let name = render_value(k);
            match v.as_mapping() {
                Some(m) => {
                    sections.insert(name, MappingDecl::from_mapping(m));
                }
                None => invalid.push(name),
            }
        }
        ColumnLayout::Sections { sections, invalid }
    }

    pub fn for_tag(&self, tag: RowTag) -> Option<&MappingDecl> {
        match self {
            ColumnLayout::Flat(decl) => Some(decl),
            ColumnLayout::Sections { .. } => self.section_for(tag),
        }
    }

    /// The mapping declared under the section for `tag`. A flat layout names
    /// no section and yields nothing.
    pub fn section_for(&self, tag: RowTag) -> Option<&MappingDecl> {
        match self {
            ColumnLayout::Flat(_) => None,
            ColumnLayout::Sections { sections, .. } => sections.get(tag.section()),
        }
    }

    /// Every mapping with the section name used in diagnostics.
    pub fn mappings(&self) -> Vec<(&str, &MappingDecl)> {
        match self {
            ColumnLayout::Flat(decl) => vec![("default", decl)],
            ColumnLayout::Sections { sections, .. } => {
                sections.iter().map(|(name, decl)| (name.as_str(), decl)).collect()
            }
        }
    }

    pub fn invalid_sections(&self) -> &[String] {
        match self {
            ColumnLayout::Flat(_) => &[],
            ColumnLayout::Sections { invalid, .. } => invalid,
        }
    }

    pub fn declares_index(&self, idx: usize) -> bool {
        self.mappings().iter().any(|(_, decl)| decl.columns.contains(idx))
    }
}

/// What a sheet's `columns` entry holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnsSpec {
    Alias(String),
    Inline(ColumnLayout),
    /// neither a name nor a mapping; kept for diagnostics
    Invalid(String),
}

impl ColumnsSpec {
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Null => None,
            Value::String(s) => Some(ColumnsSpec::Alias(s.clone())),
            Value::Mapping(m) => Some(ColumnsSpec::Inline(ColumnLayout::from_mapping(m))),
            other => Some(ColumnsSpec::Invalid(render_value(other))),
        }
    }
}

/// Column index from a key: YAML integers, or integer strings as JSON writes them.
pub fn index_key(k: &Value) -> Option<usize> {
    match k {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

/// Effective column map for a row of kind `tag` on `sheet`.
///
/// First satisfied rule wins:
/// 1. the sheet names a column set that exists
/// 2. the sheet declares its columns inline (a flat inline map covers every kind)
/// 3. the checklist meta has a section for this kind
/// 4. the document defaults have a section for this kind (empty when absent)
///
/// A flat `meta.columns` map is not keyed by kind, so rule 3 never reads it.
///
/// The result is always an owned copy; the registry is never handed out.
pub fn resolve_columns(
    sheet: &SheetDef,
    column_sets: &BTreeMap<String, MappingDecl>,
    meta: &ChecklistMeta,
    defaults: &ColumnLayout,
    tag: RowTag,
) -> ColumnMap {
    match &sheet.columns {
        Some(ColumnsSpec::Alias(alias)) if column_sets.contains_key(alias) => {
            debug!(sheet=%sheet.name, alias=%alias, "columns: column set");
            return column_sets[alias].columns.clone();
        }
        Some(ColumnsSpec::Inline(layout)) => {
            if let Some(decl) = layout.for_tag(tag) {
                debug!(sheet=%sheet.name, "columns: inline");
                return decl.columns.clone();
            }
        }
        _ => {}
    }

    if let Some(decl) = meta.columns.as_ref().and_then(|l| l.section_for(tag)) {
        debug!(sheet=%sheet.name, kind=%tag, "columns: checklist meta");
        return decl.columns.clone();
    }

    defaults
        .section_for(tag)
        .map(|decl| decl.columns.clone())
        .unwrap_or_default()
}
