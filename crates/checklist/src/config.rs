//! Checklist configuration document.
//!
//! The document is read into a neutral YAML value tree first and then lifted
//! into typed structs. Lifting is strict about structure (a checklist must be a
//! mapping) but lenient about column declarations and gaps: malformed entries
//! are kept as [`MalformedEntry`](crate::MalformedEntry), and column values or
//! gaps of the wrong shape are kept as rendered text, so validation can report
//! them in context alongside every other checklist's problems.

use crate::columns::{index_key, ColumnLayout, ColumnsSpec, MappingDecl};
use crate::{ChecklistError, Result};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULTS_KEY: &str = "defaults";

/// Set-level metadata shared by every row of a checklist file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChecklistMeta {
    pub year: Option<String>,
    pub brand: Option<String>,
    pub set_name: Option<String>,
    pub sport: Option<String>,
    pub source_file: Option<String>,
    pub last_modified: Option<String>,
    pub checksum: Option<String>,
    pub columns: Option<ColumnLayout>,
    /// `columns` present but not a mapping
    pub invalid_columns: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetDef {
    pub name: String,
    pub columns: Option<ColumnsSpec>,
    pub intentional_gaps: Vec<usize>,
    /// gap entries that are not column indices, or the whole value when it is
    /// not a list
    pub invalid_gaps: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChecklistConfig {
    pub meta: ChecklistMeta,
    pub column_sets: BTreeMap<String, MappingDecl>,
    /// alias -> rendered value, for column sets that are not mappings
    pub invalid_column_sets: BTreeMap<String, String>,
    /// keyed by sheet position in the workbook
    pub sheets: BTreeMap<usize, SheetDef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    /// `defaults.columns`
    pub defaults: ColumnLayout,
    pub checklists: BTreeMap<String, ChecklistConfig>,
}

impl ConfigDocument {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(s).map_err(|e| ChecklistError::Parse(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let json: serde_json::Value =
            serde_json::from_str(s).map_err(|e| ChecklistError::Parse(e.to_string()))?;
        let value = serde_yaml::to_value(json).map_err(|e| ChecklistError::Parse(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Reads `.json` files as JSON and everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChecklistError::Io(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_mapping()
            .ok_or_else(|| ChecklistError::Config("document root must be a mapping".into()))?;

        let mut doc = ConfigDocument::default();
        for (k, v) in root {
            let name = render_value(k);
            if name == DEFAULTS_KEY {
                doc.defaults = parse_defaults(v)?;
                continue;
            }
            let checklist = ChecklistConfig::from_value(&name, v)?;
            doc.checklists.insert(name, checklist);
        }
        Ok(doc)
    }

    pub fn checklist(&self, key: &str) -> Option<&ChecklistConfig> {
        self.checklists.get(key)
    }
}

fn parse_defaults(v: &Value) -> Result<ColumnLayout> {
    let Some(m) = v.as_mapping() else {
        return Err(ChecklistError::Config("'defaults' must be a mapping".into()));
    };
    Ok(match m.get("columns").and_then(Value::as_mapping) {
        Some(columns) => ColumnLayout::from_mapping(columns),
        None => ColumnLayout::default(),
    })
}

impl ChecklistConfig {
    pub fn from_value(name: &str, v: &Value) -> Result<Self> {
        let m = v
            .as_mapping()
            .ok_or_else(|| ChecklistError::Config(format!("[{name}] checklist must be a mapping")))?;

        let meta = match m.get("meta") {
            Some(meta) => ChecklistMeta::from_value(name, meta)?,
            None => ChecklistMeta::default(),
        };

        let mut column_sets = BTreeMap::new();
        let mut invalid_column_sets = BTreeMap::new();
        if let Some(sets) = section(name, m, "column_sets")? {
            for (k, v) in sets {
                let alias = render_value(k);
                match v.as_mapping() {
                    Some(mapping) => {
                        column_sets.insert(alias, MappingDecl::from_mapping(mapping));
                    }
                    None => {
                        invalid_column_sets.insert(alias, render_value(v));
                    }
                }
            }
        }

        let mut sheets = BTreeMap::new();
        if let Some(defs) = section(name, m, "sheets")? {
            for (k, v) in defs {
                let idx = index_key(k).ok_or_else(|| {
                    ChecklistError::Config(format!(
                        "[{name}] sheet key '{}' must be a sheet index",
                        render_value(k)
                    ))
                })?;
                sheets.insert(idx, SheetDef::from_value(name, idx, v)?);
            }
        }

        Ok(Self { meta, column_sets, invalid_column_sets, sheets })
    }

    /// Sheet definition whose name matches case-insensitively.
    pub fn sheet_named(&self, sheet_name: &str) -> Option<&SheetDef> {
        let wanted = sheet_name.trim().to_lowercase();
        self.sheets.values().find(|s| s.name.trim().to_lowercase() == wanted)
    }
}

fn section<'a>(checklist: &str, m: &'a Mapping, key: &str) -> Result<Option<&'a Mapping>> {
    match m.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(inner)) => Ok(Some(inner)),
        Some(_) => Err(ChecklistError::Config(format!("[{checklist}] '{key}' must be a mapping"))),
    }
}

impl ChecklistMeta {
    pub fn from_value(checklist: &str, v: &Value) -> Result<Self> {
        let m = v
            .as_mapping()
            .ok_or_else(|| ChecklistError::Config(format!("[{checklist}] 'meta' must be a mapping")))?;
        let text = |key: &str| m.get(key).and_then(scalar_string);

        let (columns, invalid_columns) = match m.get("columns") {
            None | Some(Value::Null) => (None, None),
            Some(Value::Mapping(columns)) => (Some(ColumnLayout::from_mapping(columns)), None),
            Some(other) => (None, Some(render_value(other))),
        };

        Ok(Self {
            year: text("year"),
            brand: text("brand"),
            set_name: text("set_name"),
            sport: text("sport"),
            source_file: text("source_file"),
            last_modified: text("last_modified"),
            checksum: text("checksum"),
            columns,
            invalid_columns,
        })
    }
}

impl SheetDef {
    pub fn from_value(checklist: &str, idx: usize, v: &Value) -> Result<Self> {
        let m = v.as_mapping().ok_or_else(|| {
            ChecklistError::Config(format!("[{checklist}] sheet {idx} must be a mapping"))
        })?;

        let name = m
            .get("name")
            .and_then(scalar_string)
            .unwrap_or_else(|| format!("Sheet{idx}"));

        let columns = m.get("columns").and_then(ColumnsSpec::from_value);

        let mut intentional_gaps = vec![];
        let mut invalid_gaps = vec![];
        match m.get("intentional_gaps") {
            None | Some(Value::Null) => {}
            Some(Value::Sequence(gaps)) => {
                for gap in gaps {
                    match index_key(gap) {
                        Some(idx) => intentional_gaps.push(idx),
                        None => invalid_gaps.push(render_value(gap)),
                    }
                }
            }
            Some(other) => invalid_gaps.push(render_value(other)),
        }

        Ok(Self { name, columns, intentional_gaps, invalid_gaps })
    }
}

/// Strings, numbers and bools as text; anything else is absent.
pub fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Printable form of any value, for keys and diagnostics.
pub fn render_value(v: &Value) -> String {
    match scalar_string(v) {
        Some(s) => s,
        None if v.is_null() => "null".to_string(),
        None => serde_yaml::to_string(v)
            .map(|s| s.trim().replace('\n', " "))
            .unwrap_or_else(|_| format!("{v:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RowTag;

    const DOC: &str = r#"
defaults:
  columns:
    cards:
      0: card_number
      1: player_name
      2: team_name
      3: print_run
    subset:
      0: subset_name
    parallel:
      0: parallel_name

2024-Panini-Select-Football-Checklist:
  meta:
    sport: Football
    year: 2024
    brand: Panini
    set_name: Select
    source_file: 2024-Panini-Select-Football-Checklist.xlsx
    checksum: "sha256:abc"
  column_sets:
    with_subset_skip4:
      0: subset_name
      1: card_number
      2: player_name
      3: team_name
      5: print_run
  sheets:
    0:
      name: Base
    5:
      name: Teams
      columns: with_subset_skip4
      intentional_gaps:
        - 4
"#;

    #[test]
    fn test_parse_document() {
        let doc = ConfigDocument::from_yaml_str(DOC).unwrap();
        assert_eq!(doc.checklists.len(), 1);
        assert!(doc.defaults.for_tag(RowTag::Parallel).is_some());

        let c = doc.checklist("2024-Panini-Select-Football-Checklist").unwrap();
        assert_eq!(c.meta.year.as_deref(), Some("2024"));
        assert_eq!(c.meta.brand.as_deref(), Some("Panini"));
        assert_eq!(c.meta.checksum.as_deref(), Some("sha256:abc"));
        assert!(c.meta.columns.is_none());
        assert_eq!(c.column_sets["with_subset_skip4"].columns.len(), 5);

        let teams = c.sheet_named("TEAMS").unwrap();
        assert_eq!(teams.columns, Some(ColumnsSpec::Alias("with_subset_skip4".into())));
        assert_eq!(teams.intentional_gaps, vec![4]);
        assert!(c.sheet_named("Autographs").is_none());
    }

    #[test]
    fn test_json_document_with_string_indices() {
        let doc = ConfigDocument::from_json_str(
            r#"{"X": {"meta": {"year": 2023, "brand": "Topps", "set_name": "Chrome"},
                      "sheets": {"0": {"name": "Base", "columns": {"0": "card_number"}}}}}"#,
        )
        .unwrap();
        let sheet = doc.checklist("X").unwrap().sheet_named("base").unwrap();
        match &sheet.columns {
            Some(ColumnsSpec::Inline(ColumnLayout::Flat(decl))) => {
                assert_eq!(decl.columns.get(0), Some("card_number"))
            }
            other => panic!("unexpected columns: {other:?}"),
        }
    }

    #[test]
    fn test_unnamed_sheet_gets_positional_name() {
        let doc = ConfigDocument::from_yaml_str("X:\n  sheets:\n    2: {}\n").unwrap();
        assert_eq!(doc.checklist("X").unwrap().sheets[&2].name, "Sheet2");
    }

    #[test]
    fn test_misshapen_columns_and_gaps_are_kept() {
        let doc = ConfigDocument::from_yaml_str(
            "X:\n  meta:\n    columns: 5\n  column_sets:\n    a: 3\n    b:\n      0: card_number\n  sheets:\n    0:\n      name: Base\n      intentional_gaps: [4, four]\n    1:\n      name: Teams\n      intentional_gaps: 7\n",
        )
        .unwrap();
        let c = doc.checklist("X").unwrap();
        assert!(c.meta.columns.is_none());
        assert_eq!(c.meta.invalid_columns.as_deref(), Some("5"));
        assert_eq!(c.column_sets.len(), 1);
        assert_eq!(c.invalid_column_sets["a"], "3");

        let base = c.sheet_named("Base").unwrap();
        assert_eq!(base.intentional_gaps, vec![4]);
        assert_eq!(base.invalid_gaps, vec!["four".to_string()]);
        assert_eq!(c.sheet_named("Teams").unwrap().invalid_gaps, vec!["7".to_string()]);
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            ConfigDocument::from_yaml_str("- a\n- b\n"),
            Err(ChecklistError::Config(_))
        ));
        assert!(matches!(
            ConfigDocument::from_yaml_str("X:\n  sheets:\n    first:\n      name: Base\n"),
            Err(ChecklistError::Config(_))
        ));
        assert!(matches!(
            ConfigDocument::from_yaml_str("X: [unclosed"),
            Err(ChecklistError::Parse(_))
        ));
    }
}
