//! Structural validation of a configuration document.
//!
//! Runs once before any ingestion. Problems are collected as diagnostics and
//! mirrored to the log; nothing is raised.

use crate::columns::{ColumnLayout, ColumnsSpec, MalformedEntry};
use crate::{ChecklistConfig, ChecklistError, ConfigDocument, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingMeta { field: String },
    UnknownAlias { alias: String },
    InvalidColumns { value: String },
    MetaColumnsNotMapping { value: String },
    ColumnSetNotMapping { alias: String, value: String },
    InvalidGap { value: String },
    GapConflict { index: usize },
    IntentionalGap { index: usize },
    SectionNotMapping { section: String },
    NonIntegerIndex { section: String, index: String },
    NonStringField { section: String, index: usize, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub checklist: String,
    pub sheet: Option<String>,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "[{}:{}] ", self.checklist, sheet)?,
            None => write!(f, "[{}] ", self.checklist)?,
        }
        match &self.kind {
            DiagnosticKind::MissingMeta { field } => write!(f, "meta is missing '{field}'"),
            DiagnosticKind::UnknownAlias { alias } => write!(f, "Unknown column alias '{alias}'"),
            DiagnosticKind::InvalidColumns { value } => {
                write!(f, "columns must be a column set name or a mapping, got {value}")
            }
            DiagnosticKind::MetaColumnsNotMapping { value } => {
                write!(f, "meta columns must be a mapping, got {value}")
            }
            DiagnosticKind::ColumnSetNotMapping { alias, value } => {
                write!(f, "Column set '{alias}' must be a mapping, got {value}")
            }
            DiagnosticKind::InvalidGap { value } => {
                write!(f, "Intentional gap '{value}' is not a column index")
            }
            DiagnosticKind::GapConflict { index } => {
                write!(f, "Gap declared but column present at index {index}")
            }
            DiagnosticKind::IntentionalGap { index } => write!(f, "Index {index} intentionally blank"),
            DiagnosticKind::SectionNotMapping { section } => {
                write!(f, "Section '{section}' must be a mapping")
            }
            DiagnosticKind::NonIntegerIndex { section, index } => {
                write!(f, "Non-integer column index '{index}' in section '{section}'")
            }
            DiagnosticKind::NonStringField { section, index, value } => write!(
                f,
                "Non-string column name at index {index} in section '{section}': {value}"
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    fn push(&mut self, severity: Severity, checklist: &str, sheet: Option<&str>, kind: DiagnosticKind) {
        let d = Diagnostic {
            severity,
            checklist: checklist.to_string(),
            sheet: sheet.map(str::to_string),
            kind,
        };
        match severity {
            Severity::Error => error!("{d}"),
            Severity::Info => info!("{d}"),
        }
        self.diagnostics.push(d);
    }
}

pub fn validate_config(doc: &ConfigDocument) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (name, checklist) in &doc.checklists {
        info!(checklist=%name, "validating checklist");
        validate_checklist(&mut report, name, checklist);
    }

    if report.passed() {
        info!("config validation PASSED");
    } else {
        error!(errors = report.error_count(), "config validation FAILED");
    }
    report
}

fn validate_checklist(report: &mut ValidationReport, name: &str, checklist: &ChecklistConfig) {
    let meta = &checklist.meta;
    for (field, value) in [("year", &meta.year), ("brand", &meta.brand), ("set_name", &meta.set_name)] {
        if value.is_none() {
            report.push(
                Severity::Error,
                name,
                None,
                DiagnosticKind::MissingMeta { field: field.to_string() },
            );
        }
    }

    if let Some(value) = &meta.invalid_columns {
        report.push(
            Severity::Error,
            name,
            None,
            DiagnosticKind::MetaColumnsNotMapping { value: value.clone() },
        );
    }
    for (alias, value) in &checklist.invalid_column_sets {
        report.push(
            Severity::Error,
            name,
            None,
            DiagnosticKind::ColumnSetNotMapping { alias: alias.clone(), value: value.clone() },
        );
    }

    for sheet in checklist.sheets.values() {
        let sheet_name = Some(sheet.name.as_str());

        for value in &sheet.invalid_gaps {
            report.push(
                Severity::Error,
                name,
                sheet_name,
                DiagnosticKind::InvalidGap { value: value.clone() },
            );
        }

        let flat;
        let layout: Option<&ColumnLayout> = match &sheet.columns {
            Some(ColumnsSpec::Alias(alias)) => match checklist.column_sets.get(alias) {
                Some(decl) => {
                    flat = ColumnLayout::Flat(decl.clone());
                    Some(&flat)
                }
                // already reported against the column set
                None if checklist.invalid_column_sets.contains_key(alias) => continue,
                None => {
                    report.push(
                        Severity::Error,
                        name,
                        sheet_name,
                        DiagnosticKind::UnknownAlias { alias: alias.clone() },
                    );
                    continue;
                }
            },
            Some(ColumnsSpec::Inline(layout)) => Some(layout),
            Some(ColumnsSpec::Invalid(value)) => {
                report.push(
                    Severity::Error,
                    name,
                    sheet_name,
                    DiagnosticKind::InvalidColumns { value: value.clone() },
                );
                continue;
            }
            None => meta.columns.as_ref(),
        };

        for &gap in &sheet.intentional_gaps {
            if layout.is_some_and(|l| l.declares_index(gap)) {
                report.push(Severity::Error, name, sheet_name, DiagnosticKind::GapConflict { index: gap });
            } else {
                report.push(Severity::Info, name, sheet_name, DiagnosticKind::IntentionalGap { index: gap });
            }
        }

        let Some(layout) = layout else { continue };

        for section in layout.invalid_sections() {
            report.push(
                Severity::Error,
                name,
                sheet_name,
                DiagnosticKind::SectionNotMapping { section: section.clone() },
            );
        }

        for (section, decl) in layout.mappings() {
            for entry in &decl.malformed {
                let kind = match entry {
                    MalformedEntry::NonIntegerIndex { index } => DiagnosticKind::NonIntegerIndex {
                        section: section.to_string(),
                        index: index.clone(),
                    },
                    MalformedEntry::NonStringField { index, value } => DiagnosticKind::NonStringField {
                        section: section.to_string(),
                        index: *index,
                        value: value.clone(),
                    },
                };
                report.push(Severity::Error, name, sheet_name, kind);
            }
            for (idx, field) in decl.columns.iter() {
                debug!(checklist=%name, sheet=%sheet.name, section, idx, field, "column OK");
            }
        }
    }
}

/// A document that passed validation. Ingestion only accepts this type, so an
/// invalid configuration cannot be ingested by accident.
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    doc: ConfigDocument,
    report: ValidationReport,
}

impl ValidatedConfig {
    pub fn new(doc: ConfigDocument) -> Result<Self> {
        let report = validate_config(&doc);
        if !report.passed() {
            return Err(ChecklistError::InvalidConfig {
                errors: report.errors().map(ToString::to_string).collect(),
            });
        }
        Ok(Self { doc, report })
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.doc
    }

    /// Informational notes gathered while validating.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(report: &ValidationReport, pred: impl Fn(&DiagnosticKind) -> bool) -> usize {
        report.diagnostics.iter().filter(|d| pred(&d.kind)).count()
    }

    const META: &str = "  meta:\n    year: 2024\n    brand: Panini\n    set_name: Select\n";

    #[test]
    fn test_valid_config_passes() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}  column_sets:\n    default:\n      0: set_name\n      3: subset_name\n  sheets:\n    0:\n      name: Base\n      columns: default\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert!(report.passed());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_alias() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}  sheets:\n    0:\n      name: Base\n      columns: aliasX\n      intentional_gaps: [4]\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert!(!report.passed());
        assert_eq!(count(&report, |k| matches!(k, DiagnosticKind::UnknownAlias { .. })), 1);
        // further checks for that sheet are skipped
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].sheet.as_deref(), Some("Base"));
    }

    #[test]
    fn test_gaps() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}  column_sets:\n    skip4:\n      0: subset_name\n      5: print_run\n  sheets:\n    0:\n      name: Teams\n      columns: skip4\n      intentional_gaps: [4, 5]\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert_eq!(report.error_count(), 1);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::GapConflict { index: 5 } && d.severity == Severity::Error));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::IntentionalGap { index: 4 } && d.severity == Severity::Info));
    }

    #[test]
    fn test_malformed_mappings() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}    columns:\n      cards:\n        0: card_number\n        1: 7\n        x: team_name\n      subset: 3\n  sheets:\n    0:\n      name: Base\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert_eq!(report.error_count(), 3);
        assert_eq!(count(&report, |k| matches!(k, DiagnosticKind::SectionNotMapping { .. })), 1);
        assert_eq!(
            count(&report, |k| matches!(k, DiagnosticKind::NonStringField { index: 1, .. })),
            1
        );
        assert_eq!(count(&report, |k| matches!(k, DiagnosticKind::NonIntegerIndex { .. })), 1);
    }

    #[test]
    fn test_meta_columns_not_a_mapping() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}    columns: 5\n  sheets:\n    0:\n      name: Base\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert_eq!(report.error_count(), 1);
        let d = &report.diagnostics[0];
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.kind, DiagnosticKind::MetaColumnsNotMapping { value: "5".into() });
        assert_eq!(d.to_string(), "[X] meta columns must be a mapping, got 5");
    }

    #[test]
    fn test_bad_column_set_does_not_hide_other_checklists() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}  column_sets:\n    a: 3\n  sheets:\n    0:\n      name: Base\n      columns: a\nY:\n{META}  sheets:\n    0:\n      name: Base\n      columns: nope\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert_eq!(report.error_count(), 2);
        assert!(report.diagnostics.iter().any(|d| d.checklist == "X"
            && d.kind == DiagnosticKind::ColumnSetNotMapping { alias: "a".into(), value: "3".into() }));
        assert!(report.diagnostics.iter().any(|d| d.checklist == "Y"
            && d.kind == DiagnosticKind::UnknownAlias { alias: "nope".into() }));
    }

    #[test]
    fn test_gap_that_is_not_an_index() {
        let doc = ConfigDocument::from_yaml_str(&format!(
            "X:\n{META}  sheets:\n    0:\n      name: Base\n      intentional_gaps: [four, 5]\n    1:\n      name: Teams\n      intentional_gaps: 7\n"
        ))
        .unwrap();
        let report = validate_config(&doc);
        assert_eq!(report.error_count(), 2);
        assert!(report.diagnostics.iter().any(|d| d.sheet.as_deref() == Some("Base")
            && d.kind == DiagnosticKind::InvalidGap { value: "four".into() }));
        assert!(report.diagnostics.iter().any(|d| d.sheet.as_deref() == Some("Teams")
            && d.kind == DiagnosticKind::InvalidGap { value: "7".into() }));
        // the well-formed gap is still noted
        assert_eq!(count(&report, |k| *k == DiagnosticKind::IntentionalGap { index: 5 }), 1);
    }

    #[test]
    fn test_missing_meta_and_invalid_columns() {
        let doc = ConfigDocument::from_yaml_str(
            "X:\n  meta:\n    year: 2024\n  sheets:\n    0:\n      name: Base\n      columns: 12\n",
        )
        .unwrap();
        let report = validate_config(&doc);
        assert_eq!(count(&report, |k| matches!(k, DiagnosticKind::MissingMeta { .. })), 2);
        assert_eq!(count(&report, |k| matches!(k, DiagnosticKind::InvalidColumns { .. })), 1);
    }

    #[test]
    fn test_validated_config_rejects_invalid() {
        let doc = ConfigDocument::from_yaml_str(
            "X:\n  sheets:\n    0:\n      name: Base\n      columns: nope\n",
        )
        .unwrap();
        match ValidatedConfig::new(doc) {
            Err(ChecklistError::InvalidConfig { errors }) => {
                assert!(errors.iter().any(|e| e.contains("Unknown column alias 'nope'")))
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            severity: Severity::Error,
            checklist: "X".into(),
            sheet: Some("Teams".into()),
            kind: DiagnosticKind::GapConflict { index: 4 },
        };
        assert_eq!(d.to_string(), "[X:Teams] Gap declared but column present at index 4");
    }
}
