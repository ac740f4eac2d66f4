//! Readers that turn checklist files into [`checklist::Workbook`]s.

pub mod checksum;
pub mod csv_source;
pub mod dispatch;
pub mod json_source;
pub mod xlsx_source;

pub use checksum::*;
pub use csv_source::read_csv;
pub use dispatch::*;
pub use json_source::read_json;
pub use xlsx_source::read_spreadsheet;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// File name without directories, as used for checklist lookup and provenance.
pub(crate) fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
