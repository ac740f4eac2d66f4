use crate::{read_csv, read_json, read_spreadsheet, Result, SourceError};
use checklist::Workbook;
use std::path::{Path, PathBuf};

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["csv", "json", "xlsx", "xls", "ods"];

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

/// Read a checklist file with the reader for its extension.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    match extension(path).as_deref() {
        Some("csv") => read_csv(path),
        Some("json") => read_json(path),
        Some("xlsx" | "xls" | "ods") => read_spreadsheet(path),
        _ => Err(SourceError::Unsupported(path.display().to_string())),
    }
}

/// Supported files directly inside `dir`, sorted by file name.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("a/Select.XLSX")));
        assert!(is_supported(Path::new("Prizm.csv")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            read_workbook(Path::new("checklist.pdf")),
            Err(SourceError::Unsupported(_))
        ));
    }
}
