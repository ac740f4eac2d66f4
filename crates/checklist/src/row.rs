//! Position-addressed rows as produced by spreadsheet, CSV and JSON readers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One cell value. Readers keep the native type; classification only ever sees
/// the trimmed string form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            // spreadsheets store card numbers like 501 as 501.0
            Cell::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// A fixed sequence of cells addressed by column index. No header row is
/// assumed, so every accessor is total: out-of-range and empty cells read as "".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: Vec<Cell>,
}

impl RawRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Trimmed text of the cell at `idx`.
    pub fn get(&self, idx: usize) -> String {
        match self.cells.get(idx) {
            Some(cell) => cell.to_string().trim().to_string(),
            None => String::new(),
        }
    }

    pub fn is_blank(&self, idx: usize) -> bool {
        self.get(idx).is_empty()
    }

    pub fn is_filled(&self, idx: usize) -> bool {
        !self.is_blank(idx)
    }

    pub fn is_all_blank(&self) -> bool {
        (0..self.cells.len()).all(|i| self.is_blank(i))
    }
}

impl<T: Into<Cell>> FromIterator<T> for RawRow {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Rows of one worksheet in source order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self { name: name.into(), rows }
    }
}

/// All sheets read from one contributor file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(file_name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self { file_name: file_name.into(), sheets }
    }

    /// Checklist lookup key: the file name without its extension.
    pub fn checklist_key(&self) -> String {
        checklist_key(&self.file_name)
    }
}

pub fn checklist_key(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}
