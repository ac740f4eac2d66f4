use crate::{file_name, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use checklist::{Cell, RawRow, Sheet, Workbook};
use std::path::Path;
use tracing::debug;

/// Every sheet of an xlsx/xls/ods file, in workbook order.
pub fn read_spreadsheet(path: &Path) -> Result<Workbook> {
    let mut book = open_workbook_auto(path)?;
    let names = book.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = book.worksheet_range(&name)?;
        let rows = range_rows(&range);
        debug!(sheet=%name, rows = rows.len(), "read sheet");
        sheets.push(Sheet::new(name, rows));
    }
    Ok(Workbook::new(file_name(path), sheets))
}

/// Rows with absolute positions: a range that starts below or right of A1 is
/// padded so column 0 is always the sheet's first column.
fn range_rows(range: &Range<Data>) -> Vec<RawRow> {
    let Some((row0, col0)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<RawRow> = (0..row0).map(|_| RawRow::default()).collect();
    for r in range.rows() {
        let mut cells = vec![Cell::Empty; col0 as usize];
        cells.extend(r.iter().map(cell));
        rows.push(RawRow::new(cells));
    }
    rows
}

fn cell(d: &Data) -> Cell {
    match d {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}
