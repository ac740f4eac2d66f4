use crate::{file_name, Result};
use checklist::headers::is_header_row;
use checklist::{checklist_key, Cell, RawRow, Sheet, Workbook};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One sheet named after the file stem. Rows may differ in length; a leading
/// header row is dropped only when every cell is a known header.
pub fn read_csv(path: &Path) -> Result<Workbook> {
    let file = std::fs::File::open(path)?;
    let name = file_name(path);
    let rows = parse_csv(file)?;
    let sheet = Sheet::new(checklist_key(&name), rows);
    Ok(Workbook::new(name, vec![sheet]))
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = record
            .iter()
            .map(|v| if v.trim().is_empty() { Cell::Empty } else { Cell::from(v) })
            .collect();
        rows.push(row);
    }

    if rows.first().is_some_and(is_header_row) {
        debug!("dropping csv header row");
        rows.remove(0);
    }
    Ok(rows)
}
