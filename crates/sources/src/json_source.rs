use crate::{file_name, Result, SourceError};
use checklist::headers::{canonical_field, layout_position, CANONICAL_LAYOUT};
use checklist::{checklist_key, Cell, RawRow, Sheet, Workbook};
use serde_json::Value;
use std::path::Path;

/// A JSON checklist is an array of rows. Each row is either an array of cells
/// or an object keyed by header, laid out in canonical column order.
pub fn read_json(path: &Path) -> Result<Workbook> {
    let text = std::fs::read_to_string(path)?;
    let name = file_name(path);
    let rows = parse_json(&text)?;
    let sheet = Sheet::new(checklist_key(&name), rows);
    Ok(Workbook::new(name, vec![sheet]))
}

pub fn parse_json(text: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(SourceError::Format("JSON checklist must be an array of rows".into()));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Array(cells) => Ok(cells.iter().map(cell).collect()),
            Value::Object(obj) => {
                let mut cells = vec![Cell::Empty; CANONICAL_LAYOUT.len()];
                for (header, v) in obj {
                    if let Some(pos) = canonical_field(header).and_then(layout_position) {
                        cells[pos] = cell(v);
                    }
                }
                Ok(RawRow::new(cells))
            }
            other => Err(SourceError::Format(format!(
                "row {} must be an array or an object, got {other}",
                i + 1
            ))),
        })
        .collect()
}

fn cell(v: &Value) -> Cell {
    match v {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Empty),
        },
        Value::String(s) if s.trim().is_empty() => Cell::Empty,
        Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_rows() {
        let rows = parse_json(r#"[["Rookies"], ["Rookies", 12, "John Doe", "Yankees", null]]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(1), "12");
        assert!(rows[1].is_blank(4));
    }

    #[test]
    fn test_object_rows_use_canonical_layout() {
        let rows = parse_json(
            r#"[{"Player": "John Doe", "Card #": "12", "Subset": "Rookies", "Team": "Yankees", "Notes": "x"}]"#,
        )
        .unwrap();
        let row = &rows[0];
        assert_eq!(row.get(0), "Rookies");
        assert_eq!(row.get(1), "12");
        assert_eq!(row.get(2), "John Doe");
        assert_eq!(row.get(3), "Yankees");
        assert!(row.is_blank(4));
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(parse_json(r#"{"rows": []}"#), Err(SourceError::Format(_))));
        assert!(matches!(parse_json("[1]"), Err(SourceError::Format(_))));
    }
}
