use serde_json::Value;

use crate::extract::cell::{Cell, Row};
use crate::extract::coerce::coerce_cell;
use crate::extract::records::Record;
use crate::path::property;
use crate::query::{ColumnSpec, Selector};

/// One coerced row per record, cells in column order
pub fn build_rows(records: &[Record<'_>], columns: &[ColumnSpec]) -> Vec<Row> {
    records
        .iter()
        .map(|record| columns.iter().map(|column| coerce_cell(record, column)).collect())
        .collect()
}

/// The row for a root read as a single record.
///
/// Selectors are looked up directly with no type coercion. Sentinel
/// selectors have no record to point at here and read as empty.
pub fn build_single_row(record: &Value, columns: &[ColumnSpec]) -> Row {
    columns
        .iter()
        .map(|column| {
            let value = match &column.selector {
                Selector::Path(path) => property::get(record, path).cloned(),
                Selector::Index | Selector::RawRecord => None,
            };
            Cell::from_value(value.unwrap_or_else(|| Value::String(String::new())))
        })
        .collect()
}

pub fn prune_empty(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().filter(|row| !row.is_empty()).collect()
}
