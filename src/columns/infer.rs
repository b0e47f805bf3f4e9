//! Column inference from a sample record
//!
//! Used when a query declares no columns for a source whose records can be
//! introspected key by key.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::query::{ColumnFormat, ColumnSpec, Selector};

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap()
});

/// Propose a column list from one example record.
///
/// * objects: one column per key, in key order
/// * scalars: a single `value` column over the raw record
/// * arrays and null: nothing
pub fn infer_columns(sample: &Value) -> Vec<ColumnSpec> {
    match sample {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| ColumnSpec::new(key.clone(), Selector::path(key.clone()), infer_format(value)))
            .collect(),
        Value::Array(_) | Value::Null => Vec::new(),
        scalar => vec![ColumnSpec::new("value", Selector::RawRecord, infer_format(scalar))],
    }
}

fn infer_format(value: &Value) -> ColumnFormat {
    match value {
        Value::Number(_) => ColumnFormat::Number,
        Value::String(s) if is_timestamp(s) => ColumnFormat::Timestamp,
        _ => ColumnFormat::String,
    }
}

/// Only ISO shaped text counts; free-form dates stay strings
fn is_timestamp(s: &str) -> bool {
    let len = s.len();
    if len == 10 && s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-' {
        return ISO_DATE_REGEX.is_match(s);
    }
    len >= 16 && ISO_DATETIME_REGEX.is_match(s)
}
