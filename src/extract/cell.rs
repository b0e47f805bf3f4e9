use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::extract::coerce::{format_number, string_to_number};

/// A coerced table cell
///
/// The variant is decided once during coercion; nothing downstream
/// re-inspects a cell to guess what it holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    String(String),
    /// May be NaN when the source value was not numeric
    Number(f64),
    Boolean(bool),
    /// `None` is an unparseable date
    Date(Option<DateTime<Utc>>),
    /// Canonical JSON text of a non-primitive value
    RawText(String),
}

/// One table row, aligned with the column list
pub type Row = Vec<Cell>;

impl Cell {
    /// Final cell encoding: primitives pass through, everything else
    /// becomes its canonical JSON text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Cell::String(s),
            Value::Number(n) => Cell::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::Bool(b) => Cell::Boolean(b),
            other => Cell::RawText(other.to_string()),
        }
    }

    /// Text rendering used by filters
    pub fn text(&self) -> String {
        match self {
            Cell::String(s) | Cell::RawText(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Boolean(b) => b.to_string(),
            Cell::Date(Some(dt)) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            Cell::Date(None) => "Invalid Date".to_string(),
        }
    }

    /// Numeric reading of the cell; dates read as epoch milliseconds
    pub fn number(&self) -> f64 {
        match self {
            Cell::Number(n) => *n,
            Cell::Boolean(b) => f64::from(u8::from(*b)),
            Cell::Date(Some(dt)) => dt.timestamp_millis() as f64,
            Cell::Date(None) => f64::NAN,
            Cell::String(s) | Cell::RawText(s) => string_to_number(s),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::String(s) | Cell::RawText(s) => serializer.serialize_str(s),
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Boolean(b) => serializer.serialize_bool(*b),
            Cell::Date(Some(dt)) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Cell::Date(None) => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_encoding() {
        assert_eq!(Cell::from_value(json!("a")), Cell::String("a".into()));
        assert_eq!(Cell::from_value(json!(2.5)), Cell::Number(2.5));
        assert_eq!(Cell::from_value(json!(true)), Cell::Boolean(true));
        assert_eq!(Cell::from_value(json!(null)), Cell::RawText("null".into()));
        assert_eq!(
            Cell::from_value(json!({"b": 1, "a": [1, 2]})),
            Cell::RawText(r#"{"b":1,"a":[1,2]}"#.into())
        );
    }

    #[test]
    fn test_serialize_cells() {
        let date = DateTime::from_timestamp_millis(1_700_000_000_000);
        let row = vec![
            Cell::String("x".into()),
            Cell::Number(3.0),
            Cell::Number(f64::NAN),
            Cell::Date(date),
            Cell::Date(None),
        ];
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!(["x", 3.0, null, "2023-11-14T22:13:20.000Z", null])
        );
    }

    #[test]
    fn test_text_and_number() {
        assert_eq!(Cell::Number(20.0).text(), "20");
        assert_eq!(Cell::Boolean(false).number(), 0.0);
        assert_eq!(Cell::String(" 12 ".into()).number(), 12.0);
        assert!(Cell::Date(None).number().is_nan());
    }
}
