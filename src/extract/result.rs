//! Output shapes handed back to the caller

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::extract::cell::Row;
use crate::query::ColumnSpec;

/// One time-series sample
///
/// Serializes as `[value, timestamp_millis]`. A timestamp that could not be
/// parsed is `None` and serializes as null, as does a NaN value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub value: f64,
    pub timestamp_millis: Option<i64>,
}

impl Serialize for SeriesPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.value)?;
        tuple.serialize_element(&self.timestamp_millis)?;
        tuple.end()
    }
}

/// A named series with its points in emission order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub target: String,
    #[serde(rename = "datapoints")]
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResult {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Row>,
}

/// Result of one extraction, shaped by the requested format
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Table(TableResult),
    TimeSeries(Vec<TimeSeries>),
}

impl QueryResult {
    pub fn as_table(&self) -> Option<&TableResult> {
        match self {
            QueryResult::Table(table) => Some(table),
            QueryResult::TimeSeries(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&[TimeSeries]> {
        match self {
            QueryResult::TimeSeries(series) => Some(series),
            QueryResult::Table(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::cell::Cell;
    use crate::query::ColumnFormat;
    use serde_json::json;

    #[test]
    fn test_series_wire_shape() {
        let result = QueryResult::TimeSeries(vec![TimeSeries {
            target: "cpu".into(),
            points: vec![
                SeriesPoint { value: 1.5, timestamp_millis: Some(1000) },
                SeriesPoint { value: f64::NAN, timestamp_millis: None },
            ],
        }]);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([{"target": "cpu", "datapoints": [[1.5, 1000], [null, null]]}])
        );
    }

    #[test]
    fn test_table_wire_shape() {
        let result = QueryResult::Table(TableResult {
            columns: vec![ColumnSpec::new("Name", "name", ColumnFormat::String)],
            rows: vec![vec![Cell::String("a".into())]],
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["rows"], json!([["a"]]));
        assert_eq!(value["columns"][0]["text"], json!("Name"));
        assert!(result.as_table().is_some());
        assert!(result.as_series().is_none());
    }
}
