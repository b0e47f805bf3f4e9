//! # Crucible - JSON Response Shaping
//!
//! Turns a raw JSON document plus a query descriptor into either a table
//! (named columns, coerced rows) or a set of time series (named targets,
//! `[value, timestamp]` points).
//!
//! ## Modules
//!
//! - **query**: the query descriptor, column specs and row filters
//! - **path**: root resolution via JSONPath or nested property paths
//! - **columns**: declared or inferred columns, split by role
//! - **extract**: coercion, table and series building, the pipeline itself
//!
//! ## Quick Start
//!
//! ### Table
//!
//! ```rust
//! use crucible::{ColumnFormat, ColumnSpec, Extractor, QueryDescriptor, SourceType};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let document = json!({"data": [{"name": "ann", "age": 31}, {"name": "bob", "age": 25}]});
//!
//! let query = QueryDescriptor::new(SourceType::Json)
//!     .with_root_selector("$.data[*]")
//!     .with_columns(vec![
//!         ColumnSpec::new("Name", "name", ColumnFormat::String),
//!         ColumnSpec::new("Age", "age", ColumnFormat::Number),
//!     ]);
//!
//! let result = Extractor::default().extract(document, &query)?;
//! // result.rows = [["ann", 31], ["bob", 25]]
//! # Ok(())
//! # }
//! ```
//!
//! ### Time Series
//!
//! ```rust
//! use crucible::{ColumnFormat, ColumnSpec, ExtractConfig, Extractor, QueryDescriptor, QueryFormat, SourceType};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let document = json!([
//!     {"city": "NY", "temp": 20, "ts": 1700000000},
//!     {"city": "LA", "temp": 25, "ts": 1700000060}
//! ]);
//!
//! let query = QueryDescriptor::new(SourceType::Json)
//!     .with_format(QueryFormat::TimeSeries)
//!     .with_columns(vec![
//!         ColumnSpec::new("City", "city", ColumnFormat::String),
//!         ColumnSpec::new("Temperature", "temp", ColumnFormat::Number),
//!         ColumnSpec::new("Time", "ts", ColumnFormat::TimestampEpochSeconds),
//!     ]);
//!
//! let result = Extractor::new(ExtractConfig::default()).extract(document, &query)?;
//! // one series per city: "NY" and "LA"
//! # Ok(())
//! # }
//! ```

pub mod columns;
pub mod error;
pub mod extract;
pub mod path;
pub mod query;

// Re-export commonly used types for convenience
pub use columns::{derive_columns, infer_columns, ColumnPartition};
pub use error::{ParseError, Result};
pub use extract::{Cell, ExtractConfig, Extractor, QueryResult, Row, SeriesPoint, TableResult, TimeSeries};
pub use query::{
    ColumnFormat, ColumnSpec, FieldFilter, FilterOperator, FilterSpec, QueryDescriptor, QueryFormat, RowFilter,
    Selector, SourceType,
};

/// Main entry point: shape JSON text according to a query
pub fn shape_json(text: &str, query: &QueryDescriptor, config: ExtractConfig) -> Result<QueryResult> {
    Extractor::new(config).extract_str(text, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[test]
    fn test_shape_table_from_text() {
        let query = QueryDescriptor::from_json(
            r#"{
                "type": "json",
                "root_selector": "items",
                "columns": [
                    {"text": "Id", "selector": "$$key", "type": "number"},
                    {"text": "Name", "selector": "name"}
                ]
            }"#,
        )
        .unwrap();

        let result = shape_json(r#"{"items": [{"name": "a"}, {"name": "b"}]}"#, &query, ExtractConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap()["rows"],
            json!([[0.0, "a"], [1.0, "b"]])
        );
    }

    #[test]
    fn test_shape_series_from_text() {
        let query = QueryDescriptor::from_json(
            r#"{
                "type": "json",
                "format": "timeseries",
                "columns": [
                    {"text": "value", "selector": "v", "type": "number"}
                ]
            }"#,
        )
        .unwrap();
        let config = ExtractConfig::default().with_end_time(DateTime::from_timestamp_millis(42).unwrap());

        let result = shape_json(r#"[{"v": 5}, {"v": "6"}]"#, &query, config).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([{"target": "value", "datapoints": [[5.0, 42], [6.0, 42]]}])
        );
    }

    #[test]
    fn test_malformed_text() {
        let query = QueryDescriptor::new(SourceType::Json);
        let err = shape_json("[1, 2", &query, ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument(_)));
    }
}
