//! Extraction pipeline - document in, table or time series out
//!
//! An extraction threads immutable values through a fixed sequence:
//! normalize the document, resolve the root, split records, derive
//! columns, then build rows (filtered) or series (grouped).

pub mod cell;
pub mod coerce;
pub mod parser;
pub mod records;
pub mod result;
pub mod series;
pub mod table;

pub use cell::{Cell, Row};
pub use parser::{parser_for, JsonParser, SourceParser};
pub use records::{Record, RecordKey, RecordSet};
pub use result::{QueryResult, SeriesPoint, TableResult, TimeSeries};
pub use series::SeriesEntry;

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;

use crate::columns::{derive_columns, ColumnPartition};
use crate::error::{ParseError, Result};
use crate::query::{FieldFilter, QueryDescriptor, QueryFormat, RowFilter};

/// Configuration for extraction
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
    /// Timestamp given to series points when the query has no time column.
    /// Defaults to the current instant, which makes series output
    /// non-deterministic; set it wherever repeatable output matters.
    pub end_time: Option<DateTime<Utc>>,
}

impl ExtractConfig {
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }
}

/// Runs extractions with a fixed config and row filter
pub struct Extractor<F: RowFilter = FieldFilter> {
    config: ExtractConfig,
    filter: F,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Extractor {
            config,
            filter: FieldFilter,
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(ExtractConfig::default())
    }
}

impl<F: RowFilter> Extractor<F> {
    /// Swap the row filter used for table output
    pub fn with_filter<G: RowFilter>(self, filter: G) -> Extractor<G> {
        Extractor {
            config: self.config,
            filter,
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Shape one document according to `query`.
    ///
    /// Fails only for structural problems: a document that is a string but
    /// not valid JSON text, or a source type with no parser.
    pub fn extract(&self, document: Value, query: &QueryDescriptor) -> Result<QueryResult> {
        let parser = parser_for(query.source)?;
        let document = normalize_document(document)?;

        let root = parser.resolve_root(document, query);
        let records = parser.records(root.as_ref(), query);
        let columns = derive_columns(&records, query);
        debug!(
            "extracting {} records with {} columns as {:?}",
            records.len(),
            columns.len(),
            query.format
        );

        match query.format {
            QueryFormat::Table => {
                let mut rows = parser.build_table(&records, &columns);
                if query.should_filter() {
                    rows = self.filter.filter_rows(rows, &columns, &query.filters);
                }
                Ok(QueryResult::Table(TableResult { columns, rows }))
            }
            QueryFormat::TimeSeries => {
                let partition = ColumnPartition::new(&columns);
                let end_time = self.config.end_time.unwrap_or_else(Utc::now);
                let entries = parser.build_series(&records, &partition, end_time);
                let series = series::group_series(entries);
                debug!("grouped series into {} targets", series.len());
                Ok(QueryResult::TimeSeries(series))
            }
        }
    }

    /// Parse `text` as JSON and extract from it
    pub fn extract_str(&self, text: &str, query: &QueryDescriptor) -> Result<QueryResult> {
        let document = serde_json::from_str(text).map_err(ParseError::MalformedDocument)?;
        self.extract(document, query)
    }
}

/// A document that arrives as a JSON string is JSON text still to be parsed
pub fn normalize_document(document: Value) -> Result<Value> {
    match document {
        Value::String(text) => serde_json::from_str(&text).map_err(ParseError::MalformedDocument),
        other => Ok(other),
    }
}
