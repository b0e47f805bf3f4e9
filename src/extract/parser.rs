use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::columns::ColumnPartition;
use crate::error::{ParseError, Result};
use crate::extract::cell::Row;
use crate::extract::records::RecordSet;
use crate::extract::series::{self, SeriesEntry};
use crate::extract::table;
use crate::path;
use crate::query::{ColumnSpec, QueryDescriptor, SourceType};

/// Per-source capabilities the extraction pipeline composes over.
///
/// Each stage takes its input by reference and returns a fresh value; a
/// parser holds no state between calls.
pub trait SourceParser {
    /// Locate the records inside the raw document
    fn resolve_root(&self, document: Value, query: &QueryDescriptor) -> Option<Value>;

    /// Split a resolved root into records
    fn records<'a>(&self, root: Option<&'a Value>, query: &QueryDescriptor) -> RecordSet<'a>;

    /// Coerce records into rows, zero-length rows already dropped
    fn build_table(&self, records: &RecordSet<'_>, columns: &[ColumnSpec]) -> Vec<Row>;

    /// Emit ungrouped series entries
    fn build_series(
        &self,
        records: &RecordSet<'_>,
        partition: &ColumnPartition<'_>,
        end_time: DateTime<Utc>,
    ) -> Vec<SeriesEntry>;
}

/// Parser for JSON documents, also used for GraphQL responses
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl SourceParser for JsonParser {
    fn resolve_root(&self, document: Value, query: &QueryDescriptor) -> Option<Value> {
        path::resolve_root(document, query.root_selector.as_deref())
    }

    fn records<'a>(&self, root: Option<&'a Value>, query: &QueryDescriptor) -> RecordSet<'a> {
        RecordSet::from_root(root, query.root_is_not_array())
    }

    fn build_table(&self, records: &RecordSet<'_>, columns: &[ColumnSpec]) -> Vec<Row> {
        let rows = match records {
            RecordSet::Empty => Vec::new(),
            RecordSet::Single(record) => vec![table::build_single_row(record, columns)],
            RecordSet::Many(records) => table::build_rows(records, columns),
        };
        table::prune_empty(rows)
    }

    fn build_series(
        &self,
        records: &RecordSet<'_>,
        partition: &ColumnPartition<'_>,
        end_time: DateTime<Utc>,
    ) -> Vec<SeriesEntry> {
        match records {
            RecordSet::Many(records) => series::build_series(records, partition, end_time),
            RecordSet::Empty | RecordSet::Single(_) => Vec::new(),
        }
    }
}

/// Pick the parser for a source type
pub fn parser_for(source: SourceType) -> Result<Box<dyn SourceParser>> {
    match source {
        SourceType::Json | SourceType::Graphql => Ok(Box::new(JsonParser)),
        other => Err(ParseError::UnsupportedSource(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ColumnFormat;
    use serde_json::json;

    #[test]
    fn test_parser_selection() {
        assert!(parser_for(SourceType::Json).is_ok());
        assert!(parser_for(SourceType::Graphql).is_ok());
        assert!(matches!(
            parser_for(SourceType::Xml),
            Err(ParseError::UnsupportedSource(SourceType::Xml))
        ));
    }

    #[test]
    fn test_single_record_has_no_series() {
        let root = json!({"v": 1});
        let query = QueryDescriptor::new(SourceType::Json);
        let records = JsonParser.records(Some(&root), &query);
        let columns = vec![ColumnSpec::new("v", "v", ColumnFormat::Number)];

        let entries = JsonParser.build_series(&records, &ColumnPartition::new(&columns), Utc::now());
        assert!(entries.is_empty());
        assert_eq!(JsonParser.build_table(&records, &columns).len(), 1);
    }

    #[test]
    fn test_no_columns_yields_no_rows() {
        let root = json!([{"v": 1}, {"v": 2}]);
        let query = QueryDescriptor::new(SourceType::Json);
        let records = JsonParser.records(Some(&root), &query);
        assert!(JsonParser.build_table(&records, &[]).is_empty());
    }
}
