use log::debug;

use crate::columns::infer::infer_columns;
use crate::extract::records::RecordSet;
use crate::query::{ColumnFormat, ColumnSpec, QueryDescriptor};

/// Decide the columns an extraction uses.
///
/// Declared columns always win. Without them, sources that support
/// auto-columns infer a list from the first record; other sources get none.
pub fn derive_columns(records: &RecordSet<'_>, query: &QueryDescriptor) -> Vec<ColumnSpec> {
    if !query.columns.is_empty() {
        return query.columns.clone();
    }

    if !query.source.supports_auto_columns() {
        return Vec::new();
    }

    match records.sample() {
        Some(sample) => {
            let columns = infer_columns(sample);
            debug!("inferred {} columns from the first record", columns.len());
            columns
        }
        None => Vec::new(),
    }
}

/// Columns split by role, each in declaration order
#[derive(Debug, Clone, Default)]
pub struct ColumnPartition<'a> {
    /// Label columns joined into series names
    pub strings: Vec<&'a ColumnSpec>,
    /// Metric columns, one series entry per record each
    pub numbers: Vec<&'a ColumnSpec>,
    /// Any timestamp variant; only the first one is used for points
    pub times: Vec<&'a ColumnSpec>,
}

impl<'a> ColumnPartition<'a> {
    pub fn new(columns: &'a [ColumnSpec]) -> Self {
        let mut partition = ColumnPartition::default();
        for column in columns {
            match column.format {
                ColumnFormat::String => partition.strings.push(column),
                ColumnFormat::Number => partition.numbers.push(column),
                ColumnFormat::Timestamp
                | ColumnFormat::TimestampEpoch
                | ColumnFormat::TimestampEpochSeconds => partition.times.push(column),
            }
        }
        partition
    }
}
