//! Time series construction
//!
//! Every (numeric column, record) pair emits one single-point entry; entries
//! sharing a target are then merged. Points keep emission order and are
//! never sorted by time.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use crate::columns::ColumnPartition;
use crate::extract::coerce::{coerce_timestamp, extract, to_number, value_text};
use crate::extract::records::Record;
use crate::extract::result::{SeriesPoint, TimeSeries};

/// A single emitted point and the series it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub target: String,
    pub point: SeriesPoint,
}

/// Emit one entry per numeric column per record, numeric columns outermost
pub fn build_series(
    records: &[Record<'_>],
    partition: &ColumnPartition<'_>,
    end_time: DateTime<Utc>,
) -> Vec<SeriesEntry> {
    let default_millis = end_time.timestamp_millis();
    let many_numbers = partition.numbers.len() > 1;
    let mut entries = Vec::with_capacity(partition.numbers.len() * records.len());

    for number in &partition.numbers {
        for record in records {
            let mut target = series_label(record, partition);
            if many_numbers {
                target.push(' ');
                target.push_str(&number.text);
            } else if target.is_empty() {
                target = number.text.clone();
            }

            let timestamp_millis = match partition.times.first() {
                Some(time) => {
                    let raw = extract(record, &time.selector);
                    coerce_timestamp(raw.as_deref(), time.format).map(|dt| dt.timestamp_millis())
                }
                None => Some(default_millis),
            };

            let raw = extract(record, &number.selector);
            entries.push(SeriesEntry {
                target: target.trim().to_string(),
                point: SeriesPoint {
                    value: to_number(raw.as_deref()),
                    timestamp_millis,
                },
            });
        }
    }

    entries
}

fn series_label(record: &Record<'_>, partition: &ColumnPartition<'_>) -> String {
    partition
        .strings
        .iter()
        .map(|column| match extract(record, &column.selector).as_deref() {
            None | Some(Value::Null) => String::new(),
            value => value_text(value),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merge entries by target, keeping first-seen target order
pub fn group_series(entries: Vec<SeriesEntry>) -> Vec<TimeSeries> {
    let mut series: Vec<TimeSeries> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        match positions.get(&entry.target) {
            Some(&i) => series[i].points.push(entry.point),
            None => {
                positions.insert(entry.target.clone(), series.len());
                series.push(TimeSeries {
                    target: entry.target,
                    points: vec![entry.point],
                });
            }
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::records::RecordSet;
    use crate::query::{ColumnFormat, ColumnSpec};
    use serde_json::json;

    fn end_time() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_000).unwrap()
    }

    fn run(root: &Value, columns: &[ColumnSpec]) -> Vec<SeriesEntry> {
        let RecordSet::Many(records) = RecordSet::from_root(Some(root), false) else {
            panic!("expected records");
        };
        build_series(&records, &ColumnPartition::new(columns), end_time())
    }

    fn targets(entries: &[SeriesEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.target.as_str()).collect()
    }

    #[test]
    fn test_single_number_keeps_label() {
        let root = json!([{"city": "NY", "unit": "C", "temp": 20}]);
        let columns = vec![
            ColumnSpec::new("city", "city", ColumnFormat::String),
            ColumnSpec::new("unit", "unit", ColumnFormat::String),
            ColumnSpec::new("Temperature", "temp", ColumnFormat::Number),
        ];

        let entries = run(&root, &columns);
        assert_eq!(targets(&entries), vec!["NY C"]);
        assert_eq!(entries[0].point, SeriesPoint { value: 20.0, timestamp_millis: Some(1_000) });
    }

    #[test]
    fn test_many_numbers_append_text() {
        let root = json!([{"city": "NY", "unit": "C", "temp": 20, "humidity": 40}]);
        let columns = vec![
            ColumnSpec::new("city", "city", ColumnFormat::String),
            ColumnSpec::new("unit", "unit", ColumnFormat::String),
            ColumnSpec::new("Temperature", "temp", ColumnFormat::Number),
            ColumnSpec::new("humidity-text", "humidity", ColumnFormat::Number),
        ];

        assert_eq!(targets(&run(&root, &columns)), vec!["NY C Temperature", "NY C humidity-text"]);
    }

    #[test]
    fn test_empty_label_uses_column_text() {
        let root = json!([{"v": 5}]);
        let columns = vec![ColumnSpec::new("value", "v", ColumnFormat::Number)];
        assert_eq!(targets(&run(&root, &columns)), vec!["value"]);

        let many = vec![
            ColumnSpec::new("a", "v", ColumnFormat::Number),
            ColumnSpec::new("b", "w", ColumnFormat::Number),
        ];
        assert_eq!(targets(&run(&root, &many)), vec!["a", "b"]);
    }

    #[test]
    fn test_first_time_column_sets_timestamp() {
        let root = json!([
            {"v": "3", "s": "1700000000", "iso": "2020-01-01T00:00:00Z"},
            {"v": "x", "s": "later"}
        ]);
        let columns = vec![
            ColumnSpec::new("v", "v", ColumnFormat::Number),
            ColumnSpec::new("s", "s", ColumnFormat::TimestampEpochSeconds),
            ColumnSpec::new("iso", "iso", ColumnFormat::Timestamp),
        ];

        let entries = run(&root, &columns);
        assert_eq!(entries[0].point, SeriesPoint { value: 3.0, timestamp_millis: Some(1_700_000_000_000) });
        assert!(entries[1].point.value.is_nan());
        assert_eq!(entries[1].point.timestamp_millis, None);
    }

    #[test]
    fn test_column_major_emission() {
        let root = json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}]);
        let columns = vec![
            ColumnSpec::new("A", "a", ColumnFormat::Number),
            ColumnSpec::new("B", "b", ColumnFormat::Number),
        ];
        let values: Vec<f64> = run(&root, &columns).iter().map(|e| e.point.value).collect();
        assert_eq!(values, vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_grouping_concatenates_in_emission_order() {
        let point = |value, ts| SeriesPoint { value, timestamp_millis: Some(ts) };
        let entries = vec![
            SeriesEntry { target: "X".into(), point: point(1.0, 500) },
            SeriesEntry { target: "Y".into(), point: point(2.0, 100) },
            SeriesEntry { target: "X".into(), point: point(3.0, 100) },
        ];

        let series = group_series(entries);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].target, "X");
        assert_eq!(series[0].points, vec![point(1.0, 500), point(3.0, 100)]);
        assert_eq!(series[1].target, "Y");
    }
}
