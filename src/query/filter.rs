//! Row filtering applied to already-built table rows
//!
//! The pipeline only needs "rows in, fewer-or-equal rows out, same column
//! alignment" from a filter. `RowFilter` is that seam; `FieldFilter` is the
//! stock implementation matching rows by column display text.

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::cell::{Cell, Row};
use crate::extract::coerce::string_to_number;
use crate::query::types::ColumnSpec;

/// Comparison applied by a single filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "notequals")]
    NotEquals,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notcontains")]
    NotContains,
    #[serde(rename = "starts_with")]
    StartsWith,
    #[serde(rename = "ends_with")]
    EndsWith,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notin")]
    NotIn,
    #[serde(rename = "==")]
    NumberEquals,
    #[serde(rename = "!=")]
    NumberNotEquals,
    #[serde(rename = "<")]
    NumberLessThan,
    #[serde(rename = "<=")]
    NumberLessThanOrEqual,
    #[serde(rename = ">")]
    NumberGreaterThan,
    #[serde(rename = ">=")]
    NumberGreaterThanOrEqual,
}

/// One row filter: `field` is a column's display text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Vec<String>,
}

impl FilterSpec {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Vec<String>) -> Self {
        FilterSpec {
            field: field.into(),
            operator,
            value,
        }
    }

    fn first_value(&self) -> &str {
        self.value.first().map(String::as_str).unwrap_or("")
    }
}

/// Narrows a row set given the column metadata and the query's filters
pub trait RowFilter {
    fn filter_rows(&self, rows: Vec<Row>, columns: &[ColumnSpec], filters: &[FilterSpec]) -> Vec<Row>;
}

impl<F> RowFilter for F
where
    F: Fn(Vec<Row>, &[ColumnSpec], &[FilterSpec]) -> Vec<Row>,
{
    fn filter_rows(&self, rows: Vec<Row>, columns: &[ColumnSpec], filters: &[FilterSpec]) -> Vec<Row> {
        self(rows, columns, filters)
    }
}

/// Keeps rows for which every filter matches the cell of its named column.
/// A filter naming a column that does not exist matches every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldFilter;

/// A filter bound to a column position, with its regex compiled once
struct BoundFilter<'a> {
    spec: &'a FilterSpec,
    column: usize,
    pattern: Option<Regex>,
}

impl BoundFilter<'_> {
    fn matches(&self, row: &Row) -> bool {
        let Some(cell) = row.get(self.column) else {
            return false;
        };

        match self.spec.operator {
            FilterOperator::NumberEquals
            | FilterOperator::NumberNotEquals
            | FilterOperator::NumberLessThan
            | FilterOperator::NumberLessThanOrEqual
            | FilterOperator::NumberGreaterThan
            | FilterOperator::NumberGreaterThanOrEqual => self.matches_number(cell),
            _ => self.matches_text(&cell.text()),
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        let expected = self.spec.first_value();
        match self.spec.operator {
            FilterOperator::Equals => text == expected,
            FilterOperator::NotEquals => text != expected,
            FilterOperator::Contains => text.contains(expected),
            FilterOperator::NotContains => !text.contains(expected),
            FilterOperator::StartsWith => text.starts_with(expected),
            FilterOperator::EndsWith => text.ends_with(expected),
            FilterOperator::Regex => self
                .pattern
                .as_ref()
                .map(|re| re.is_match(text))
                .unwrap_or(false),
            FilterOperator::In => self.spec.value.iter().any(|v| v == text),
            FilterOperator::NotIn => !self.spec.value.iter().any(|v| v == text),
            _ => false,
        }
    }

    fn matches_number(&self, cell: &Cell) -> bool {
        let actual = cell.number();
        let expected = string_to_number(self.spec.first_value());
        match self.spec.operator {
            FilterOperator::NumberEquals => actual == expected,
            FilterOperator::NumberNotEquals => actual != expected,
            FilterOperator::NumberLessThan => actual < expected,
            FilterOperator::NumberLessThanOrEqual => actual <= expected,
            FilterOperator::NumberGreaterThan => actual > expected,
            FilterOperator::NumberGreaterThanOrEqual => actual >= expected,
            _ => false,
        }
    }
}

impl RowFilter for FieldFilter {
    fn filter_rows(&self, rows: Vec<Row>, columns: &[ColumnSpec], filters: &[FilterSpec]) -> Vec<Row> {
        let bound: Vec<BoundFilter> = filters
            .iter()
            .filter_map(|spec| {
                let column = columns.iter().position(|c| c.text == spec.field)?;
                let pattern = if spec.operator == FilterOperator::Regex {
                    match Regex::new(spec.first_value()) {
                        Ok(re) => Some(re),
                        Err(err) => {
                            warn!("ignoring invalid filter regex for {}: {}", spec.field, err);
                            None
                        }
                    }
                } else {
                    None
                };
                Some(BoundFilter {
                    spec,
                    column,
                    pattern,
                })
            })
            .collect();

        let before = rows.len();
        let kept: Vec<Row> = rows
            .into_iter()
            .filter(|row| bound.iter().all(|f| f.matches(row)))
            .collect();
        debug!("filters kept {} of {} rows", kept.len(), before);
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::ColumnFormat;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("Country", "country", ColumnFormat::String),
            ColumnSpec::new("Population", "population", ColumnFormat::Number),
        ]
    }

    fn rows() -> Vec<Row> {
        vec![
            vec![Cell::String("India".into()), Cell::Number(1400.0)],
            vec![Cell::String("Iceland".into()), Cell::Number(0.4)],
            vec![Cell::String("Chile".into()), Cell::Number(19.0)],
        ]
    }

    fn names(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| r[0].text()).collect()
    }

    #[test]
    fn test_text_operators() {
        let filters = vec![FilterSpec::new("Country", FilterOperator::StartsWith, vec!["I".into()])];
        let kept = FieldFilter.filter_rows(rows(), &columns(), &filters);
        assert_eq!(names(&kept), vec!["India", "Iceland"]);

        let filters = vec![FilterSpec::new(
            "Country",
            FilterOperator::NotIn,
            vec!["India".into(), "Chile".into()],
        )];
        let kept = FieldFilter.filter_rows(rows(), &columns(), &filters);
        assert_eq!(names(&kept), vec!["Iceland"]);
    }

    #[test]
    fn test_numeric_operators_combine() {
        let filters = vec![
            FilterSpec::new("Population", FilterOperator::NumberGreaterThan, vec!["1".into()]),
            FilterSpec::new("Country", FilterOperator::Contains, vec!["i".into()]),
        ];
        let kept = FieldFilter.filter_rows(rows(), &columns(), &filters);
        assert_eq!(names(&kept), vec!["India", "Chile"]);
    }

    #[test]
    fn test_regex_operator() {
        let filters = vec![FilterSpec::new("Country", FilterOperator::Regex, vec!["^[CI]c".into()])];
        let kept = FieldFilter.filter_rows(rows(), &columns(), &filters);
        assert_eq!(names(&kept), vec!["Iceland"]);

        let filters = vec![FilterSpec::new("Country", FilterOperator::Regex, vec!["(".into()])];
        assert!(FieldFilter.filter_rows(rows(), &columns(), &filters).is_empty());
    }

    #[test]
    fn test_unknown_field_matches_everything() {
        let filters = vec![FilterSpec::new("Capital", FilterOperator::Equals, vec!["Lima".into()])];
        assert_eq!(FieldFilter.filter_rows(rows(), &columns(), &filters).len(), 3);
    }

    #[test]
    fn test_closure_filter() {
        let only_first = |rows: Vec<Row>, _: &[ColumnSpec], _: &[FilterSpec]| -> Vec<Row> {
            rows.into_iter().take(1).collect()
        };
        assert_eq!(only_first.filter_rows(rows(), &columns(), &[]).len(), 1);
    }
}
