use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ParseError, Result};
use crate::query::filter::FilterSpec;

/// Kind of source the raw document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Json,
    Csv,
    Html,
    Xml,
    Graphql,
    #[serde(other)]
    Other,
}

impl SourceType {
    /// Whether records of this source can be introspected key by key,
    /// which is what column inference needs.
    pub fn supports_auto_columns(self) -> bool {
        matches!(self, SourceType::Json | SourceType::Csv)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Json => "json",
            SourceType::Csv => "csv",
            SourceType::Html => "html",
            SourceType::Xml => "xml",
            SourceType::Graphql => "graphql",
            SourceType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Requested output shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryFormat {
    #[default]
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "timeseries", alias = "time-series", alias = "time_series")]
    TimeSeries,
}

/// Semantic type declared for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnFormat {
    #[default]
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    /// Calendar date/time text
    #[serde(rename = "timestamp")]
    Timestamp,
    /// Integer milliseconds since the epoch
    #[serde(rename = "timestamp_epoch")]
    TimestampEpoch,
    /// Integer seconds since the epoch
    #[serde(rename = "timestamp_epoch_s", alias = "timestamp_epoch_seconds")]
    TimestampEpochSeconds,
}

impl ColumnFormat {
    pub fn is_timestamp(self) -> bool {
        matches!(
            self,
            ColumnFormat::Timestamp
                | ColumnFormat::TimestampEpoch
                | ColumnFormat::TimestampEpochSeconds
        )
    }
}

/// Where a column's raw value comes from within a record
///
/// Serialized as a plain string: `$$key` and `$$value` are the two
/// reserved spellings, anything else is a nested property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    /// Nested property path into the record, e.g. `user.address[0].city`
    Path(String),
    /// The record's position (or key) within the resolved root
    Index,
    /// The whole record as canonical JSON text
    RawRecord,
}

impl Selector {
    pub const INDEX: &'static str = "$$key";
    pub const RAW_RECORD: &'static str = "$$value";

    pub fn path(path: impl Into<String>) -> Self {
        Selector::Path(path.into())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        match s.as_str() {
            Selector::INDEX => Selector::Index,
            Selector::RAW_RECORD => Selector::RawRecord,
            _ => Selector::Path(s),
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Selector::from(s.to_string())
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        match selector {
            Selector::Path(path) => path,
            Selector::Index => Selector::INDEX.to_string(),
            Selector::RawRecord => Selector::RAW_RECORD.to_string(),
        }
    }
}

/// A named extraction and typing rule applied to every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Display name
    pub text: String,

    pub selector: Selector,

    #[serde(rename = "type", default)]
    pub format: ColumnFormat,
}

impl ColumnSpec {
    pub fn new(text: impl Into<String>, selector: impl Into<Selector>, format: ColumnFormat) -> Self {
        ColumnSpec {
            text: text.into(),
            selector: selector.into(),
            format,
        }
    }
}

/// JSON specific switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOptions {
    /// Walk a non-array root record-wise instead of as a single record
    #[serde(default)]
    pub root_is_not_array: bool,
}

/// Everything one extraction needs to know about the query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    #[serde(rename = "type", default)]
    pub source: SourceType,

    /// JSONPath (`$...`) or nested property path locating the records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_selector: Option<String>,

    #[serde(default)]
    pub columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    #[serde(default)]
    pub format: QueryFormat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_options: Option<JsonOptions>,
}

impl QueryDescriptor {
    pub fn new(source: SourceType) -> Self {
        QueryDescriptor {
            source,
            ..Default::default()
        }
    }

    /// Deserialize a descriptor from its stored JSON form
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ParseError::MalformedQuery)
    }

    pub fn with_root_selector(mut self, selector: impl Into<String>) -> Self {
        self.root_selector = Some(selector.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_filters(mut self, filters: Vec<FilterSpec>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_format(mut self, format: QueryFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_root_is_not_array(mut self, enabled: bool) -> Self {
        self.json_options = Some(JsonOptions {
            root_is_not_array: enabled,
        });
        self
    }

    pub fn root_is_not_array(&self) -> bool {
        self.json_options
            .as_ref()
            .map(|o| o.root_is_not_array)
            .unwrap_or(false)
    }

    /// Filters only run when both filters and declared columns exist
    pub fn should_filter(&self) -> bool {
        !self.filters.is_empty() && !self.columns.is_empty()
    }
}
