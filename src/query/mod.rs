//! Query descriptors - what to extract and how to shape it
//!
//! A `QueryDescriptor` arrives already templated by the caller. It names
//! the root of the records inside the raw document, the columns to pull
//! out of each record, optional row filters and the output format.

pub mod filter;
pub mod types;

pub use filter::{FieldFilter, FilterOperator, FilterSpec, RowFilter};
pub use types::{
    ColumnFormat, ColumnSpec, JsonOptions, QueryDescriptor, QueryFormat, Selector, SourceType,
};
