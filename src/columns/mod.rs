//! Column model - declared or inferred extraction rules, split by role

pub mod infer;
pub mod model;

pub use infer::infer_columns;
pub use model::{derive_columns, ColumnPartition};
