//! Root resolution - locating the records inside a raw document
//!
//! Two addressing schemes are supported: JSONPath expressions (anything
//! starting with `$`) and plain nested property paths.

pub mod jsonpath;
pub mod property;

pub use jsonpath::JsonPath;

use log::{debug, warn};
use serde_json::Value;

/// Resolve the portion of `document` that holds the records.
///
/// * no selector, or an empty one: the whole document
/// * `$...`: every JSONPath match, with array matches flattened one level
/// * anything else: the value at that property path
///
/// A miss, or an invalid JSONPath, yields `None`.
pub fn resolve_root(document: Value, selector: Option<&str>) -> Option<Value> {
    let selector = match selector {
        Some(s) if !s.is_empty() => s,
        _ => return Some(document),
    };

    if selector.starts_with('$') {
        let path = match JsonPath::parse(selector) {
            Ok(path) => path,
            Err(err) => {
                warn!("root selector {:?} is not valid JSONPath: {}", selector, err);
                return None;
            }
        };

        let mut records = Vec::new();
        for matched in path.select(&document) {
            match matched {
                Value::Array(items) => records.extend(items.iter().cloned()),
                other => records.push(other.clone()),
            }
        }
        debug!("root selector {:?} matched {} records", selector, records.len());
        return Some(Value::Array(records));
    }

    let resolved = property::get(&document, selector).cloned();
    if resolved.is_none() {
        debug!("root selector {:?} matched nothing", selector);
    }
    resolved
}
