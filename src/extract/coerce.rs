//! Value coercion - turning raw record values into typed cells
//!
//! Coercion is total: values that do not parse as numbers or dates become
//! NaN or an invalid date instead of failing the extraction.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

use crate::extract::cell::Cell;
use crate::extract::records::Record;
use crate::path::property;
use crate::query::{ColumnFormat, ColumnSpec, Selector};

static DECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap()
});

static RADIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0([xXoObB])([0-9a-fA-F]+)$").unwrap()
});

static INT_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d+)").unwrap()
});

static YEAR_MONTH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(?:-(\d{2}))?$").unwrap()
});

/// Largest distance from the epoch a date may have, in milliseconds
const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%a %b %d %Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Pull the raw value a selector names out of a record
pub fn extract<'a>(record: &Record<'a>, selector: &Selector) -> Option<Cow<'a, Value>> {
    match selector {
        Selector::Index => Some(Cow::Owned(record.key.to_value())),
        Selector::RawRecord => Some(Cow::Owned(Value::String(record.value.to_string()))),
        Selector::Path(path) => property::get(record.value, path).map(Cow::Borrowed),
    }
}

/// Coerce one column of one record into a cell.
///
/// A selector miss reads as the empty string before type coercion.
pub fn coerce_cell(record: &Record<'_>, column: &ColumnSpec) -> Cell {
    let raw = extract(record, &column.selector)
        .unwrap_or_else(|| Cow::Owned(Value::String(String::new())));

    match column.format {
        format if format.is_timestamp() => Cell::Date(coerce_timestamp(Some(raw.as_ref()), format)),
        ColumnFormat::Number => match raw.as_ref() {
            Value::String(s) if s.is_empty() => Cell::from_value(Value::Null),
            value => Cell::Number(to_number(Some(value))),
        },
        _ => Cell::from_value(raw.into_owned()),
    }
}

/// Interpret a raw value as a date according to a timestamp column format.
/// Non-timestamp formats never produce a date.
pub fn coerce_timestamp(raw: Option<&Value>, format: ColumnFormat) -> Option<DateTime<Utc>> {
    let text = value_text(raw);
    match format {
        ColumnFormat::Timestamp => parse_date(&text),
        ColumnFormat::TimestampEpoch => parse_int(&text).and_then(millis_to_date),
        ColumnFormat::TimestampEpochSeconds => parse_int(&text)
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(millis_to_date),
        ColumnFormat::String | ColumnFormat::Number => None,
    }
}

fn millis_to_date(millis: i64) -> Option<DateTime<Utc>> {
    if millis.unsigned_abs() > MAX_EPOCH_MILLIS.unsigned_abs() {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

/// Loose numeric reading of a JSON value; a missing value is NaN
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => string_to_number(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [Value::Null] => 0.0,
            [only] => string_to_number(&value_text(Some(only))),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Numeric reading of text: blank is zero, anything unparseable is NaN
pub fn string_to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if DECIMAL_REGEX.is_match(text) {
        return text.parse::<f64>().unwrap_or(f64::NAN);
    }

    if let Some(caps) = RADIX_REGEX.captures(text) {
        let radix = match &caps[1] {
            "x" | "X" => 16,
            "o" | "O" => 8,
            _ => 2,
        };
        return u64::from_str_radix(&caps[2], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    f64::NAN
}

/// Leading base-10 integer of `text`, ignoring anything after it
pub fn parse_int(text: &str) -> Option<i64> {
    INT_PREFIX_REGEX
        .captures(text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
}

/// Parse calendar date/time text. Values without an offset are read as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let caps = YEAR_MONTH_REGEX.captures(text)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps.get(2).map_or(Some(1), |m| m.as_str().parse::<u32>().ok())?;
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Render a number the way it reads in JSON-ish text: integral values
/// without a fraction, non-finite values by name.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// String form of a raw value, used for series labels and date parsing.
///
/// A missing value renders as `undefined`, arrays join their elements
/// with commas and objects collapse to a placeholder.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_text(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}
