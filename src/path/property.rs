//! Nested property paths such as `data.items[0]['display.name']`

use serde_json::Value;

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    /// A bracketed or dotted integer; indexes arrays, or names an object key
    Index(usize),
}

impl Segment {
    fn apply<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Key(key), Value::Array(arr)) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            (Segment::Index(i), Value::Array(arr)) => arr.get(*i),
            (Segment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            _ => None,
        }
    }
}

/// Split a property path into segments.
///
/// Dots separate keys, `[n]` indexes, and `['k']` / `["k"]` quote keys that
/// contain dots or brackets. Unterminated brackets are read as literal text.
pub fn parse(path: &str) -> Vec<Segment> {
    let chars: Vec<char> = path.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                if !current.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut current)));
                } else if i == 0 || chars[i - 1] == '.' {
                    segments.push(Segment::Key(String::new()));
                }
                i += 1;
            }
            '[' => {
                let Some((segment, next)) = read_bracket(&chars, i) else {
                    current.push('[');
                    i += 1;
                    continue;
                };
                if !current.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut current)));
                }
                segments.push(segment);
                i = next;
            }
            c => {
                current.push(c);
                i += 1;
            }
        }
    }

    if !current.is_empty() || segments.is_empty() || path.ends_with('.') {
        segments.push(Segment::Key(current));
    }

    segments
}

/// Read `[...]` starting at `start`; returns the segment and the index after `]`
fn read_bracket(chars: &[char], start: usize) -> Option<(Segment, usize)> {
    let mut i = start + 1;
    let quote = match chars.get(i) {
        Some(&q) if q == '\'' || q == '"' => Some(q),
        _ => None,
    };

    if let Some(q) = quote {
        i += 1;
        let mut key = String::new();
        while i < chars.len() {
            match chars[i] {
                '\\' if i + 1 < chars.len() => {
                    key.push(chars[i + 1]);
                    i += 2;
                }
                c if c == q => {
                    return (chars.get(i + 1) == Some(&']')).then(|| (Segment::Key(key), i + 2));
                }
                c => {
                    key.push(c);
                    i += 1;
                }
            }
        }
        return None;
    }

    let close = chars[i..].iter().position(|&c| c == ']')? + i;
    let inner: String = chars[i..close].iter().collect();
    let inner = inner.trim();
    let segment = match inner.parse::<usize>() {
        Ok(index) => Segment::Index(index),
        Err(_) => Segment::Key(inner.to_string()),
    };
    Some((segment, close + 1))
}

/// Look up `path` inside `value`.
///
/// An object key equal to the whole path wins over splitting it, so
/// `{"a.b": 1}` answers `a.b` directly.
pub fn get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if let Value::Object(map) = value {
        if let Some(direct) = map.get(path) {
            return Some(direct);
        }
    }

    parse(path)
        .iter()
        .try_fold(value, |current, segment| segment.apply(current))
}
