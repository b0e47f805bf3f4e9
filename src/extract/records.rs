use serde_json::Value;

/// Position of a record within the resolved root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// Ordinal within an array root
    Index(usize),
    /// Entry name when an object root is walked record-wise
    Name(String),
}

impl RecordKey {
    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Index(i) => Value::from(*i),
            RecordKey::Name(name) => Value::String(name.clone()),
        }
    }
}

/// One record of the resolved root, borrowed from the document
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub key: RecordKey,
    pub value: &'a Value,
}

/// The records an extraction runs over
#[derive(Debug, Clone)]
pub enum RecordSet<'a> {
    /// The root selector matched nothing
    Empty,
    /// A non-array root read as one record
    Single(&'a Value),
    /// An array root, or an object root walked entry by entry
    Many(Vec<Record<'a>>),
}

impl<'a> RecordSet<'a> {
    /// Split a resolved root into records.
    ///
    /// Arrays always yield one record per element. Other roots are a single
    /// record unless `record_wise` is set, in which case an object yields
    /// one record per entry and a scalar yields none.
    pub fn from_root(root: Option<&'a Value>, record_wise: bool) -> Self {
        match root {
            None | Some(Value::Null) => RecordSet::Empty,
            Some(Value::Array(items)) => RecordSet::Many(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, value)| Record {
                        key: RecordKey::Index(i),
                        value,
                    })
                    .collect(),
            ),
            Some(Value::Object(map)) if record_wise => RecordSet::Many(
                map.iter()
                    .map(|(name, value)| Record {
                        key: RecordKey::Name(name.clone()),
                        value,
                    })
                    .collect(),
            ),
            Some(_) if record_wise => RecordSet::Many(Vec::new()),
            Some(value) => RecordSet::Single(value),
        }
    }

    /// The first record of a record-wise set, used as the inference sample
    pub fn sample(&self) -> Option<&'a Value> {
        match self {
            RecordSet::Many(records) => records.first().map(|r| r.value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Empty => 0,
            RecordSet::Single(_) => 1,
            RecordSet::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_root() {
        let root = json!([{"a": 1}, {"a": 2}]);
        let records = RecordSet::from_root(Some(&root), false);
        let RecordSet::Many(items) = &records else {
            panic!("expected record-wise set");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].key, RecordKey::Index(1));
        assert_eq!(records.sample(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_object_root() {
        let root = json!({"x": {"v": 1}, "y": {"v": 2}});
        assert!(matches!(RecordSet::from_root(Some(&root), false), RecordSet::Single(_)));

        let records = RecordSet::from_root(Some(&root), true);
        let RecordSet::Many(items) = &records else {
            panic!("expected record-wise set");
        };
        assert_eq!(items[0].key, RecordKey::Name("x".into()));
        assert_eq!(items[1].value, &json!({"v": 2}));
    }

    #[test]
    fn test_missing_root() {
        assert!(RecordSet::from_root(None, false).is_empty());
        assert!(RecordSet::from_root(Some(&json!(null)), true).is_empty());
        assert!(RecordSet::from_root(Some(&json!(4)), true).is_empty());
        assert_eq!(RecordSet::from_root(Some(&json!(4)), false).len(), 1);
    }
}
