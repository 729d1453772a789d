//! Numeric field extraction from monitor documents

use crate::utils::{StatsError, StatsResult};
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

/// Accessors over raw monitor documents
///
/// Missing fields count as zero. A field that exists with the wrong type means
/// the producer is broken, so it fails with `StatsError::Format`.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Add the number stored under `key` to `out`
    pub fn add(doc: &Object, key: &str, out: &mut f64, path: &str) -> StatsResult<()> {
        match doc.get(key) {
            None => Ok(()),
            Some(value) => {
                let number = value.as_f64().ok_or_else(|| {
                    StatsError::format(
                        Self::child_path(path, key),
                        format!("expected a number, found {}", Self::type_name(value)),
                    )
                })?;
                *out += number;
                Ok(())
            },
        }
    }

    /// Read the number stored under `key`, zero when absent
    pub fn number(doc: &Object, key: &str, path: &str) -> StatsResult<f64> {
        let mut value = 0.0;
        Self::add(doc, key, &mut value, path)?;
        Ok(value)
    }

    /// View `value` as an object
    pub fn object<'a>(value: &'a Value, path: &str) -> StatsResult<&'a Object> {
        value.as_object().ok_or_else(|| {
            StatsError::format(path, format!("expected an object, found {}", Self::type_name(value)))
        })
    }

    /// Optional object field: absent is `None`, present but not an object fails
    pub fn child_object<'a>(doc: &'a Object, key: &str, path: &str) -> StatsResult<Option<&'a Object>> {
        doc.get(key)
            .map(|value| Self::object(value, &Self::child_path(path, key)))
            .transpose()
    }

    pub fn child_path(path: &str, key: &str) -> String {
        if path.is_empty() { key.to_string() } else { format!("{}.{}", path, key) }
    }

    fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_absent_field_adds_nothing() {
        let d = doc(json!({ "other": 3 }));
        let mut total = 7.0;
        FieldExtractor::add(&d, "keys_read", &mut total, "btree").unwrap();
        assert_eq!(total, 7.0);
    }

    #[test]
    fn test_present_field_accumulates() {
        let d = doc(json!({ "keys_read": 2.5 }));
        let mut total = 1.0;
        FieldExtractor::add(&d, "keys_read", &mut total, "btree").unwrap();
        FieldExtractor::add(&d, "keys_read", &mut total, "btree").unwrap();
        assert_eq!(total, 6.0);
    }

    #[test]
    fn test_wrong_type_is_format_error() {
        let d = doc(json!({ "keys_read": "12" }));
        let mut total = 0.0;
        let err = FieldExtractor::add(&d, "keys_read", &mut total, "t.serializers").unwrap_err();
        match err {
            StatsError::Format { path, message } => {
                assert_eq!(path, "t.serializers.keys_read");
                assert!(message.contains("a string"));
            },
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(total, 0.0);
    }

    #[test]
    fn test_child_object() {
        let d = doc(json!({ "cache": { "in_use_bytes": 1 }, "bad": [1] }));
        assert!(FieldExtractor::child_object(&d, "cache", "").unwrap().is_some());
        assert!(FieldExtractor::child_object(&d, "missing", "").unwrap().is_none());
        assert!(FieldExtractor::child_object(&d, "bad", "").is_err());
    }
}
