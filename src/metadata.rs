//! Typed open metadata carried by context items.
//!
//! Collaborator modules attach whatever they need (attendees, sender,
//! start time, tone scores). Values stay typed so readers can match on
//! them instead of probing untyped JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Module-specific metadata bag.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(f) => Some(*f),
            MetadataValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(values: Vec<T>) -> Self {
        MetadataValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => MetadataValue::Null,
            Value::Bool(b) => MetadataValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetadataValue::Int(i),
                // u64 beyond i64 range and real numbers both land here
                None => MetadataValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => MetadataValue::Text(s),
            Value::Array(arr) => MetadataValue::List(arr.into_iter().map(Into::into).collect()),
            Value::Object(obj) => {
                MetadataValue::Map(obj.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<MetadataValue> for Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Null => Value::Null,
            MetadataValue::Bool(b) => Value::Bool(b),
            MetadataValue::Int(i) => Value::from(i),
            MetadataValue::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            MetadataValue::Text(s) => Value::String(s),
            MetadataValue::List(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            MetadataValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Convert a JSON object into metadata. Non-object values yield an empty map.
pub fn metadata_from_json(value: Value) -> Metadata {
    match value {
        Value::Object(obj) => obj.into_iter().map(|(k, v)| (k, v.into())).collect(),
        _ => Metadata::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_object_becomes_typed_map() {
        let meta = metadata_from_json(json!({
            "attendees": ["sarah@acme.com", "joe@acme.com"],
            "durationMinutes": 30,
            "sentiment": 0.4,
            "recurring": true,
        }));

        assert_eq!(meta.get("durationMinutes").and_then(|v| v.as_i64()), Some(30));
        assert_eq!(meta.get("recurring").and_then(|v| v.as_bool()), Some(true));
        assert!((meta["sentiment"].as_f64().unwrap() - 0.4).abs() < 1e-9);
        match &meta["attendees"] {
            MetadataValue::List(items) => assert_eq!(items[0].as_str(), Some("sarah@acme.com")),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_untagged_serde_keeps_variant() {
        let raw = r#"{"startTime":"2026-10-16T14:00:00Z","count":3,"ratio":1.5}"#;
        let meta: Metadata = serde_json::from_str(raw).unwrap();
        assert_eq!(meta["startTime"], MetadataValue::Text("2026-10-16T14:00:00Z".into()));
        assert_eq!(meta["count"], MetadataValue::Int(3));
        assert_eq!(meta["ratio"], MetadataValue::Float(1.5));
    }

    #[test]
    fn test_non_object_json_is_empty_metadata() {
        assert!(metadata_from_json(json!("just a string")).is_empty());
    }
}
