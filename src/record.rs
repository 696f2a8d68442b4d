//! Raw, loosely-typed rows as they come out of the parsers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cell of a source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Booleans, arrays and objects have no consumer in normalization and collapse to `Null`.
impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            _ => Self::Null,
        }
    }
}

/// A source row keyed by column/property name, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductRecord {
    pub fields: IndexMap<String, FieldValue>,
    /// Zero-based position among the records accepted from one source.
    pub original_index: usize,
}

impl ProductRecord {
    pub fn new(original_index: usize) -> Self {
        Self {
            fields: IndexMap::new(),
            original_index,
        }
    }

    /// Zip a CSV row against its header. Missing trailing cells become `""`.
    pub fn from_row(headers: &[String], mut values: Vec<String>, original_index: usize) -> Self {
        values.resize(headers.len().max(values.len()), String::new());
        let fields = headers
            .iter()
            .cloned()
            .zip(values.into_iter().map(FieldValue::Text))
            .collect();
        Self {
            fields,
            original_index,
        }
    }

    /// Build from a JSON object, keeping its key order.
    pub fn from_json_object(object: serde_json::Map<String, Value>, original_index: usize) -> Self {
        Self {
            fields: object
                .into_iter()
                .map(|(k, v)| (k, FieldValue::from(v)))
                .collect(),
            original_index,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
