//! Structured metadata for log entries
//!
//! This module provides:
//! - `FieldValue`: a typed structured value (scalar, array or nested map)
//! - `Metadata`: an ordered key-value map of `FieldValue`s
//!
//! Both serialise to plain JSON, so a `Metadata` written to a file or sent
//! over the network reads like an ordinary JSON object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<FieldValue>),
    Map(Metadata),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Array(_) | FieldValue::Map(_) => {
                write!(f, "{}", self.to_json_value())
            }
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json_value).collect())
            }
            FieldValue::Map(map) => map.to_json_value(),
        }
    }

    /// Capture any serialisable value; values serde cannot represent become `Null`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        serde_json::to_value(value)
            .map(FieldValue::from)
            .unwrap_or(FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value (ints widen to floats)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u16> for FieldValue {
    fn from(i: u16) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        FieldValue::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Metadata> for FieldValue {
    fn from(map: Metadata) -> Self {
        FieldValue::Map(map)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(object) => FieldValue::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Ordered key-value metadata attached to log entries
///
/// # Example
///
/// ```
/// use structured_logger::Metadata;
///
/// let metadata = Metadata::new()
///     .with_field("route", "/api/users")
///     .with_field("cached", false);
/// assert_eq!(metadata.len(), 2);
/// assert_eq!(metadata.format_fields(), "cached=false route=/api/users");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: BTreeMap<String, FieldValue>,
}

impl Metadata {
    /// Create a new empty metadata map
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field (builder form)
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add or overwrite a field
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// Merge `other` into `self`; keys from `other` win on conflict.
    pub fn merge(&mut self, other: &Metadata) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Non-mutating form of [`Metadata::merge`]
    #[must_use]
    pub fn merged(&self, other: &Metadata) -> Metadata {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json_value()))
                .collect(),
        )
    }

    /// Build metadata from a serialisable struct; non-object values yield empty metadata.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match FieldValue::from_serialize(value) {
            FieldValue::Map(map) => map,
            _ => Metadata::new(),
        }
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Metadata {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
