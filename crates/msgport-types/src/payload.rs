//! Key/value payload carried by a message.
//!
//! The registry and router never look inside a payload. Transports decide
//! how to put it on the wire; the serde derives keep that choice open.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single payload value.
///
/// Encoded with an explicit variant tag so empty arrays and empty byte
/// strings keep their kind on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadValue {
    /// UTF-8 text.
    Str(String),
    /// List of strings.
    StrArray(Vec<String>),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::Str(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::Str(s)
    }
}

impl From<Vec<u8>> for PayloadValue {
    fn from(bytes: Vec<u8>) -> Self {
        PayloadValue::Bytes(bytes)
    }
}

impl From<Vec<String>> for PayloadValue {
    fn from(items: Vec<String>) -> Self {
        PayloadValue::StrArray(items)
    }
}

/// Ordered string-keyed mapping exchanged between ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    entries: BTreeMap<String, PayloadValue>,
}

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one under that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PayloadValue>,
    ) -> Option<PayloadValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    /// Get a value only if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(PayloadValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PayloadValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Approximate serialized size in bytes (JSON encoding).
    ///
    /// Used for the recommended-size warning; transports enforce their own
    /// limit on their own encoding.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(&self.entries)
            .map(|v| v.len())
            .unwrap_or(usize::MAX)
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<PayloadValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}
