//! Submission payload: the flat, ordered mapping sent to the backend.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Text(String),
    List(Vec<String>),
}

impl PayloadValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PayloadValue::Text(s) => Some(s),
            PayloadValue::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PayloadValue::Text(_) => None,
            PayloadValue::List(items) => Some(items),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Text(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Text(value)
    }
}

impl From<Vec<String>> for PayloadValue {
    fn from(value: Vec<String>) -> Self {
        PayloadValue::List(value)
    }
}

/// Ordered key → value mapping.
///
/// Keys are unique; inserting an existing key replaces its value in place so
/// the original position is kept. Serializes as a JSON object in insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    entries: Vec<(String, PayloadValue)>,
}

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Append `item` to the list stored at `key`, creating it if needed.
    ///
    /// A text value already stored at `key` is replaced by a list.
    pub fn push_to_list(&mut self, key: &str, item: impl Into<String>) {
        let item = item.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, PayloadValue::List(items))) => items.push(item),
            Some(slot) => slot.1 = PayloadValue::List(vec![item]),
            None => self
                .entries
                .push((key.to_string(), PayloadValue::List(vec![item]))),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PayloadValue::as_text)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl<K: Into<String>, V: Into<PayloadValue>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of strings or string lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Payload, A::Error> {
        let mut payload = Payload::new();
        while let Some((key, value)) = access.next_entry::<String, PayloadValue>()? {
            if payload.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key `{key}`")));
            }
            payload.entries.push((key, value));
        }
        Ok(payload)
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PayloadVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_insertion_order() {
        let mut payload = Payload::new();
        payload.insert("zeta", "1");
        payload.insert("alpha", "2");
        payload.push_to_list("tags", "a");
        payload.push_to_list("tags", "b");

        assert_eq!(
            payload.to_json().unwrap(),
            r#"{"zeta":"1","alpha":"2","tags":["a","b"]}"#
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut payload = Payload::new();
        payload.insert("a", "1");
        payload.insert("b", "2");
        payload.insert("a", "3");
        assert_eq!(payload.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(payload.text("a"), Some("3"));
    }

    #[test]
    fn parses_mixed_values() {
        let payload = Payload::from_json(r#"{"email":"a@b.co","features":["seo"]}"#).unwrap();
        assert_eq!(payload.text("email"), Some("a@b.co"));
        assert_eq!(
            payload.get("features").and_then(PayloadValue::as_list),
            Some(&["seo".to_string()][..])
        );
    }

    #[test]
    fn rejects_non_string_values() {
        assert!(Payload::from_json(r#"{"budget":5000}"#).is_err());
    }
}
