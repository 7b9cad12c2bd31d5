use indexmap::IndexMap;
use serde_json::Value;

use crate::encoding::Dataset;

/// Keys starting with this prefix never reach the query string
pub const INTERNAL_PREFIX: char = '_';

/// Value stored under an option key
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Wire value of a chart parameter
    Text(String),
    /// Ordered generated color -> label mapping
    ColorMap(IndexMap<String, String>),
    /// Values attached to the chart for later encoding (map data)
    Series(Dataset),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON view handed to the calling environment
    pub fn to_json(&self) -> Value {
        match self {
            OptionValue::Text(s) => Value::String(s.clone()),
            OptionValue::ColorMap(map) => Value::Object(
                map.iter()
                    .map(|(color, label)| (color.clone(), Value::String(label.clone())))
                    .collect(),
            ),
            OptionValue::Series(values) => Value::Array(
                values
                    .iter()
                    .map(|v| v.and_then(serde_json::Number::from_f64).map_or(Value::Null, Value::Number))
                    .collect(),
            ),
        }
    }
}

/// One key/value pair produced by a directive.
///
/// `merge` is decided per key: when set and the key already holds text, the
/// new text is appended after the separator instead of replacing it.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    pub key: String,
    pub value: OptionValue,
    pub merge: Option<&'static str>,
}

impl OptionEntry {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: OptionValue::Text(value.into()),
            merge: None,
        }
    }

    pub fn merged(key: &str, value: impl Into<String>, separator: &'static str) -> Self {
        Self {
            key: key.to_string(),
            value: OptionValue::Text(value.into()),
            merge: Some(separator),
        }
    }

    pub fn internal(key: &str, value: OptionValue) -> Self {
        debug_assert!(OptionMap::is_internal(key));
        Self {
            key: key.to_string(),
            value,
            merge: None,
        }
    }
}

/// Insertion-ordered chart options.
///
/// Re-setting a key keeps its original position, so serialization order is
/// the order in which keys were first declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionMap {
    entries: IndexMap<String, OptionValue>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_internal(key: &str) -> bool {
        key.starts_with(INTERNAL_PREFIX)
    }

    pub fn apply(&mut self, key: &str, value: OptionValue, merge: Option<&str>) {
        if let (Some(separator), OptionValue::Text(new)) = (merge, &value) {
            if let Some(OptionValue::Text(existing)) = self.entries.get_mut(key) {
                existing.push_str(separator);
                existing.push_str(new);
                return;
            }
        }
        self.entries.insert(key.to_string(), value);
    }

    pub fn apply_entry(&mut self, entry: OptionEntry) {
        self.apply(&entry.key, entry.value, entry.merge);
    }

    pub fn apply_all(&mut self, entries: impl IntoIterator<Item = OptionEntry>) {
        for entry in entries {
            self.apply_entry(entry);
        }
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), OptionValue::Text(value.into()));
    }

    /// Insert `value` only when `key` is absent.
    pub fn set_default(&mut self, key: &str, value: &str) {
        if !self.entries.contains_key(key) {
            self.set_text(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(OptionValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text entries that belong in the query string
    pub fn public(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter(|(k, _)| !Self::is_internal(k))
            .filter_map(|(k, v)| v.as_text().map(|text| (k, text)))
    }

    /// Internal entries with the prefix stripped
    pub fn internal(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.iter()
            .filter_map(|(k, v)| k.strip_prefix(INTERNAL_PREFIX).map(|name| (name, v)))
    }
}
