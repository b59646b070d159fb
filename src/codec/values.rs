//! Field multi-map used for query, URI and form binding.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use url::form_urlencoded;

/// An ordered `key -> values` multi-map.
///
/// Keys iterate in sorted order, so [`FormValues::encode`] is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    inner: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string (a raw query string).
    pub fn parse(input: &[u8]) -> Self {
        form_urlencoded::parse(input)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Append a value under `key`, keeping earlier values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), vec![value.into()]);
    }

    /// First value under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every `(key, value)` pair, keys sorted, values in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Encode as a urlencoded string with sorted keys.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }

    /// Flatten a JSON-shaped value into fields.
    ///
    /// Nested objects become dotted keys (`sub.name`), arrays become repeated
    /// values and nulls are dropped.
    pub fn from_json(value: &JsonValue) -> Self {
        let mut values = Self::new();
        flatten_into(&mut values, "", value);
        values
    }
}

fn flatten_into(values: &mut FormValues, prefix: &str, value: &JsonValue) {
    match value {
        JsonValue::Null => {}
        JsonValue::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(values, &path, nested);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                flatten_into(values, prefix, item);
            }
        }
        JsonValue::String(s) => values.add(prefix, s.as_str()),
        JsonValue::Bool(b) => values.add(prefix, b.to_string()),
        JsonValue::Number(n) => values.add(prefix, n.to_string()),
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

impl<K, V> Extend<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.add(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keeps_repeated_keys() {
        let values = FormValues::parse(b"a=1&b=2&a=3&c=hello%20world");
        assert_eq!(values.get("a"), Some("1"));
        assert_eq!(values.get_all("a"), &["1".to_string(), "3".to_string()]);
        assert_eq!(values.get("c"), Some("hello world"));
        assert_eq!(values.get("missing"), None);
    }

    #[test]
    fn test_encode_sorts_keys() {
        let mut values = FormValues::new();
        values.add("name", "bar baz");
        values.add("id", "foo");
        values.add("id", "qux");
        assert_eq!(values.encode(), "id=foo&id=qux&name=bar+baz");
    }

    #[test]
    fn test_from_json_flattens_nested_objects() {
        let values = FormValues::from_json(&json!({
            "id": 7,
            "sub": { "name": "x" },
            "tags": ["a", "b"],
            "gone": null,
            "ok": true
        }));
        assert_eq!(values.get("id"), Some("7"));
        assert_eq!(values.get("sub.name"), Some("x"));
        assert_eq!(values.get_all("tags").len(), 2);
        assert!(!values.contains_key("gone"));
        assert_eq!(values.get("ok"), Some("true"));
    }

    #[test]
    fn test_set_replaces_values() {
        let mut values: FormValues = [("k", "1"), ("k", "2")].into_iter().collect();
        values.set("k", "3");
        assert_eq!(values.get_all("k"), &["3".to_string()]);
        assert_eq!(values.remove("k"), Some(vec!["3".to_string()]));
        assert!(values.is_empty());
    }
}
