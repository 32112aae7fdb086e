//! Ordered map type for JSON objects.
//!
//! [`JsonMap`] wraps an [`IndexMap`] so object fields keep their encoding
//! order. Writing a map back out therefore reproduces the original field order,
//! which is what makes document round trips byte-stable.
//!
//! Inserting a key that is already present replaces the value in place: the
//! field keeps its first position and takes the last value. This is the policy
//! applied when a [`Value`](crate::Value) is built from a document that repeats
//! a field name.
//!
//! ## Examples
//!
//! ```rust
//! use dual_json::{JsonMap, Value};
//!
//! let mut map = JsonMap::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of field names to values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonMap(IndexMap<String, Value>);

impl JsonMap {
    #[must_use]
    pub fn new() -> Self {
        JsonMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        JsonMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field. An existing field keeps its position and the old
    /// value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::{JsonMap, Value};
    ///
    /// let mut map = JsonMap::new();
    /// map.insert("a".to_string(), Value::from(1));
    /// map.insert("b".to_string(), Value::from(2));
    /// assert_eq!(map.insert("a".to_string(), Value::from(3)), Some(Value::from(1)));
    ///
    /// let keys: Vec<_> = map.keys().cloned().collect();
    /// assert_eq!(keys, vec!["a", "b"]);
    /// ```
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Removes a field, shifting later fields up so order is preserved.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for JsonMap {
    fn from(map: HashMap<String, Value>) -> Self {
        JsonMap(map.into_iter().collect())
    }
}

impl From<JsonMap> for HashMap<String, Value> {
    fn from(map: JsonMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for JsonMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a JsonMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for JsonMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        JsonMap(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_key_keeps_first_position() {
        let map: JsonMap = vec![
            ("k".to_string(), Value::from(1)),
            ("z".to_string(), Value::from(2)),
            ("k".to_string(), Value::from(3)),
        ]
        .into_iter()
        .collect();

        let entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(entries, vec![("k", Value::from(3)), ("z", Value::from(2))]);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut map = JsonMap::new();
        for key in ["a", "b", "c"] {
            map.insert(key.to_string(), Value::Null);
        }
        assert_eq!(map.remove("a"), Some(Value::Null));
        assert!(!map.contains_key("a"));
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
