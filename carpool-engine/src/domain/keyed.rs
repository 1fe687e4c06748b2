//! Insertion-ordered keyed collections.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A string-keyed map that remembers insertion order.
///
/// Trips expose their waypoints and passengers as JSON objects keyed by
/// generated names (`waypoint1`, `passenger42`, ...). Consumers render
/// these in the order they were added, so the order is part of the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> KeyedMap<T> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value.
    ///
    /// Replacing an existing key keeps its original position and returns
    /// the previous value; new keys are appended.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Generate the next free key of the form `{prefix}{n}`.
    ///
    /// `n` is one more than the largest numeric suffix among keys that
    /// carry `prefix`, so a removed key is never handed out while a later
    /// key is still live.
    pub fn next_key(&self, prefix: &str) -> String {
        let highest = self
            .keys()
            .filter_map(|k| k.strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("{prefix}{}", highest + 1)
    }

    /// Map every value, keeping keys and order.
    pub fn map_values<U>(&self, mut f: impl FnMut(&T) -> U) -> KeyedMap<U> {
        KeyedMap {
            entries: self.entries.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
        }
    }
}

impl<T> Default for KeyedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for KeyedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<T: Serialize> Serialize for KeyedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
