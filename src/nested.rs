//! Tree representation of one reshaped row.
//!
//! A [`Nested`] value is either a string leaf or a [`NestedMap`] node. Maps
//! keep their keys in first-insertion order, which is also the order they
//! serialize in, so a row always renders the same way its header is laid out.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A leaf string or a nested map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested {
    Leaf(String),
    Node(NestedMap),
}

impl Nested {
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Nested::Leaf(s) => Some(s),
            Nested::Node(_) => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&NestedMap> {
        match self {
            Nested::Node(map) => Some(map),
            Nested::Leaf(_) => None,
        }
    }
}

impl From<&str> for Nested {
    fn from(value: &str) -> Self {
        Nested::Leaf(value.to_string())
    }
}

impl From<String> for Nested {
    fn from(value: String) -> Self {
        Nested::Leaf(value)
    }
}

impl From<NestedMap> for Nested {
    fn from(value: NestedMap) -> Self {
        Nested::Node(value)
    }
}

/// Insertion-ordered string-keyed map.
///
/// Lookups are linear; rows carry a handful of keys per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedMap {
    entries: Vec<(String, Nested)>,
}

impl NestedMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Nested> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Follow `path` through nested maps.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Nested> {
        let (last, parents) = path.split_last()?;
        let mut node = self;
        for segment in parents {
            node = node.get(segment)?.as_node()?;
        }
        node.get(last)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, replacing an existing value in place. Returns the old value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Nested>) -> Option<Nested> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Nested> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Nested)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The map stored under `key`, created when absent.
    ///
    /// A leaf already stored under `key` is replaced by an empty map.
    pub fn child_mut(&mut self, key: &str) -> &mut NestedMap {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                if !matches!(self.entries[idx].1, Nested::Node(_)) {
                    self.entries[idx].1 = Nested::Node(NestedMap::new());
                }
                idx
            }
            None => {
                self.entries.push((key.to_string(), Nested::Node(NestedMap::new())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[idx].1 {
            Nested::Node(map) => map,
            Nested::Leaf(_) => unreachable!("slot was just made a node"),
        }
    }
}

impl<K: Into<String>, V: Into<Nested>> FromIterator<(K, V)> for NestedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = NestedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Assign `value` at `path` below `root`, creating intermediate maps.
///
/// Any leaf sitting where an intermediate map is needed is overwritten by a
/// fresh map, and the final segment overwrites whatever it held, so the
/// column written last decides the shape on a collision. An empty path is a
/// no-op.
pub fn set_path(root: &mut NestedMap, path: &[&str], value: impl Into<Nested>) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        node = node.child_mut(segment);
    }
    node.insert(*last, value);
}

impl Serialize for Nested {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nested::Leaf(s) => serializer.serialize_str(s),
            Nested::Node(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for NestedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}
