//! Specialized collection types

use std::collections::HashMap;

pub use slotmap::{new_key_type, Key, SlotMap};

/// Slot map that also keeps insertion order and a name index
///
/// Keys stay valid across removals of other entries. Names are unique:
/// inserting a name again points it at the newer entry.
#[derive(Debug, Clone)]
pub struct NamedSlotMap<K: Key, V> {
    items: SlotMap<K, V>,
    order: Vec<K>,
    names: HashMap<String, K>,
}

impl<K: Key, V> NamedSlotMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Insert a value under `name`
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> K {
        let key = self.items.insert(value);
        self.order.push(key);
        if let Some(previous) = self.names.insert(name.into(), key) {
            log::debug!("Name rebound from {:?} to {:?}", previous, key);
        }
        key
    }

    /// Remove an entry
    pub fn remove(&mut self, key: K) -> Option<V> {
        let value = self.items.remove(key)?;
        self.order.retain(|k| *k != key);
        self.names.retain(|_, k| *k != key);
        Some(value)
    }

    /// Value of a key
    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(key)
    }

    /// Mutable value of a key
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key)
    }

    /// Key bound to a name
    pub fn find(&self, name: &str) -> Option<K> {
        self.names.get(name).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.order.iter().filter_map(|key| self.items.get(*key).map(|value| (*key, value)))
    }
}

impl<K: Key, V> Default for NamedSlotMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
