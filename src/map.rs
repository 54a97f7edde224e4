use crate::Redwood;

struct MapEntry<K: Ord, V> {
    key: K,
    value: Option<V>,
}

impl<K: Default + Ord, V> Default for MapEntry<K, V> {
    fn default() -> Self {
        Self {
            key: K::default(),
            value: Option::default(),
        }
    }
}

impl<K: Ord, V> PartialEq for MapEntry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord, V> Eq for MapEntry<K, V> {}

impl<K: Ord, V> PartialOrd for MapEntry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.key.cmp(&other.key))
    }
}

impl<K: Ord, V> Ord for MapEntry<K, V> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// An associative array, storing key-value pairs.
///
/// Uses a Redwood red-black tree with a specialized entry type ordered by
/// key only; valueless dummy entries serve as probes.
pub struct RedwoodMap<K: Ord, V> {
    tree: Redwood<MapEntry<K, V>>,
}

impl<K: Default + Ord, V> RedwoodMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Redwood::new(),
        }
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.tree.contains(&MapEntry { key, value: None })
    }

    /// Inserts the pair, keeping the previous value (and returning `false`)
    /// if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.tree.insert(MapEntry {
            key,
            value: Some(value),
        })
    }

    /// Removes the entry for `key`, reporting whether one existed.
    pub fn remove(&mut self, key: K) -> bool {
        self.tree.remove(&MapEntry { key, value: None })
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let dummy_entry = MapEntry { key, value: None };

        self.tree
            .find_lower_bound(&dummy_entry)
            .filter(|&e| e.key == dummy_entry.key)?
            .value
            .as_ref()
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let dummy_entry = MapEntry { key, value: None };

        self.tree
            .find_lower_bound_mut(&dummy_entry)
            .filter(|e| e.key == dummy_entry.key)?
            .value
            .as_mut()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }
}

impl<K: Default + Ord, V> Default for RedwoodMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
