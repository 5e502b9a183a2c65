use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::value::Value;

// -----------------------------------------------------------------------------
// OrderedMap

/// An insertion-ordered map.
///
/// Entries iterate in the order they were first inserted; re-inserting an
/// existing key replaces the value in place without moving the entry.
/// [`insert`](OrderedMap::insert) reports the previous value, which the map
/// adapters rely on to detect duplicate keys during decode.
///
/// Equality and hashing are order-insensitive: two maps with the same
/// entries in different insertion orders compare equal and hash alike.
///
/// # Examples
///
/// ```
/// use databind::OrderedMap;
///
/// let mut map: OrderedMap<String, i64> = OrderedMap::new();
/// map.insert("b".to_string(), 2);
/// map.insert("a".to_string(), 1);
///
/// let keys: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
/// assert_eq!(keys, ["b", "a"]);
/// ```
pub struct OrderedMap<K = Value, V = Value> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

/// A dynamic object: text field names mapped to [`Value`]s, in insertion
/// order. Unlike the other map containers, its adapter tolerates explicit
/// null values (stored as [`Value::Null`]).
pub type Object = OrderedMap<String, Value>;

/// The well-known string-keyed configuration shape. Requests for this type
/// fix both the key and value element adapters to text.
pub type TextMap = OrderedMap<String, String>;

impl<K, V> OrderedMap<K, V> {
    /// Creates an empty map.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates an empty map with at least the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// The entries as a slice, in insertion order.
    #[inline]
    pub fn entries(&self) -> &[(K, V)] {
        &self.entries
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    /// Inserts an entry, returning the previous value if the key was
    /// already present. Replacement keeps the entry's original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&at) => {
                let slot = &mut self.entries[at].1;
                Some(std::mem::replace(slot, value))
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(key).map(|&at| &self.entries[at].1)
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains_key(key)
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for OrderedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            index: self.index.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Eq + Hash + Clone, V: PartialEq> PartialEq for OrderedMap<K, V> {
    /// Order-insensitive: equal iff both maps hold the same entry set.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<K: Eq + Hash + Clone, V: Eq> Eq for OrderedMap<K, V> {}

impl<K: Hash, V: Hash> Hash for OrderedMap<K, V> {
    /// Order-insensitive: entry hashes are combined commutatively so the
    /// hash agrees with [`PartialEq`].
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut combined = 0_u64;
        for (key, value) in self.iter() {
            let mut entry_hasher = DefaultHasher::new();
            key.hash(&mut entry_hasher);
            value.hash(&mut entry_hasher);
            combined = combined.wrapping_add(entry_hasher.finish());
        }
        state.write_usize(self.len());
        state.write_u64(combined);
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Eq + Hash + Clone, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;

    fn hash_of<T: std::hash::Hash>(value: &T) -> u64 {
        use std::hash::{DefaultHasher, Hasher};
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn preserves_insertion_order() {
        let map: OrderedMap<i64, i64> = [(3, 30), (1, 10), (2, 20)].into();
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [3, 1, 2]);
    }

    #[test]
    fn insert_reports_previous_and_keeps_position() {
        let mut map: OrderedMap<i64, i64> = [(1, 10), (2, 20)].into();
        assert_eq!(map.insert(1, 11), Some(10));
        let entries: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(entries, [(1, 11), (2, 20)]);
    }

    #[test]
    fn equality_ignores_order() {
        let a: OrderedMap<i64, i64> = [(1, 10), (2, 20)].into();
        let b: OrderedMap<i64, i64> = [(2, 20), (1, 10)].into();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn unequal_values_detected() {
        let a: OrderedMap<i64, i64> = [(1, 10)].into();
        let b: OrderedMap<i64, i64> = [(1, 11)].into();
        assert_ne!(a, b);
    }
}
