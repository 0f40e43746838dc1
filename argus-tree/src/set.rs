//! Persistent Patricia-tree set.

use std::fmt;

use crate::{Indexable, PatriciaTreeMap};

/// A persistent set of keys, ordered by key index.
///
/// Thin wrapper over [`PatriciaTreeMap`] with unit values; shares all of its
/// structural-sharing behavior.
pub struct PatriciaTreeSet<K> {
    map: PatriciaTreeMap<K, ()>,
}

impl<K> Clone for PatriciaTreeSet<K> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K> Default for PatriciaTreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PatriciaTreeSet<K> {
    pub fn new() -> Self {
        Self {
            map: PatriciaTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn size(&self) -> usize {
        self.map.size()
    }

    /// Iterate elements in strictly increasing key-index order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }
}

impl<K: Indexable + Clone> PatriciaTreeSet<K> {
    pub fn singleton(key: K) -> Self {
        let mut set = Self::new();
        set.insert(key);
        set
    }

    pub fn insert(&mut self, key: K) {
        self.map.insert(key, ());
    }

    pub fn remove(&mut self, key: &K) {
        self.map.remove(key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            map: self.map.join_with(&other.map, |_, _| Some(())),
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            map: self.map.intersect_with(&other.map, |_, _| Some(())),
        }
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self {
            map: self
                .map
                .transform(|k, _| (!other.contains(k)).then_some(())),
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        // Subset: every element of `self` appears in `other`. In the map's
        // order (absent is top) that is `other ≤ self`.
        other.map.leq(&self.map, |_, _| true)
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.map.equals(&other.map)
    }
}

impl<K: Indexable + Clone> FromIterator<K> for PatriciaTreeSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for k in iter {
            set.insert(k);
        }
        set
    }
}

impl<K: fmt::Debug> fmt::Debug for PatriciaTreeSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(keys: &[u64]) -> PatriciaTreeSet<u64> {
        keys.iter().copied().collect()
    }

    #[test]
    fn insert_contains() {
        let mut s = PatriciaTreeSet::new();
        s.insert(4u64);
        s.insert(4);
        assert_eq!(s.size(), 1);
        assert!(s.contains(&4));
        assert!(!s.contains(&5));
    }

    #[test]
    fn set_algebra() {
        let a = set_of(&[1, 2, 3]);
        let b = set_of(&[2, 3, 4]);
        assert!(a.union(&b).equals(&set_of(&[1, 2, 3, 4])));
        assert!(a.intersection(&b).equals(&set_of(&[2, 3])));
        assert!(a.difference(&b).equals(&set_of(&[1])));
    }

    #[test]
    fn subset() {
        assert!(set_of(&[1, 3]).is_subset(&set_of(&[1, 2, 3])));
        assert!(!set_of(&[1, 4]).is_subset(&set_of(&[1, 2, 3])));
        assert!(set_of(&[]).is_subset(&set_of(&[1])));
    }

    #[test]
    fn ordered_iteration() {
        let s = set_of(&[8, 1, 99, 4]);
        let keys: Vec<u64> = s.iter().copied().collect();
        assert_eq!(keys, vec![1, 4, 8, 99]);
    }
}

impl<K: Indexable + Clone> PartialEq for PatriciaTreeSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<K: Indexable + Clone> Eq for PatriciaTreeSet<K> {}
