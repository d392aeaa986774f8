use core::hash::Hash;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use fxhash::FxBuildHasher;

use crate::error::GraphError;

struct Inner<K, V> {
    entries: IndexMap<K, V, FxBuildHasher>,
    version: u64,
}

/// An associative container keyed by arbitrary hashable values, with
/// insertion-order iteration and a version counter that lets lazily
/// constructed iterators detect concurrent structural mutation.
///
/// `KeyedMap` is the component every graph variant's node map, adjacency
/// map, and multi-edge key-map is built from (`spec.md` §4.1). Mirrored
/// sides of an edge share one `KeyedMap` (or attribute record) by holding
/// clones of the same handle — `KeyedMap::clone` is a shallow, reference-
/// counted clone for exactly this reason; use [`KeyedMap::deep_clone`] when
/// independent storage is required.
pub struct KeyedMap<K, V> {
    inner: Rc<RefCell<Inner<K, V>>>,
}

impl<K, V> Clone for KeyedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for KeyedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: IndexMap::with_hasher(FxBuildHasher::default()),
                version: 0,
            })),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
                version: 0,
            })),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Returns `true` when `self` and `other` are the same underlying
    /// storage (i.e. clones of one `Rc`) — the reference-identity check
    /// `spec.md` §8 requires for mirrored adjacency entries.
    #[must_use]
    pub fn is_same_storage(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current version counter, exposed so graph-level code can assert
    /// on mutation bookkeeping in tests.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

impl<K, V> KeyedMap<K, V>
where
    K: Clone + Eq + Hash,
{
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Runs `f` against a borrowed reference to the value, avoiding a clone
    /// when the caller only needs to inspect it.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.inner.borrow().entries.get(key).map(f)
    }

    pub fn with_mut<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.inner.borrow_mut().entries.get_mut(key).map(f)
    }

    /// Inserts or overwrites `key`, returning the previous value if present.
    /// Bumps the version counter only when the key set actually grows,
    /// matching "structural mutation" in the iterator-invalidation contract.
    pub fn set(&self, key: K, value: V) -> Option<V> {
        let mut inner = self.inner.borrow_mut();
        let is_new = !inner.entries.contains_key(&key);
        let old = inner.entries.insert(key, value);
        if is_new {
            inner.version += 1;
        }
        old
    }

    /// Inserts `key` with `value` only if absent, otherwise runs `merge`
    /// against the existing value in place. Used by `add_node`/`add_edge`'s
    /// "merge into the existing record if present" behavior.
    pub fn upsert_with(&self, key: K, make: impl FnOnce() -> V, merge: impl FnOnce(&mut V)) {
        let mut inner = self.inner.borrow_mut();
        if let Some(existing) = inner.entries.get_mut(&key) {
            merge(existing);
        } else {
            inner.entries.insert(key, make());
            inner.version += 1;
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.borrow_mut();
        let removed = inner.entries.shift_remove(key);
        if removed.is_some() {
            inner.version += 1;
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.entries.is_empty() {
            inner.entries.clear();
            inner.version += 1;
        }
    }

    #[must_use]
    pub fn keys_vec(&self) -> Vec<K> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    #[must_use]
    pub fn values_vec(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.borrow().entries.values().cloned().collect()
    }

    #[must_use]
    pub fn entries_vec(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn entries(&self) -> KeyedIter<K, V>
    where
        V: Clone,
    {
        KeyedIter {
            inner: Rc::clone(&self.inner),
            version: self.inner.borrow().version,
            index: 0,
            failed: false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = crate::error::Result<K>>
    where
        V: Clone,
    {
        self.entries().map(|r| r.map(|(k, _)| k))
    }

    pub fn values(&self) -> impl Iterator<Item = crate::error::Result<V>>
    where
        V: Clone,
    {
        self.entries().map(|r| r.map(|(_, v)| v))
    }

    /// Builds an independent `KeyedMap` with the same entries; `clone_value`
    /// is applied to each stored value so callers can deep-clone values that
    /// are themselves shared handles (e.g. another `KeyedMap` or `Rc<RefCell<_>>`).
    #[must_use]
    pub fn deep_clone_with(&self, mut clone_value: impl FnMut(&V) -> V) -> Self {
        let inner = self.inner.borrow();
        let entries = inner
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), clone_value(v)))
            .collect();
        Self {
            inner: Rc::new(RefCell::new(Inner { entries, version: 0 })),
        }
    }
}

impl<K, V> KeyedMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        self.deep_clone_with(Clone::clone)
    }
}

/// A lazy, version-checked iterator over a [`KeyedMap`]'s entries.
///
/// Captures the map's version at creation; if a structural mutation lands
/// on the map before this iterator is exhausted, the next `next()` call
/// returns `Err(GraphError::MapChanged)` once and the iterator is then
/// fused to `None`.
pub struct KeyedIter<K, V> {
    inner: Rc<RefCell<Inner<K, V>>>,
    version: u64,
    index: usize,
    failed: bool,
}

impl<K, V> Iterator for KeyedIter<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    type Item = crate::error::Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let inner = self.inner.borrow();
        if inner.version != self.version {
            self.failed = true;
            return Some(Err(error_stack::Report::new(GraphError::MapChanged)));
        }
        let item = inner
            .entries
            .get_index(self.index)
            .map(|(k, v)| (k.clone(), v.clone()));
        drop(inner);
        match item {
            Some(pair) => {
                self.index += 1;
                Some(Ok(pair))
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_bumps_version_only_on_new_key() {
        let map: KeyedMap<&str, i32> = KeyedMap::new();
        map.set("a", 1);
        let v1 = map.version();
        map.set("a", 2);
        assert_eq!(map.version(), v1, "overwriting an existing key is not structural");
        map.set("b", 3);
        assert!(map.version() > v1, "inserting a new key is structural");
    }

    #[test]
    fn remove_bumps_version_only_when_present() {
        let map: KeyedMap<&str, i32> = KeyedMap::new();
        map.set("a", 1);
        let v1 = map.version();
        assert!(map.remove("missing").is_none());
        assert_eq!(map.version(), v1);
        assert!(map.remove("a").is_some());
        assert!(map.version() > v1);
    }

    #[test]
    fn clone_shares_storage_deep_clone_does_not() {
        let map: KeyedMap<&str, i32> = KeyedMap::new();
        map.set("a", 1);

        let shallow = map.clone();
        assert!(map.is_same_storage(&shallow));
        shallow.set("b", 2);
        assert_eq!(map.len(), 2, "shallow clone shares the underlying storage");

        let deep = map.deep_clone();
        assert!(!map.is_same_storage(&deep));
        deep.set("c", 3);
        assert_eq!(map.len(), 2, "deep clone does not affect the original");
    }

    #[test]
    fn iterator_fails_once_map_mutates_mid_iteration() {
        let map: KeyedMap<&str, i32> = KeyedMap::new();
        map.set("a", 1);
        map.set("b", 2);

        let mut iter = map.entries();
        assert_eq!(iter.next().unwrap().unwrap(), ("a", 1));

        map.set("c", 3);

        match iter.next() {
            Some(Err(report)) => assert_eq!(*report.current_context(), GraphError::MapChanged),
            other => panic!("expected MapChanged error, got {other:?}"),
        }
        assert!(iter.next().is_none(), "iterator fuses after the error");
    }

    #[test]
    fn iterator_unaffected_by_value_only_overwrite() {
        let map: KeyedMap<&str, i32> = KeyedMap::new();
        map.set("a", 1);
        map.set("b", 2);

        let mut iter = map.entries();
        map.set("a", 100);
        let collected: Vec<_> = iter.by_ref().collect::<crate::error::Result<Vec<_>>>().unwrap();
        assert_eq!(collected, vec![("a", 100), ("b", 2)]);
    }
}
