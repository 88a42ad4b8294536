//! Map: key → value wrapper over a `RawTable`.

use crate::chained::ChainedBuckets;
use crate::config::TableConfig;
use crate::error::Result;
use crate::handle::Handle;
use crate::raw_table::{self, RawTable};
use crate::robin_hood::RobinHoodBuckets;
use crate::strategy::Strategy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash map whose collision strategy is chosen by `P`.
pub struct Map<K, V, S = DefaultHashBuilder, P = RobinHoodBuckets<K, V>> {
    table: RawTable<K, V, S, P>,
}

/// Map resolving collisions with inline-first chaining.
pub type ChainedMap<K, V, S = DefaultHashBuilder> = Map<K, V, S, ChainedBuckets<K, V>>;

/// Map resolving collisions with Robin Hood open addressing.
pub type RobinHoodMap<K, V, S = DefaultHashBuilder> = Map<K, V, S, RobinHoodBuckets<K, V>>;

impl<K, V, P> Map<K, V, DefaultHashBuilder, P>
where
    K: Eq + Hash,
    P: Strategy<K, V>,
{
    pub fn new() -> Self {
        Self {
            table: RawTable::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
        }
    }
}

impl<K, V, S, P> Map<K, V, S, P>
where
    P: Strategy<K, V>,
{
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// The underlying table, for handle-based access.
    pub fn as_table(&self) -> &RawTable<K, V, S, P> {
        &self.table
    }

    pub fn as_table_mut(&mut self) -> &mut RawTable<K, V, S, P> {
        &mut self.table
    }

    pub fn into_table(self) -> RawTable<K, V, S, P> {
        self.table
    }

    pub fn iter(&self) -> Iter<'_, K, V, S, P> {
        Iter {
            inner: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, P> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Drops every entry and returns to the initial capacity.
    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        self.table.try_reserve(capacity)
    }

    pub fn reserve(&mut self, capacity: usize) {
        self.table.reserve(capacity)
    }
}

impl<K, V, S, P> Map<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: Strategy<K, V>,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: RawTable::with_hasher(hasher),
        }
    }

    pub fn try_with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            table: RawTable::try_with_config_and_hasher(config, hasher)?,
        })
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        Self {
            table: RawTable::with_config_and_hasher(config, hasher),
        }
    }

    /// Inserts or updates `key`, returning the value it replaced.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.table.try_insert_full(key, value).map(|(_, old)| old)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.table.try_insert_full(key, value) {
            Ok((_, old)) => old,
            Err(e) => crate::error::panic_from_error(e),
        }
    }

    /// Inserts or updates `key` and returns a handle to its entry.
    pub fn insert_handle(&mut self, key: K, value: V) -> Handle {
        self.table.insert(key, value)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(q)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_key_value(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_mut(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(q)
    }
}

impl<K, V, S, P> Clone for Map<K, V, S, P>
where
    K: Clone,
    V: Clone,
    S: Clone,
    P: Strategy<K, V> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K, V, P> Default for Map<K, V, DefaultHashBuilder, P>
where
    K: Eq + Hash,
    P: Strategy<K, V>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> fmt::Debug for Map<K, V, S, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: Strategy<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, P, P2, S2> PartialEq<Map<K, V, S2, P2>> for Map<K, V, S, P>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
    P: Strategy<K, V>,
    P2: Strategy<K, V>,
{
    fn eq(&self, other: &Map<K, V, S2, P2>) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S, P> Eq for Map<K, V, S, P>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    P: Strategy<K, V>,
{
}

impl<K, V, S, P> FromIterator<(K, V)> for Map<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    P: Strategy<K, V>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S, P> Extend<(K, V)> for Map<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: Strategy<K, V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, Q, V, S, P> Index<&Q> for Map<K, V, S, P>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
    P: Strategy<K, V>,
{
    type Output = V;

    /// Panics if `key` is absent.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not present in map"),
        }
    }
}

pub struct Iter<'a, K, V, S, P> {
    inner: raw_table::Iter<'a, K, V, S, P>,
}

impl<'a, K, V, S, P> Iterator for Iter<'a, K, V, S, P>
where
    P: Strategy<K, V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S, P> ExactSizeIterator for Iter<'_, K, V, S, P> where P: Strategy<K, V> {}

pub struct IterMut<'a, K, V, P>
where
    P: Strategy<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    inner: raw_table::IterMut<'a, K, V, P>,
}

impl<'a, K, V, P> Iterator for IterMut<'a, K, V, P>
where
    P: Strategy<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, v)| (k, v))
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a Map<K, V, S, P>
where
    P: Strategy<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_and_remove_returns_value() {
        let mut m: ChainedMap<String, i32> = Map::new();
        assert_eq!(m.insert("a".to_string(), 1), None);
        assert_eq!(m.insert("a".to_string(), 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m["a"], 2);
        assert_eq!(m.remove("a"), Some(2));
        assert_eq!(m.remove("a"), None);
        assert!(m.is_empty());
    }

    #[test]
    fn maps_of_different_strategies_compare_by_content() {
        let a: ChainedMap<u32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
        let mut b: RobinHoodMap<u32, &str> = Map::new();
        b.insert(2, "two");
        b.insert(1, "one");
        assert!(a == b);
        b.insert(3, "three");
        assert!(a != b);
    }

    #[test]
    fn clone_debug_and_views() {
        let mut m: RobinHoodMap<u8, u8> = Map::new();
        m.insert(7, 70);
        let c = m.clone();
        m.insert(8, 80);
        assert_eq!(c.len(), 1);
        assert_eq!(format!("{c:?}"), "{7: 70}");
        let mut keys: Vec<_> = m.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec![7, 8]);
        for v in m.values_mut() {
            *v += 1;
        }
        assert_eq!(m.values().sum::<u8>(), 152);
        assert_eq!((&m).into_iter().len(), 2);
    }
}
