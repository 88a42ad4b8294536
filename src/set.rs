//! Set: key-only wrapper over a `RawTable` with unit values.

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
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash set whose collision strategy is chosen by `P`.
pub struct Set<K, S = DefaultHashBuilder, P = RobinHoodBuckets<K, ()>> {
    table: RawTable<K, (), S, P>,
}

pub type ChainedSet<K, S = DefaultHashBuilder> = Set<K, S, ChainedBuckets<K, ()>>;

pub type RobinHoodSet<K, S = DefaultHashBuilder> = Set<K, S, RobinHoodBuckets<K, ()>>;

impl<K, P> Set<K, DefaultHashBuilder, P>
where
    K: Eq + Hash,
    P: Strategy<K, ()>,
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

impl<K, S, P> Set<K, S, P>
where
    P: Strategy<K, ()>,
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
    pub fn as_table(&self) -> &RawTable<K, (), S, P> {
        &self.table
    }

    pub fn as_table_mut(&mut self) -> &mut RawTable<K, (), S, P> {
        &mut self.table
    }

    pub fn into_table(self) -> RawTable<K, (), S, P> {
        self.table
    }

    pub fn iter(&self) -> Iter<'_, K, S, P> {
        Iter {
            inner: self.table.iter(),
        }
    }

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

impl<K, S, P> Set<K, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: Strategy<K, ()>,
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

    /// Adds `key`; returns false if it was already present.
    pub fn try_insert(&mut self, key: K) -> Result<bool> {
        self.table
            .try_insert_full(key, ())
            .map(|(_, previous)| previous.is_none())
    }

    pub fn insert(&mut self, key: K) -> bool {
        match self.try_insert(key) {
            Ok(added) => added,
            Err(e) => crate::error::panic_from_error(e),
        }
    }

    /// Adds `key` if absent and returns a handle to its entry either way.
    pub fn insert_handle(&mut self, key: K) -> Handle {
        self.table.insert(key, ())
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_key_value(q).map(|(k, _)| k)
    }

    /// Removes `q`; returns whether it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.erase(q)
    }

    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(q).map(|(k, ())| k)
    }

    pub fn is_subset<S2, P2>(&self, other: &Set<K, S2, P2>) -> bool
    where
        S2: BuildHasher,
        P2: Strategy<K, ()>,
    {
        self.len() <= other.len() && self.iter().all(|k| other.contains(k))
    }

    pub fn is_disjoint<S2, P2>(&self, other: &Set<K, S2, P2>) -> bool
    where
        S2: BuildHasher,
        P2: Strategy<K, ()>,
    {
        if self.len() <= other.len() {
            self.iter().all(|k| !other.contains(k))
        } else {
            other.iter().all(|k| !self.contains(k))
        }
    }
}

impl<K, S, P> Clone for Set<K, S, P>
where
    K: Clone,
    S: Clone,
    P: Strategy<K, ()> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K, P> Default for Set<K, DefaultHashBuilder, P>
where
    K: Eq + Hash,
    P: Strategy<K, ()>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, P> fmt::Debug for Set<K, S, P>
where
    K: fmt::Debug,
    P: Strategy<K, ()>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S, P, S2, P2> PartialEq<Set<K, S2, P2>> for Set<K, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    S2: BuildHasher,
    P: Strategy<K, ()>,
    P2: Strategy<K, ()>,
{
    fn eq(&self, other: &Set<K, S2, P2>) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<K, S, P> Eq for Set<K, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: Strategy<K, ()>,
{
}

impl<K, S, P> FromIterator<K> for Set<K, S, P>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    P: Strategy<K, ()>,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<K, S, P> Extend<K> for Set<K, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: Strategy<K, ()>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

pub struct Iter<'a, K, S, P> {
    inner: raw_table::Iter<'a, K, (), S, P>,
}

impl<'a, K, S, P> Iterator for Iter<'a, K, S, P>
where
    P: Strategy<K, ()>,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(_, k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, S, P> ExactSizeIterator for Iter<'_, K, S, P> where P: Strategy<K, ()> {}

impl<'a, K, S, P> IntoIterator for &'a Set<K, S, P>
where
    P: Strategy<K, ()>,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K, S, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty() {
        let mut s: RobinHoodSet<&str> = Set::new();
        assert!(s.insert("x"));
        assert!(!s.insert("x"));
        assert_eq!(s.len(), 1);
        assert!(s.remove("x"));
        assert!(!s.remove("x"));
    }

    #[test]
    fn subset_and_disjoint() {
        let small: ChainedSet<u32> = (0..5).collect();
        let big: RobinHoodSet<u32> = (0..10).collect();
        let other: ChainedSet<u32> = (10..20).collect();
        assert!(small.is_subset(&big));
        assert!(!big.is_subset(&small));
        assert!(big.is_disjoint(&other));
        assert!(!small.is_disjoint(&big));
        let same: RobinHoodSet<u32> = (0..5).rev().collect();
        assert!(small == same);
    }

    #[test]
    fn take_returns_owned_key() {
        let mut s: ChainedSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(s.take("a"), Some("a".to_string()));
        assert_eq!(s.get("b").map(String::as_str), Some("b"));
        assert_eq!(format!("{s:?}"), "{\"b\"}");
    }
}
