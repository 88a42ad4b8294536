//! The collision-resolution seam of the table core.
//!
//! `RawTable` owns size accounting, growth policy and handle validation, and
//! delegates everything that depends on bucket layout to a `Strategy`: the
//! bucket array itself, probing, displacement and iteration order.
//!
//! Strategies never hash keys. The table hashes once and passes the hash in;
//! strategies store it next to the entry and rehash from the stored value, so
//! growth runs no user code.

use crate::chain::ChainKey;
use crate::error::Result;
use core::borrow::Borrow;

/// Locates one entry inside a strategy's buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) bucket: usize,
    pub(crate) link: Link,
}

/// Where inside its bucket an entry lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Link {
    /// The bucket's own slot.
    Home,
    /// A node of the bucket's collision chain.
    Chained(ChainKey),
}

impl Position {
    #[inline]
    pub(crate) fn home(bucket: usize) -> Self {
        Self {
            bucket,
            link: Link::Home,
        }
    }

    #[inline]
    pub(crate) fn chained(bucket: usize, node: ChainKey) -> Self {
        Self {
            bucket,
            link: Link::Chained(node),
        }
    }

    /// Index of the bucket holding the entry.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// True when the entry sits in its bucket's own slot rather than in an
    /// overflow chain.
    pub fn is_home(&self) -> bool {
        self.link == Link::Home
    }
}

/// Outcome of placing a key.
#[derive(Debug)]
pub enum Placement<V> {
    /// The key was absent and now lives at `position`. `displaced` is true
    /// when placing it moved at least one other entry.
    Inserted { position: Position, displaced: bool },
    /// The key was present; its value was overwritten in place.
    Replaced { position: Position, previous: V },
}

mod private {
    pub trait Sealed {}
}

pub(crate) use private::Sealed;

/// Bucket layout and collision resolution behind a `RawTable`.
///
/// Implemented by [`ChainedBuckets`](crate::ChainedBuckets) and
/// [`RobinHoodBuckets`](crate::RobinHoodBuckets). Positions handed to a
/// strategy must have been produced by that same strategy instance.
pub trait Strategy<K, V>: Sealed + Sized {
    /// Iterator over every entry with mutable access to values.
    type IterMut<'a>: Iterator<Item = (Position, &'a K, &'a mut V)>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    /// Allocates `capacity` vacant buckets.
    fn allocate(capacity: usize) -> Result<Self>;

    /// Number of buckets.
    fn capacity(&self) -> usize;

    /// Places `key`, overwriting the value of an equal key if one exists.
    fn insert(&mut self, hash: u64, key: K, value: V) -> Placement<V>
    where
        K: Eq;

    /// Places a key known to be absent. Never compares keys.
    fn insert_unique(&mut self, hash: u64, key: K, value: V) -> Position;

    fn find<Q>(&self, hash: u64, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq;

    /// Removes the entry at `position`, returning its stored hash.
    fn remove(&mut self, position: Position) -> Option<(u64, K, V)>;

    fn entry(&self, position: Position) -> Option<(&K, &V)>;

    fn entry_mut(&mut self, position: Position) -> Option<(&K, &mut V)>;

    /// First occupied position in iteration order.
    fn first(&self) -> Option<Position>;

    /// Occupied position following `position` in iteration order.
    fn next(&self, position: Position) -> Option<Position>;

    /// Distance of the entry from the position its hash designates.
    fn probe_distance(&self, position: Position) -> Option<usize>;

    fn iter_mut(&mut self) -> Self::IterMut<'_>;

    /// Consumes the buckets, passing every entry with its stored hash to `f`.
    fn into_entries(self, f: impl FnMut(u64, K, V));
}

/// Bucket designated by `hash` in an array of `capacity` buckets.
#[inline]
pub(crate) fn ideal_bucket(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (hash % capacity as u64) as usize
}
