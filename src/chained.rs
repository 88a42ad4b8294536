//! Separate chaining with an inline first slot.
//!
//! Each bucket stores its first entry in place and spills further colliding
//! entries into a collision chain. Occupied buckets always have their inline
//! slot engaged: removing the inline entry promotes the chain head into it.

use crate::chain::{ArenaIterMut, Chain, ChainArena};
use crate::error::Result;
use crate::storage::{allocate_buckets, Slot};
use crate::strategy::{ideal_bucket, Link, Placement, Position, Sealed, Strategy};
use core::borrow::Borrow;
use core::mem;

/// One spilled entry.
#[derive(Clone, Debug)]
struct Overflow<K, V> {
    hash: u64,
    key: K,
    value: V,
}

#[derive(Clone, Debug)]
struct Bucket<K, V> {
    first_hash: u64,
    first: Slot<(K, V)>,
    collisions: Chain,
}

impl<K, V> Bucket<K, V> {
    fn vacant() -> Self {
        Self {
            first_hash: 0,
            first: Slot::vacant(),
            collisions: Chain::new(),
        }
    }
}

/// Inline-first chained bucket array.
#[derive(Clone, Debug)]
pub struct ChainedBuckets<K, V> {
    buckets: Vec<Bucket<K, V>>,
    arena: ChainArena<Overflow<K, V>>,
}

impl<K, V> ChainedBuckets<K, V> {
    fn engaged_from(&self, start: usize) -> Option<Position> {
        self.buckets
            .get(start..)?
            .iter()
            .position(|b| b.first.is_engaged())
            .map(|offset| Position::home(start + offset))
    }

    /// Number of entries living in collision chains.
    pub fn overflow_len(&self) -> usize {
        self.arena.len()
    }

    /// Per bucket in index order: whether the inline slot is engaged, and
    /// the length of the collision chain behind it.
    pub fn occupancy(&self) -> impl Iterator<Item = (bool, usize)> + '_ {
        self.buckets
            .iter()
            .map(|b| (b.first.is_engaged(), b.collisions.len()))
    }
}

impl<K, V> Sealed for ChainedBuckets<K, V> {}

impl<K, V> Strategy<K, V> for ChainedBuckets<K, V> {
    type IterMut<'a>
        = IterMut<'a, K, V>
    where
        K: 'a,
        V: 'a;

    fn allocate(capacity: usize) -> Result<Self> {
        Ok(Self {
            buckets: allocate_buckets(capacity, Bucket::vacant)?,
            arena: ChainArena::new(),
        })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn insert(&mut self, hash: u64, key: K, value: V) -> Placement<V>
    where
        K: Eq,
    {
        let index = ideal_bucket(hash, self.buckets.len());
        let bucket = &mut self.buckets[index];

        if !bucket.first.is_engaged() {
            bucket.first_hash = hash;
            bucket.first.engage((key, value));
            return Placement::Inserted {
                position: Position::home(index),
                displaced: false,
            };
        }

        let first_hash = bucket.first_hash;
        if let Some((k, v)) = bucket.first.get_mut() {
            if first_hash == hash && *k == key {
                let previous = mem::replace(v, value);
                return Placement::Replaced {
                    position: Position::home(index),
                    previous,
                };
            }
        }

        let arena = &self.arena;
        let existing = bucket
            .collisions
            .iter_keys(arena)
            .find(|&node| arena.get(node).is_some_and(|o| o.hash == hash && o.key == key));
        if let Some(node) = existing {
            if let Some(o) = self.arena.get_mut(node) {
                let previous = mem::replace(&mut o.value, value);
                return Placement::Replaced {
                    position: Position::chained(index, node),
                    previous,
                };
            }
        }

        let node = bucket
            .collisions
            .insert_front(&mut self.arena, Overflow { hash, key, value });
        Placement::Inserted {
            position: Position::chained(index, node),
            displaced: false,
        }
    }

    fn insert_unique(&mut self, hash: u64, key: K, value: V) -> Position {
        let index = ideal_bucket(hash, self.buckets.len());
        let bucket = &mut self.buckets[index];
        if bucket.first.is_engaged() {
            let node = bucket
                .collisions
                .insert_front(&mut self.arena, Overflow { hash, key, value });
            Position::chained(index, node)
        } else {
            bucket.first_hash = hash;
            bucket.first.engage((key, value));
            Position::home(index)
        }
    }

    fn find<Q>(&self, hash: u64, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let index = ideal_bucket(hash, self.buckets.len());
        let bucket = &self.buckets[index];
        let (k, _) = bucket.first.get()?;
        if bucket.first_hash == hash && k.borrow() == q {
            return Some(Position::home(index));
        }
        bucket
            .collisions
            .iter_keys(&self.arena)
            .find(|&node| {
                self.arena
                    .get(node)
                    .is_some_and(|o| o.hash == hash && o.key.borrow() == q)
            })
            .map(|node| Position::chained(index, node))
    }

    fn remove(&mut self, position: Position) -> Option<(u64, K, V)> {
        let bucket = self.buckets.get_mut(position.bucket)?;
        match position.link {
            Link::Home => {
                let (key, value) = bucket.first.disengage()?;
                let hash = bucket.first_hash;
                if let Some(head) = bucket.collisions.pop_front(&mut self.arena) {
                    log::trace!(
                        "promoting chain head into bucket {} ({} left in chain)",
                        position.bucket,
                        bucket.collisions.len()
                    );
                    bucket.first_hash = head.hash;
                    bucket.first.engage((head.key, head.value));
                }
                Some((hash, key, value))
            }
            Link::Chained(node) => {
                let o = bucket.collisions.delete_node(&mut self.arena, node)?;
                Some((o.hash, o.key, o.value))
            }
        }
    }

    fn entry(&self, position: Position) -> Option<(&K, &V)> {
        match position.link {
            Link::Home => {
                let (k, v) = self.buckets.get(position.bucket)?.first.get()?;
                Some((k, v))
            }
            Link::Chained(node) => self.arena.get(node).map(|o| (&o.key, &o.value)),
        }
    }

    fn entry_mut(&mut self, position: Position) -> Option<(&K, &mut V)> {
        match position.link {
            Link::Home => {
                let (k, v) = self.buckets.get_mut(position.bucket)?.first.get_mut()?;
                Some((&*k, v))
            }
            Link::Chained(node) => self.arena.get_mut(node).map(|o| (&o.key, &mut o.value)),
        }
    }

    fn first(&self) -> Option<Position> {
        self.engaged_from(0)
    }

    fn next(&self, position: Position) -> Option<Position> {
        let bucket = self.buckets.get(position.bucket)?;
        let following = match position.link {
            Link::Home => bucket.collisions.front(),
            Link::Chained(node) => self.arena.iterate_next(node),
        };
        match following {
            Some(node) => Some(Position::chained(position.bucket, node)),
            None => self.engaged_from(position.bucket + 1),
        }
    }

    fn probe_distance(&self, position: Position) -> Option<usize> {
        match position.link {
            Link::Home => self
                .buckets
                .get(position.bucket)?
                .first
                .is_engaged()
                .then_some(0),
            Link::Chained(node) => {
                let bucket = self.buckets.get(position.bucket)?;
                bucket
                    .collisions
                    .position_of(&self.arena, node)
                    .map(|i| i + 1)
            }
        }
    }

    fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            capacity: self.buckets.len(),
            firsts: self.buckets.iter_mut().enumerate(),
            overflow: self.arena.iter_mut(),
        }
    }

    fn into_entries(mut self, mut f: impl FnMut(u64, K, V)) {
        for bucket in &mut self.buckets {
            if let Some((key, value)) = bucket.first.disengage() {
                f(bucket.first_hash, key, value);
            }
        }
        for o in self.arena.drain() {
            f(o.hash, o.key, o.value);
        }
    }
}

/// Mutable iterator over a `ChainedBuckets`: inline entries in bucket order,
/// then chain entries in arena order.
pub struct IterMut<'a, K, V> {
    capacity: usize,
    firsts: core::iter::Enumerate<core::slice::IterMut<'a, Bucket<K, V>>>,
    overflow: ArenaIterMut<'a, Overflow<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Position, &'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let inline = self.firsts.find_map(|(i, b)| {
            b.first
                .get_mut()
                .map(|(k, v)| (Position::home(i), &*k, v))
        });
        if inline.is_some() {
            return inline;
        }
        let capacity = self.capacity;
        self.overflow.next().map(|(node, o)| {
            let bucket = ideal_bucket(o.hash, capacity);
            (Position::chained(bucket, node), &o.key, &mut o.value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Table = ChainedBuckets<u64, &'static str>;

    fn table(capacity: usize) -> Table {
        ChainedBuckets::allocate(capacity).unwrap()
    }

    fn position_of(p: Placement<&'static str>) -> Position {
        match p {
            Placement::Inserted { position, .. } => position,
            Placement::Replaced { position, .. } => position,
        }
    }

    #[test]
    fn first_key_lands_inline_then_chain() {
        let mut t = table(4);
        let a = position_of(t.insert(1, 1, "a"));
        let b = position_of(t.insert(5, 5, "b"));
        let c = position_of(t.insert(9, 9, "c"));
        assert!(a.is_home());
        assert!(!b.is_home());
        assert_eq!(b.bucket(), 1);
        assert_eq!(t.overflow_len(), 2);
        // Newest collision is pushed to the chain front.
        assert_eq!(t.probe_distance(c), Some(1));
        assert_eq!(t.probe_distance(b), Some(2));
        assert_eq!(t.probe_distance(a), Some(0));
    }

    #[test]
    fn replaces_inline_and_chained_values() {
        let mut t = table(4);
        t.insert(1, 1, "a");
        t.insert(5, 5, "b");
        match t.insert(1, 1, "A") {
            Placement::Replaced { previous, position } => {
                assert_eq!(previous, "a");
                assert!(position.is_home());
            }
            other => panic!("unexpected placement: {other:?}"),
        }
        match t.insert(5, 5, "B") {
            Placement::Replaced { previous, position } => {
                assert_eq!(previous, "b");
                assert!(!position.is_home());
            }
            other => panic!("unexpected placement: {other:?}"),
        }
        assert_eq!(t.overflow_len(), 1);
    }

    #[test]
    fn erasing_inline_promotes_chain_head() {
        let mut t = table(4);
        let a = position_of(t.insert(1, 1, "a"));
        t.insert(5, 5, "b");
        t.insert(9, 9, "c");
        assert_eq!(t.remove(a), Some((1, 1, "a")));
        // Chain head (9) moved inline; 5 is still chained.
        assert_eq!(t.find(9, &9), Some(Position::home(1)));
        let five = t.find(5, &5).unwrap();
        assert!(!five.is_home());
        assert_eq!(t.probe_distance(five), Some(1));
        assert_eq!(t.overflow_len(), 1);
    }

    #[test]
    fn erasing_chain_node_unlinks_it() {
        let mut t = table(4);
        t.insert(1, 1, "a");
        let b = position_of(t.insert(5, 5, "b"));
        t.insert(9, 9, "c");
        assert_eq!(t.remove(b), Some((5, 5, "b")));
        assert_eq!(t.find(5, &5), None);
        assert!(t.find(9, &9).is_some());
        assert!(t.find(1, &1).is_some());
        assert_eq!(t.remove(b), None);
    }

    #[test]
    fn iteration_visits_inline_then_chain_then_next_bucket() {
        let mut t = table(4);
        t.insert(1, 1, "a");
        t.insert(5, 5, "b");
        t.insert(2, 2, "c");
        let mut seen = Vec::new();
        let mut cursor = t.first();
        while let Some(p) = cursor {
            seen.push(*t.entry(p).unwrap().0);
            cursor = t.next(p);
        }
        assert_eq!(seen, vec![1, 5, 2]);
    }

    #[test]
    fn iter_mut_and_into_entries_cover_everything() {
        let mut t = table(2);
        for k in 0..6u64 {
            t.insert(k, k, "v");
        }
        let mut positions = Vec::new();
        for (p, k, v) in t.iter_mut() {
            *v = "w";
            positions.push((p, *k));
        }
        assert_eq!(positions.len(), 6);
        for (p, k) in positions {
            assert_eq!(t.entry(p), Some((&k, &"w")));
        }
        let mut all = Vec::new();
        t.into_entries(|h, k, v| all.push((h, k, v)));
        all.sort();
        let expected: Vec<_> = (0..6u64).map(|k| (k, k, "w")).collect();
        assert_eq!(all, expected);
    }
}
