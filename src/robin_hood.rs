//! Open addressing with Robin Hood displacement and backward-shift deletion.
//!
//! Every occupied bucket records how far it sits past its ideal bucket
//! (`hash mod capacity`). Insertion lets the entry farthest from home keep
//! displacing entries closer to home; lookup stops as soon as it meets a
//! resident closer to home than the probe itself; deletion pulls the rest of
//! the probe run back one bucket. There are no tombstones, so the recorded
//! distances always equal the true displacement.

use crate::error::Result;
use crate::storage::allocate_buckets;
use crate::strategy::{ideal_bucket, Link, Placement, Position, Sealed, Strategy};
use core::borrow::Borrow;
use core::mem;

#[derive(Clone, Debug)]
struct Resident<K, V> {
    hash: u64,
    /// Buckets past the ideal bucket; 0 means home.
    distance: usize,
    key: K,
    value: V,
}

type Bucket<K, V> = Option<Resident<K, V>>;

/// Robin Hood open-addressing bucket array.
#[derive(Clone, Debug)]
pub struct RobinHoodBuckets<K, V> {
    buckets: Vec<Bucket<K, V>>,
}

impl<K, V> RobinHoodBuckets<K, V> {
    /// Probe distance of every bucket in index order, `None` when vacant.
    pub fn distances(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.buckets.iter().map(|b| b.as_ref().map(|r| r.distance))
    }

    #[inline]
    fn step(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.buckets.len() {
            0
        } else {
            next
        }
    }

    fn occupied_from(&self, start: usize) -> Option<Position> {
        self.buckets
            .get(start..)?
            .iter()
            .position(Option::is_some)
            .map(|offset| Position::home(start + offset))
    }

    fn resident(&self, position: Position) -> Option<&Resident<K, V>> {
        match position.link {
            Link::Home => self.buckets.get(position.bucket)?.as_ref(),
            Link::Chained(_) => None,
        }
    }

    fn resident_mut(&mut self, position: Position) -> Option<&mut Resident<K, V>> {
        match position.link {
            Link::Home => self.buckets.get_mut(position.bucket)?.as_mut(),
            Link::Chained(_) => None,
        }
    }

    /// Carries `carried` along its probe run until it lands in a vacant
    /// bucket, swapping it with every resident closer to home. Returns the
    /// bucket where the first swap happened, or where `carried` itself landed
    /// if it never swapped.
    fn displace(&mut self, mut index: usize, mut carried: Resident<K, V>) -> (usize, bool) {
        let mut landed: Option<usize> = None;
        for _ in 0..self.buckets.len() {
            let Some(resident) = self.buckets[index].as_mut() else {
                self.buckets[index] = Some(carried);
                return (landed.unwrap_or(index), landed.is_some());
            };
            if resident.distance < carried.distance {
                mem::swap(resident, &mut carried);
                landed.get_or_insert(index);
            }
            index = self.step(index);
            carried.distance += 1;
        }
        exhausted(self.buckets.len())
    }
}

#[cold]
fn exhausted(capacity: usize) -> ! {
    log::error!("robin hood probe visited all {capacity} buckets without finding a vacancy");
    panic!("hash table invariant violated: no vacant bucket among {capacity}")
}

impl<K, V> Sealed for RobinHoodBuckets<K, V> {}

impl<K, V> Strategy<K, V> for RobinHoodBuckets<K, V> {
    type IterMut<'a>
        = IterMut<'a, K, V>
    where
        K: 'a,
        V: 'a;

    fn allocate(capacity: usize) -> Result<Self> {
        Ok(Self {
            buckets: allocate_buckets(capacity, || None)?,
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
        let mut index = ideal_bucket(hash, self.buckets.len());
        let mut distance = 0;
        // Walk until the incoming key either meets its equal, finds a vacancy,
        // or reaches a resident closer to home than itself. In the last case it
        // takes that bucket and the evicted resident continues the probe.
        for _ in 0..self.buckets.len() {
            let Some(resident) = self.buckets[index].as_mut() else {
                self.buckets[index] = Some(Resident {
                    hash,
                    distance,
                    key,
                    value,
                });
                return Placement::Inserted {
                    position: Position::home(index),
                    displaced: false,
                };
            };
            if resident.hash == hash && resident.key == key {
                let previous = mem::replace(&mut resident.value, value);
                return Placement::Replaced {
                    position: Position::home(index),
                    previous,
                };
            }
            if resident.distance < distance {
                let mut evicted = mem::replace(
                    resident,
                    Resident {
                        hash,
                        distance,
                        key,
                        value,
                    },
                );
                let next = self.step(index);
                evicted.distance += 1;
                self.displace(next, evicted);
                return Placement::Inserted {
                    position: Position::home(index),
                    displaced: true,
                };
            }
            index = self.step(index);
            distance += 1;
        }
        exhausted(self.buckets.len())
    }

    fn insert_unique(&mut self, hash: u64, key: K, value: V) -> Position {
        let index = ideal_bucket(hash, self.buckets.len());
        let carried = Resident {
            hash,
            distance: 0,
            key,
            value,
        };
        let (landed, _) = self.displace(index, carried);
        Position::home(landed)
    }

    fn find<Q>(&self, hash: u64, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut index = ideal_bucket(hash, self.buckets.len());
        for distance in 0..self.buckets.len() {
            let resident = self.buckets[index].as_ref()?;
            // No entry of this probe run can sit past a resident closer to
            // home than the probe.
            if resident.distance < distance {
                return None;
            }
            if resident.hash == hash && resident.key.borrow() == q {
                return Some(Position::home(index));
            }
            index = self.step(index);
        }
        None
    }

    fn remove(&mut self, position: Position) -> Option<(u64, K, V)> {
        if position.link != Link::Home {
            return None;
        }
        let removed = self.buckets.get_mut(position.bucket)?.take()?;
        let mut hole = position.bucket;
        for _ in 1..self.buckets.len() {
            let next = self.step(hole);
            match self.buckets[next].take() {
                Some(mut shifted) if shifted.distance > 0 => {
                    shifted.distance -= 1;
                    self.buckets[hole] = Some(shifted);
                    hole = next;
                }
                other => {
                    self.buckets[next] = other;
                    break;
                }
            }
        }
        Some((removed.hash, removed.key, removed.value))
    }

    fn entry(&self, position: Position) -> Option<(&K, &V)> {
        self.resident(position).map(|r| (&r.key, &r.value))
    }

    fn entry_mut(&mut self, position: Position) -> Option<(&K, &mut V)> {
        self.resident_mut(position).map(|r| (&r.key, &mut r.value))
    }

    fn first(&self) -> Option<Position> {
        self.occupied_from(0)
    }

    fn next(&self, position: Position) -> Option<Position> {
        self.occupied_from(position.bucket + 1)
    }

    fn probe_distance(&self, position: Position) -> Option<usize> {
        self.resident(position).map(|r| r.distance)
    }

    fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.buckets.iter_mut().enumerate(),
        }
    }

    fn into_entries(self, mut f: impl FnMut(u64, K, V)) {
        for r in self.buckets.into_iter().flatten() {
            f(r.hash, r.key, r.value);
        }
    }
}

/// Mutable iterator over a `RobinHoodBuckets`, in bucket order.
pub struct IterMut<'a, K, V> {
    it: core::iter::Enumerate<core::slice::IterMut<'a, Bucket<K, V>>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Position, &'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.find_map(|(i, b)| {
            b.as_mut()
                .map(|r| (Position::home(i), &r.key, &mut r.value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(capacity: usize) -> RobinHoodBuckets<u64, &'static str> {
        RobinHoodBuckets::allocate(capacity).unwrap()
    }

    fn inserted(p: Placement<&'static str>) -> (usize, bool) {
        match p {
            Placement::Inserted {
                position,
                displaced,
            } => (position.bucket(), displaced),
            Placement::Replaced { .. } => panic!("expected a fresh insert"),
        }
    }

    fn distance_at(t: &RobinHoodBuckets<u64, &'static str>, bucket: usize) -> Option<usize> {
        t.probe_distance(Position::home(bucket))
    }

    /// Every resident's recorded distance equals its actual offset from home.
    fn assert_distances_exact(t: &RobinHoodBuckets<u64, &'static str>) {
        let cap = t.buckets.len();
        for (i, b) in t.buckets.iter().enumerate() {
            if let Some(r) = b {
                let home = ideal_bucket(r.hash, cap);
                assert_eq!((i + cap - home) % cap, r.distance, "bucket {i}");
            }
        }
    }

    #[test]
    fn colliding_key_probes_past_home() {
        let mut t = table(8);
        assert_eq!(inserted(t.insert(3, 3, "a")), (3, false));
        assert_eq!(inserted(t.insert(11, 11, "b")), (4, false));
        assert_eq!(distance_at(&t, 3), Some(0));
        assert_eq!(distance_at(&t, 4), Some(1));
        assert_distances_exact(&t);
    }

    #[test]
    fn richer_resident_is_displaced() {
        let mut t = table(8);
        // 4 sits home at bucket 4; 3 and 11 both want bucket 3.
        t.insert(4, 4, "home");
        t.insert(3, 3, "a");
        let (bucket, displaced) = inserted(t.insert(11, 11, "b"));
        // 11 reaches bucket 4 at distance 1 and evicts 4 (distance 0).
        assert_eq!((bucket, displaced), (4, true));
        assert_eq!(t.find(11, &11), Some(Position::home(4)));
        assert_eq!(t.find(4, &4), Some(Position::home(5)));
        assert_eq!(distance_at(&t, 5), Some(1));
        assert_distances_exact(&t);
    }

    #[test]
    fn equal_key_is_overwritten_in_place() {
        let mut t = table(8);
        t.insert(3, 3, "a");
        match t.insert(3, 3, "b") {
            Placement::Replaced { position, previous } => {
                assert_eq!(position, Position::home(3));
                assert_eq!(previous, "a");
            }
            other => panic!("unexpected placement: {other:?}"),
        }
        assert_eq!(t.entry(Position::home(3)), Some((&3, &"b")));
    }

    #[test]
    fn probe_wraps_around_the_end() {
        let mut t = table(4);
        t.insert(3, 3, "a");
        assert_eq!(inserted(t.insert(7, 7, "b")), (0, false));
        assert_eq!(distance_at(&t, 0), Some(1));
        assert_eq!(t.find(7, &7), Some(Position::home(0)));
        assert_distances_exact(&t);
    }

    #[test]
    fn find_stops_early_at_richer_resident() {
        let mut t = table(8);
        t.insert(3, 3, "a");
        t.insert(4, 4, "b");
        // 19 would live at bucket 3; bucket 4's resident is home (distance 0)
        // while the probe is at distance 1, so the search ends there.
        assert_eq!(t.find(19, &19), None);
        assert_eq!(t.find(5, &5), None);
    }

    #[test]
    fn backward_shift_pulls_run_back() {
        let mut t = table(8);
        t.insert(2, 2, "a");
        t.insert(10, 10, "b");
        t.insert(18, 18, "c");
        t.insert(5, 5, "d");
        // Run: 2@2(d0) 10@3(d1) 18@4(d2) 5@5(d0).
        let removed = t.remove(Position::home(2)).unwrap();
        assert_eq!(removed, (2, 2, "a"));
        assert_eq!(t.find(10, &10), Some(Position::home(2)));
        assert_eq!(t.find(18, &18), Some(Position::home(3)));
        assert_eq!(distance_at(&t, 2), Some(0));
        assert_eq!(distance_at(&t, 3), Some(1));
        // 5 was home and stays put; bucket 4 is now vacant.
        assert_eq!(t.find(5, &5), Some(Position::home(5)));
        assert!(t.buckets[4].is_none());
        assert_distances_exact(&t);
    }

    #[test]
    fn insert_unique_reports_final_bucket() {
        let mut t = table(8);
        t.insert_unique(3, 3, "a");
        let p = t.insert_unique(11, 11, "b");
        assert_eq!(p, Position::home(4));
        assert_eq!(t.entry(p), Some((&11, &"b")));
    }

    #[test]
    fn iteration_is_bucket_order() {
        let mut t = table(8);
        t.insert(6, 6, "x");
        t.insert(1, 1, "y");
        let first = t.first().unwrap();
        assert_eq!(first, Position::home(1));
        assert_eq!(t.next(first), Some(Position::home(6)));
        assert_eq!(t.next(Position::home(6)), None);

        for (_, _, v) in t.iter_mut() {
            *v = "z";
        }
        let mut all = Vec::new();
        t.into_entries(|h, k, v| all.push((h, k, v)));
        all.sort();
        assert_eq!(all, vec![(1, 1, "z"), (6, 6, "z")]);
    }

    #[test]
    #[should_panic(expected = "no vacant bucket")]
    fn full_table_is_fatal() {
        let mut t = table(2);
        t.insert(0, 0, "a");
        t.insert(1, 1, "b");
        t.insert(2, 2, "c");
    }
}
