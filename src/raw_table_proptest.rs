#![cfg(test)]

// State-machine property tests for RawTable, kept inside the crate so the
// checks can look at bucket layout.

use crate::hashers::IdentityBuildHasher;
use crate::{ChainedBuckets, Handle, RawTable, RobinHoodBuckets, TableConfig, TableError};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Sends every key to the same bucket.
#[derive(Clone, Copy, Default)]
struct ConstBuildHasher;

struct ConstHasher;

impl Hasher for ConstHasher {
    fn finish(&self) -> u64 {
        7
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;

    fn build_hasher(&self) -> ConstHasher {
        ConstHasher
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u64, i32),
    Remove(u64),
    Find(u64),
    EraseAt(u64),
    Mutate(u64, i32),
    Reserve(usize),
    Clear,
    Walk,
}

fn arb_ops(keys: u64) -> impl proptest::strategy::Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        4 => (0..keys, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (0..keys).prop_map(Op::Remove),
        2 => (0..keys).prop_map(Op::Find),
        2 => (0..keys).prop_map(Op::EraseAt),
        1 => (0..keys, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => (0usize..200).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
        1 => Just(Op::Walk),
    ];
    proptest::collection::vec(op, 1..120)
}

type Table<S, P> = RawTable<u64, i32, S, P>;

/// Replays `ops` against `sut` and a std `HashMap`, checking after every step
/// that contents, load factor and handle validity agree.
fn run<S, P>(
    mut sut: Table<S, P>,
    ops: Vec<Op>,
    layout: impl Fn(&P) -> Result<(), TestCaseError>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
    P: crate::Strategy<u64, i32>,
{
    let initial = sut.capacity();
    let mut model: HashMap<u64, i32> = HashMap::new();
    let mut tracked: Vec<(Handle, u64)> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let (h, previous) = sut.try_insert_full(k, v).expect("insert");
                prop_assert_eq!(previous, model.insert(k, v));
                prop_assert_eq!(h.generation(), sut.generation());
                prop_assert_eq!(sut.entry_at(h), Ok((&k, &v)));
                tracked.push((h, k));
            }
            Op::Remove(k) => {
                let expected = model.remove(&k).map(|v| (k, v));
                prop_assert_eq!(sut.remove(&k), expected);
            }
            Op::Find(k) => {
                let h = sut.find(&k);
                prop_assert_eq!(h.is_end(), !model.contains_key(&k));
                if !h.is_end() {
                    tracked.push((h, k));
                }
            }
            Op::EraseAt(k) => {
                let h = sut.find(&k);
                match model.remove(&k) {
                    Some(v) => {
                        prop_assert_eq!(sut.erase_at(h), Ok((k, v)));
                    }
                    None => {
                        prop_assert_eq!(sut.erase_at(h), Err(TableError::EndOfTable));
                    }
                }
                if !h.is_end() {
                    prop_assert!(matches!(
                        sut.entry_at(h),
                        Err(TableError::StaleHandle { .. })
                    ), "expected StaleHandle");
                }
            }
            Op::Mutate(k, d) => match (sut.get_mut(&k), model.get_mut(&k)) {
                (Some(s), Some(m)) => {
                    *s = s.wrapping_add(d);
                    *m = m.wrapping_add(d);
                }
                (None, None) => {}
                (s, m) => {
                    prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m);
                }
            },
            Op::Reserve(n) => {
                let before = sut.capacity();
                sut.reserve(n);
                prop_assert_eq!(sut.capacity(), before.max(n));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), initial);
            }
            Op::Walk => {
                let mut seen = BTreeSet::new();
                let mut h = sut.begin();
                while !h.is_end() {
                    let (k, v) = sut.entry_at(h).expect("live cursor");
                    prop_assert!(seen.insert(*k), "key {} visited twice", k);
                    prop_assert_eq!(model.get(k), Some(v));
                    h = sut.next(h).expect("live cursor");
                }
                prop_assert_eq!(seen.len(), model.len());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
        }

        // Current handles resolve to their key; older ones fail closed.
        for &(h, k) in tracked.iter().rev().take(8) {
            if h.generation() == sut.generation() && model.contains_key(&k) {
                prop_assert_eq!(sut.entry_at(h).map(|(k, _)| *k), Ok(k));
            } else if h.generation() != sut.generation() {
                prop_assert!(matches!(
                    sut.entry_at(h),
                    Err(TableError::StaleHandle { .. })
                ), "expected StaleHandle");
            }
        }

        // Every entry sits where its stored distance says it does.
        let capacity = sut.capacity();
        for (h, k, _) in sut.iter() {
            let ideal = (sut.hasher().hash_one(k) % capacity as u64) as usize;
            let distance = sut.probe_distance(h).expect("live handle");
            let position = h.position().expect("not end");
            if position.is_home() {
                prop_assert_eq!((position.bucket() + capacity - ideal) % capacity, distance);
            } else {
                prop_assert_eq!(position.bucket(), ideal);
                prop_assert!(distance >= 1);
            }
        }
        layout(sut.buckets())?;
    }
    Ok(())
}

/// No tombstones: inside a probe run, each resident is at most one bucket
/// farther from home than its predecessor, and runs never start displaced.
fn robin_hood_runs(buckets: &RobinHoodBuckets<u64, i32>) -> Result<(), TestCaseError> {
    let distances: Vec<Option<usize>> = buckets.distances().collect();
    let n = distances.len();
    for (i, d) in distances.iter().enumerate() {
        if let Some(d) = *d {
            prop_assert!(d < n);
            if d > 0 {
                match distances[(i + n - 1) % n] {
                    Some(prev) => {
                        prop_assert!(prev + 1 >= d, "gap before bucket {}", i);
                    }
                    None => {
                        prop_assert!(false, "displaced entry after vacancy at {}", i);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Chains only ever hang behind an engaged inline slot.
fn chain_entries(buckets: &ChainedBuckets<u64, i32>) -> Result<(), TestCaseError> {
    let mut chained = 0;
    for (i, (engaged, chain)) in buckets.occupancy().enumerate() {
        prop_assert!(engaged || chain == 0, "chain behind vacant bucket {}", i);
        chained += chain;
    }
    prop_assert_eq!(chained, buckets.overflow_len());
    Ok(())
}

fn config(capacity: usize) -> TableConfig {
    TableConfig::default().with_initial_capacity(capacity)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_robin_hood_matches_model(capacity in 1usize..=16, ops in arb_ops(48)) {
        let sut: Table<_, RobinHoodBuckets<u64, i32>> =
            RawTable::with_config_and_hasher(config(capacity), IdentityBuildHasher);
        run(sut, ops, robin_hood_runs)?;
    }

    #[test]
    fn prop_chained_matches_model(capacity in 1usize..=16, ops in arb_ops(48)) {
        let sut: Table<_, ChainedBuckets<u64, i32>> =
            RawTable::with_config_and_hasher(config(capacity), IdentityBuildHasher);
        run(sut, ops, chain_entries)?;
    }

    #[test]
    fn prop_robin_hood_total_collision(capacity in 1usize..=8, ops in arb_ops(16)) {
        let sut: Table<_, RobinHoodBuckets<u64, i32>> =
            RawTable::with_config_and_hasher(config(capacity), ConstBuildHasher);
        run(sut, ops, robin_hood_runs)?;
    }

    #[test]
    fn prop_chained_total_collision(capacity in 1usize..=8, ops in arb_ops(16)) {
        let sut: Table<_, ChainedBuckets<u64, i32>> =
            RawTable::with_config_and_hasher(config(capacity), ConstBuildHasher);
        run(sut, ops, chain_entries)?;
    }

    #[test]
    fn prop_default_hasher_robin_hood(ops in arb_ops(64)) {
        let sut: Table<_, RobinHoodBuckets<u64, i32>> = RawTable::new();
        run(sut, ops, robin_hood_runs)?;
    }
}
