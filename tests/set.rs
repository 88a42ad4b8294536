use hashkit::{ChainedSet, IdentityBuildHasher, RobinHoodSet, Set, TableConfig, TableError};

#[test]
fn insert_contains_remove() {
    let mut s: ChainedSet<u64, IdentityBuildHasher> = Set::with_hasher(IdentityBuildHasher);
    for k in (0..100).map(|k| k * 16) {
        assert!(s.insert(k));
    }
    assert!(!s.insert(32));
    assert_eq!(s.len(), 100);
    assert!(s.contains(&1584));
    assert!(!s.contains(&1585));
    assert!(s.remove(&1584));
    assert!(!s.contains(&1584));
    assert_eq!(s.iter().count(), 99);
}

#[test]
fn collected_sets_compare_across_strategies() {
    let a: RobinHoodSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    let mut b: ChainedSet<String> = Set::new();
    b.extend(["z", "y", "x"].iter().map(|s| s.to_string()));
    assert!(a == b);
    assert!(a.is_subset(&b) && b.is_subset(&a));
    b.take("x");
    assert!(a != b);
    assert!(b.is_subset(&a));
}

#[test]
fn clone_is_independent() {
    let mut a: RobinHoodSet<u8> = (0..10).collect();
    let b = a.clone();
    a.clear();
    assert!(a.is_empty());
    assert_eq!(b.len(), 10);
    assert!(a.is_disjoint(&b));
    let mut keys: Vec<u8> = (&b).into_iter().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, (0..10).collect::<Vec<_>>());
}

#[test]
fn tiny_tables_stay_under_the_load_factor() {
    let mut s: RobinHoodSet<u64, IdentityBuildHasher> = Set::with_config_and_hasher(
        TableConfig::default().with_initial_capacity(1),
        IdentityBuildHasher,
    );
    for k in 0..50 {
        s.insert(k);
        assert!(s.load_factor() <= 0.75, "after {k}: {}", s.load_factor());
    }
    assert_eq!(s.len(), 50);
}

#[test]
fn handles_reach_erase_at() {
    let mut s: ChainedSet<u64, IdentityBuildHasher> = Set::with_hasher(IdentityBuildHasher);
    let one = s.insert_handle(1);
    let two = s.insert_handle(2);
    assert_eq!(s.insert_handle(1), one);

    assert_eq!(s.as_table_mut().erase_at(one), Ok((1, ())));
    assert!(!s.contains(&1));
    assert!(matches!(
        s.as_table_mut().erase_at(one),
        Err(TableError::StaleHandle { .. })
    ));
    // Every erase retires outstanding handles.
    assert!(matches!(
        s.as_table().entry_at(two),
        Err(TableError::StaleHandle { .. })
    ));

    assert_eq!(s.try_reserve(64), Ok(()));
    assert!(s.capacity() >= 64);
    let table = s.into_table();
    assert_eq!(table.len(), 1);
    assert!(table.contains(&2));
}

#[test]
fn invalid_config_is_reported() {
    let err = RobinHoodSet::<u64, IdentityBuildHasher>::try_with_config_and_hasher(
        TableConfig::default().with_initial_capacity(0),
        IdentityBuildHasher,
    )
    .err();
    assert!(matches!(err, Some(TableError::InvalidConfig { .. })));
}
