use hashkit::{ChainedMap, FnvBuildHasher, Map, RobinHoodMap, TableConfig};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn string_keys_with_borrowed_lookup() {
    let mut m: ChainedMap<String, usize> = Map::new();
    for word in "the quick brown fox jumps over the lazy dog".split(' ') {
        let n = m.get(word).copied().unwrap_or(0);
        m.insert(word.to_string(), n + 1);
    }
    assert_eq!(m.len(), 8);
    assert_eq!(m.get("the"), Some(&2));
    assert_eq!(m.get("cat"), None);
    assert!(m.contains_key("fox"));
    assert_eq!(m.remove_entry("fox"), Some(("fox".to_string(), 1)));
}

#[test]
fn growth_keeps_every_mapping() {
    let mut m: RobinHoodMap<u32, u32> = Map::with_capacity(1);
    for k in 0..10_000 {
        assert_eq!(m.insert(k, k * 2), None);
        assert!(m.load_factor() <= 0.75);
    }
    assert_eq!(m.len(), 10_000);
    for k in 0..10_000 {
        assert_eq!(m[&k], k * 2);
    }
    for k in (0..10_000).step_by(2) {
        assert_eq!(m.remove(&k), Some(k * 2));
    }
    assert_eq!(m.len(), 5_000);
    for k in 0..10_000 {
        assert_eq!(m.contains_key(&k), k % 2 == 1);
    }
}

#[test]
fn custom_hasher_and_config() {
    let config = TableConfig::default()
        .with_initial_capacity(5)
        .with_max_load_factor(0.5)
        .with_growth_factor(2.0);
    let mut m: ChainedMap<&str, i32, FnvBuildHasher> =
        Map::with_config_and_hasher(config, FnvBuildHasher::default());
    m.insert("a", 1);
    m.insert("b", 2);
    assert_eq!(m.capacity(), 5);
    m.insert("c", 3);
    assert_eq!(m.capacity(), 12);
    assert!(m.load_factor() <= 0.5);
}

#[test]
fn clear_drops_values_and_resets_capacity() {
    struct Noisy(Rc<Cell<usize>>);
    impl Drop for Noisy {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    let drops = Rc::new(Cell::new(0));
    let mut m: RobinHoodMap<u32, Noisy> = Map::new();
    for k in 0..40 {
        m.insert(k, Noisy(drops.clone()));
    }
    let grown = m.capacity();
    assert!(grown > 16);
    m.clear();
    assert_eq!(drops.get(), 40);
    assert!(m.is_empty());
    assert_eq!(m.capacity(), 16);

    m.insert(1, Noisy(drops.clone()));
    // Overwriting drops the replaced value once the caller lets it go.
    drop(m.insert(1, Noisy(drops.clone())));
    assert_eq!(drops.get(), 41);
    drop(m);
    assert_eq!(drops.get(), 42);
}

#[test]
fn handle_access_through_the_table() {
    let mut m: ChainedMap<u64, &str> = Map::new();
    let h = m.insert_handle(5, "five");
    assert_eq!(h.value(m.as_table()), Ok(&"five"));
    *h.value_mut(m.as_table_mut()).unwrap() = "FIVE";
    assert_eq!(m.get(&5), Some(&"FIVE"));
    let mut table = m.into_table();
    assert_eq!(table.erase_at(h), Ok((5, "FIVE")));
    assert!(table.is_empty());
}
