//! RawTable: the table core shared by both collision strategies.
//!
//! The core hashes keys, counts entries, enforces the load factor, grows the
//! bucket array and validates handles. Everything layout-specific is
//! delegated to the `Strategy` parameter.
//!
//! Generations: the table bumps its generation on every mutation that may
//! move an existing entry (growth, reserve, clear, any erase, and any insert
//! that displaced a resident). Handles issued at an older generation no
//! longer resolve. The handle a mutating call returns is always current.

use crate::config::TableConfig;
use crate::error::{panic_from_error, Result, TableError};
use crate::handle::{Handle, TableId};
use crate::reentrancy::OperationGuard;
use crate::robin_hood::RobinHoodBuckets;
use crate::strategy::{Placement, Position, Strategy};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;

pub struct RawTable<K, V, S = DefaultHashBuilder, P = RobinHoodBuckets<K, V>> {
    hasher: S,
    guard: OperationGuard,
    state: TableState<K, V, P>,
}

/// Everything a guarded section mutates, kept apart from the guard so a
/// section can borrow both at once.
struct TableState<K, V, P> {
    store: P,
    len: usize,
    config: TableConfig,
    id: TableId,
    generation: u64,
    _entries: PhantomData<(K, V)>,
}

impl<K, V, P> RawTable<K, V, DefaultHashBuilder, P>
where
    K: Eq + Hash,
    P: Strategy<K, V>,
{
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Table starting with `capacity` buckets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(TableConfig::default().with_initial_capacity(capacity))
    }

    pub fn try_with_config(config: TableConfig) -> Result<Self> {
        Self::try_with_config_and_hasher(config, DefaultHashBuilder::default())
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, P> Default for RawTable<K, V, DefaultHashBuilder, P>
where
    K: Eq + Hash,
    P: Strategy<K, V>,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the entries of a `RawTable`, in strategy order.
pub struct Iter<'a, K, V, S, P> {
    table: &'a RawTable<K, V, S, P>,
    cursor: Option<Position>,
    remaining: usize,
}

impl<'a, K, V, S, P> Iterator for Iter<'a, K, V, S, P>
where
    P: Strategy<K, V>,
{
    type Item = (Handle, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.cursor?;
        let table: &'a RawTable<K, V, S, P> = self.table;
        let state = &table.state;
        self.cursor = state.store.next(position);
        let (k, v) = state.store.entry(position)?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((state.handle_from(Some(position)), k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S, P> ExactSizeIterator for Iter<'_, K, V, S, P> where P: Strategy<K, V> {}

/// Iterator over the entries of a `RawTable` with mutable values.
pub struct IterMut<'a, K, V, P>
where
    P: Strategy<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    it: P::IterMut<'a>,
    table: TableId,
    generation: u64,
}

impl<'a, K, V, P> Iterator for IterMut<'a, K, V, P>
where
    P: Strategy<K, V> + 'a,
    K: 'a,
    V: 'a,
{
    type Item = (Handle, &'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let (position, k, v) = self.it.next()?;
        let handle = Handle {
            table: self.table,
            generation: self.generation,
            position: Some(position),
        };
        Some((handle, k, v))
    }
}

impl<K, V, P> TableState<K, V, P>
where
    P: Strategy<K, V>,
{
    fn handle_from(&self, position: Option<Position>) -> Handle {
        Handle {
            table: self.id,
            generation: self.generation,
            position,
        }
    }

    /// Checks that `handle` was issued by this table at its current
    /// generation and is not the end sentinel.
    fn resolve(&self, handle: Handle) -> Result<Position> {
        if handle.table != self.id {
            return Err(TableError::ForeignHandle);
        }
        let position = handle.position.ok_or(TableError::EndOfTable)?;
        if handle.generation != self.generation {
            return Err(self.stale(handle));
        }
        Ok(position)
    }

    fn stale(&self, handle: Handle) -> TableError {
        TableError::StaleHandle {
            handle_generation: handle.generation,
            table_generation: self.generation,
        }
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn take_at(&mut self, position: Position) -> Option<(K, V)> {
        let (_, key, value) = self.store.remove(position)?;
        self.len -= 1;
        self.bump_generation();
        Some((key, value))
    }

    /// Moves every entry of `old` into the current store using the stored
    /// hashes. The `tracked` entry is withdrawn first and placed last, so
    /// nothing displaces it afterwards; its final position is returned.
    fn rehash_from(&mut self, mut old: P, tracked: Option<Position>) -> Option<Position> {
        let carried = tracked.and_then(|p| old.remove(p));
        let store = &mut self.store;
        old.into_entries(|hash, key, value| {
            store.insert_unique(hash, key, value);
        });
        let relocated =
            carried.map(|(hash, key, value)| self.store.insert_unique(hash, key, value));
        self.bump_generation();
        relocated
    }

    /// Grows to `capacity` buckets while keeping track of the entry at
    /// `tracked`. If the new array cannot be allocated, the tracked entry is
    /// withdrawn and handed back with the error, leaving the table as it was
    /// before the insert.
    fn grow_tracking(
        &mut self,
        capacity: usize,
        tracked: Position,
    ) -> core::result::Result<Position, (TableError, Option<(K, V)>)> {
        let fresh = match P::allocate(capacity) {
            Ok(fresh) => fresh,
            Err(e) => {
                log::debug!("growth to {capacity} buckets failed: {e}");
                return Err((e, self.take_at(tracked)));
            }
        };
        log::debug!(
            "growing table: {} -> {} buckets ({} entries)",
            self.store.capacity(),
            capacity,
            self.len
        );
        let old = mem::replace(&mut self.store, fresh);
        self.rehash_from(old, Some(tracked))
            .ok_or((TableError::EndOfTable, None))
    }

    /// Swaps in `capacity` fresh buckets, handing back the old ones.
    fn reset(&mut self, capacity: usize) -> Result<P> {
        let fresh = P::allocate(capacity.max(1))?;
        log::debug!(
            "clearing table: {} entries, {} -> {} buckets",
            self.len,
            self.store.capacity(),
            fresh.capacity()
        );
        self.len = 0;
        self.bump_generation();
        Ok(mem::replace(&mut self.store, fresh))
    }
}

// Operations that never hash or compare keys.
impl<K, V, S, P> RawTable<K, V, S, P>
where
    P: Strategy<K, V>,
{
    pub fn len(&self) -> usize {
        self.state.len
    }

    pub fn is_empty(&self) -> bool {
        self.state.len == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.state.store.capacity()
    }

    /// `len / capacity`, computed on demand.
    pub fn load_factor(&self) -> f64 {
        self.state.len as f64 / self.state.store.capacity() as f64
    }

    pub fn max_load_factor(&self) -> f64 {
        self.state.config.max_load_factor
    }

    pub fn config(&self) -> &TableConfig {
        &self.state.config
    }

    /// Current generation; see the module documentation.
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// The bucket store, for inspecting layout.
    pub fn buckets(&self) -> &P {
        &self.state.store
    }

    /// Handle to the first entry in iteration order, or `end()` when empty.
    pub fn begin(&self) -> Handle {
        self.state.handle_from(self.state.store.first())
    }

    /// The end sentinel.
    pub fn end(&self) -> Handle {
        self.state.handle_from(None)
    }

    /// Advances `handle` to the next entry, or to `end()` after the last.
    pub fn next(&self, handle: Handle) -> Result<Handle> {
        let position = self.state.resolve(handle)?;
        Ok(self.state.handle_from(self.state.store.next(position)))
    }

    pub fn entry_at(&self, handle: Handle) -> Result<(&K, &V)> {
        let position = self.state.resolve(handle)?;
        self.state
            .store
            .entry(position)
            .ok_or_else(|| self.state.stale(handle))
    }

    pub fn entry_at_mut(&mut self, handle: Handle) -> Result<(&K, &mut V)> {
        let position = self.state.resolve(handle)?;
        let stale = self.state.stale(handle);
        self.state.store.entry_mut(position).ok_or(stale)
    }

    /// How far the entry sits from the position its hash designates: the
    /// bucket distance under Robin Hood, the chain depth under chaining.
    pub fn probe_distance(&self, handle: Handle) -> Result<usize> {
        let position = self.state.resolve(handle)?;
        self.state
            .store
            .probe_distance(position)
            .ok_or_else(|| self.state.stale(handle))
    }

    /// Removes the entry `handle` locates.
    pub fn erase_at(&mut self, handle: Handle) -> Result<(K, V)> {
        let _g = self.guard.enter("erase_at");
        let position = self.state.resolve(handle)?;
        let stale = self.state.stale(handle);
        self.state.take_at(position).ok_or(stale)
    }

    pub fn iter(&self) -> Iter<'_, K, V, S, P> {
        Iter {
            table: self,
            cursor: self.state.store.first(),
            remaining: self.state.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, P> {
        IterMut {
            table: self.state.id,
            generation: self.state.generation,
            it: self.state.store.iter_mut(),
        }
    }

    /// Drops every entry and starts over with `capacity` buckets.
    pub fn try_clear_to(&mut self, capacity: usize) -> Result<()> {
        let previous = {
            let _g = self.guard.enter("clear");
            self.state.reset(capacity)?
        };
        // Entries drop after the section closes.
        drop(previous);
        Ok(())
    }

    pub fn clear_to(&mut self, capacity: usize) {
        if let Err(e) = self.try_clear_to(capacity) {
            panic_from_error(e)
        }
    }

    /// Drops every entry and returns to the configured initial capacity.
    pub fn clear(&mut self) {
        self.clear_to(self.state.config.initial_capacity)
    }

    /// Rehashes right away to at least `capacity` buckets.
    ///
    /// Afterwards, inserting fewer than `capacity * max_load_factor` entries
    /// triggers no growth. Does nothing if the table is already that large.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        let _g = self.guard.enter("reserve");
        let state = &mut self.state;
        if capacity <= state.store.capacity() {
            return Ok(());
        }
        log::debug!(
            "reserving: {} -> {} buckets ({} entries)",
            state.store.capacity(),
            capacity,
            state.len
        );
        let fresh = P::allocate(capacity)?;
        let old = mem::replace(&mut state.store, fresh);
        state.rehash_from(old, None);
        Ok(())
    }

    pub fn reserve(&mut self, capacity: usize) {
        if let Err(e) = self.try_reserve(capacity) {
            panic_from_error(e)
        }
    }
}

// Operations that hash keys or compare them.
impl<K, V, S, P> RawTable<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: Strategy<K, V>,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TableConfig::default(), hasher)
    }

    pub fn try_with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hasher,
            guard: OperationGuard::new(),
            state: TableState {
                store: P::allocate(config.initial_capacity)?,
                len: 0,
                config,
                id: TableId::fresh(),
                generation: 0,
                _entries: PhantomData,
            },
        })
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        match Self::try_with_config_and_hasher(config, hasher) {
            Ok(table) => table,
            Err(e) => panic_from_error(e),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Inserts or updates `key`. Returns a handle to the entry, valid even if
    /// the insert grew the table, and the value it replaced, if any.
    pub fn try_insert_full(&mut self, key: K, value: V) -> Result<(Handle, Option<V>)> {
        let withdrawn;
        let result = {
            let _g = self.guard.enter("insert");
            let hash = self.make_hash(&key);
            let state = &mut self.state;
            match state.store.insert(hash, key, value) {
                Placement::Replaced { position, previous } => {
                    return Ok((state.handle_from(Some(position)), Some(previous)));
                }
                Placement::Inserted {
                    position,
                    displaced,
                } => {
                    state.len += 1;
                    if displaced {
                        state.bump_generation();
                    }
                    let capacity = state.store.capacity();
                    if !state.config.exceeds(state.len, capacity) {
                        return Ok((state.handle_from(Some(position)), None));
                    }
                    let target = state.config.grown_capacity(capacity, state.len);
                    match state.grow_tracking(target, position) {
                        Ok(position) => {
                            return Ok((state.handle_from(Some(position)), None));
                        }
                        Err((e, entry)) => {
                            withdrawn = entry;
                            Err(e)
                        }
                    }
                }
            }
        };
        // The withdrawn entry drops after the section closes.
        drop(withdrawn);
        result
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<Handle> {
        self.try_insert_full(key, value).map(|(h, _)| h)
    }

    /// Like `try_insert`, panicking if growth cannot allocate.
    pub fn insert(&mut self, key: K, value: V) -> Handle {
        match self.try_insert(key, value) {
            Ok(handle) => handle,
            Err(e) => panic_from_error(e),
        }
    }

    /// Handle to the entry for `q`, or `end()` if there is none.
    pub fn find<Q>(&self, q: &Q) -> Handle
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.state.handle_from(self.locate(q))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let position = self.locate(q)?;
        self.state.store.entry(position)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let position = self.locate(q)?;
        self.state.store.entry_mut(position).map(|(_, v)| v)
    }

    /// Removes the entry for `q` and hands it back.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("remove");
        let hash = self.make_hash(q);
        let position = self.state.store.find(hash, q)?;
        self.state.take_at(position)
    }

    /// Removes the entry for `q`; returns whether there was one.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(q).is_some()
    }

    fn locate<Q>(&self, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("find");
        let hash = self.make_hash(q);
        self.state.store.find(hash, q)
    }
}

impl<K, V, S, P> Clone for RawTable<K, V, S, P>
where
    S: Clone,
    P: Strategy<K, V> + Clone,
{
    /// The clone is a distinct table: handles of `self` are foreign to it.
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            guard: OperationGuard::new(),
            state: TableState {
                store: self.state.store.clone(),
                len: self.state.len,
                config: self.state.config,
                id: TableId::fresh(),
                generation: 0,
                _entries: PhantomData,
            },
        }
    }
}

impl<K, V, S, P> fmt::Debug for RawTable<K, V, S, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: Strategy<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(_, k, v)| (k, v)))
            .finish()
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a RawTable<K, V, S, P>
where
    P: Strategy<K, V>,
{
    type Item = (Handle, &'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
