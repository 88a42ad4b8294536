//! hashkit: hash tables with two interchangeable collision strategies
//! behind one handle-based table contract.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one table core, parameterised by how collisions are resolved, so
//!   the two layouts can be compared on equal footing.
//! - Layers:
//!   - Storage (`storage`, `chain`): fallible bucket allocation, explicit
//!     engaged/vacant slots, and collision chains kept in a generational
//!     arena.
//!   - Strategies: `ChainedBuckets` (inline first entry per bucket, overflow
//!     chain behind it) and `RobinHoodBuckets` (open addressing, Robin Hood
//!     displacement, backward-shift deletion). Both implement the sealed
//!     `Strategy` trait.
//!   - `RawTable<K, V, S, P>`: hashing, size accounting, load factor, growth
//!     and handle validation. `P` is the strategy.
//!   - `Map` / `Set`: std-style wrappers over `RawTable`.
//!
//! Constraints
//! - Single-threaded: tables are `!Send`/`!Sync`.
//! - Safe Rust only. Vacancy is a sum-type variant, never uninitialised
//!   memory.
//! - The load factor never exceeds `max_load_factor` once an insert returns.
//!   Growth multiplies `capacity + 1` by the growth factor (1.618 by default),
//!   so capacities are not powers of two and the ideal bucket is
//!   `hash mod capacity`.
//!
//! Handles
//! - A `Handle` is `(table id, generation, position)`. It is a cursor
//!   (`begin`/`next`/`end`) and an O(1) erase target (`erase_at`).
//! - The table bumps its generation whenever entries may move: growth,
//!   reserve, clear, every erase, and Robin Hood inserts that displaced a
//!   resident. Old handles then fail with `TableError::StaleHandle` rather
//!   than aliasing whatever moved into their bucket. Handles from another
//!   table fail with `TableError::ForeignHandle`.
//! - Growth keeps the inserted entry addressable: it is withdrawn from the
//!   old array, every other entry is rehashed, and it is placed last. The
//!   handle returned by `insert` therefore names its final position.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash. Rehashing and backward shifts use the
//!   stored hash; `K: Hash` runs once per insert and once per lookup.
//! - Lookups compare the stored hash before calling `K: Eq`.
//!
//! Reentrancy policy
//! - Every operation that may run `K: Hash`/`K: Eq` opens a debug-only guard.
//!   A `Hash`/`Eq` impl that calls back into the same table panics in debug
//!   builds, naming both operations. Removed entries are handed back to the
//!   caller, so their `Drop` runs after the guard is released.
//!
//! Failure model
//! - Missing keys are not errors. Bad handles and allocation failure are
//!   reported through `TableError`; every fallible operation has a `try_`
//!   form, and the plain form panics with the error's message.
//! - A growth that cannot allocate leaves the table as it was before the
//!   insert.
//! - A Robin Hood probe that visits every bucket without finding a vacancy
//!   is an internal invariant violation and panics.

mod chain;
mod chained;
pub mod config;
mod error;
mod handle;
pub mod hashers;
pub mod map;
pub mod raw_table;
mod raw_table_proptest;
mod reentrancy;
mod robin_hood;
pub mod set;
mod storage;
mod strategy;

// Public surface
pub use chained::ChainedBuckets;
pub use config::TableConfig;
pub use error::{Result, TableError};
pub use handle::Handle;
pub use hashers::{FnvBuildHasher, IdentityBuildHasher};
pub use map::{ChainedMap, Map, RobinHoodMap};
pub use raw_table::RawTable;
pub use robin_hood::RobinHoodBuckets;
pub use set::{ChainedSet, RobinHoodSet, Set};
pub use strategy::{Placement, Position, Strategy};
