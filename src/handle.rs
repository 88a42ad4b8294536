//! Handles: checked, non-owning locators into a table.

use crate::error::Result;
use crate::raw_table::RawTable;
use crate::strategy::{Position, Strategy};
use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU64, Ordering};

/// Identity of one table instance; never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TableId(u64);

impl TableId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TableId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Locates one entry of a [`RawTable`], or the end of its iteration order.
///
/// A handle is a cursor (advance it with [`RawTable::next`]) and an O(1)
/// erase target ([`RawTable::erase_at`]). It records the table's generation
/// when issued; once the table performs a mutation that may move entries,
/// the handle stops resolving and reports [`TableError::StaleHandle`]
/// instead of pointing at whatever now occupies its bucket.
///
/// Handles compare equal when they name the same position of the same
/// table. Two end handles of one table are always equal.
///
/// [`TableError::StaleHandle`]: crate::TableError::StaleHandle
#[derive(Clone, Copy, Debug)]
pub struct Handle {
    pub(crate) table: TableId,
    pub(crate) generation: u64,
    pub(crate) position: Option<Position>,
}

impl Handle {
    /// True for the end sentinel.
    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }

    /// The located position, `None` for the end sentinel.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Bucket index of the located entry.
    pub fn bucket(&self) -> Option<usize> {
        self.position.map(|p| p.bucket())
    }

    /// Table generation at which the handle was issued.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key<'a, K, V, S, P>(&self, table: &'a RawTable<K, V, S, P>) -> Result<&'a K>
    where
        P: Strategy<K, V>,
    {
        table.entry_at(*self).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S, P>(&self, table: &'a RawTable<K, V, S, P>) -> Result<&'a V>
    where
        P: Strategy<K, V>,
    {
        table.entry_at(*self).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, S, P>(
        &self,
        table: &'a mut RawTable<K, V, S, P>,
    ) -> Result<&'a mut V>
    where
        P: Strategy<K, V>,
    {
        table.entry_at_mut(*self).map(|(_, v)| v)
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.position == other.position
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.position.hash(state);
    }
}
