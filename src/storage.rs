//! Raw storage for bucket arrays.
//!
//! Bucket arrays are allocated fallibly so that a failed growth leaves the
//! table untouched. Slots are explicit engaged/disengaged sum types: a vacant
//! bucket never holds a default-constructed key or value.

use crate::error::{Result, TableError};
use core::mem;

/// Allocates `count` buckets, building each with `fill`.
///
/// Fails with `CapacityOverflow` when the array's byte size does not fit in
/// `usize` and with `OutOfMemory` when the allocator refuses the request.
pub(crate) fn allocate_buckets<B>(count: usize, mut fill: impl FnMut() -> B) -> Result<Vec<B>> {
    let bytes = count
        .checked_mul(mem::size_of::<B>())
        .filter(|&b| b <= isize::MAX as usize)
        .ok_or(TableError::CapacityOverflow { buckets: count })?;
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(count)
        .map_err(|_| TableError::OutOfMemory {
            buckets: count,
            bytes,
        })?;
    buckets.extend(core::iter::repeat_with(&mut fill).take(count));
    Ok(buckets)
}

/// In-place value slot with an explicit engaged flag.
#[derive(Clone, Debug)]
pub(crate) struct Slot<T> {
    value: Option<T>,
}

impl<T> Slot<T> {
    pub(crate) const fn vacant() -> Self {
        Self { value: None }
    }

    #[inline]
    pub(crate) fn is_engaged(&self) -> bool {
        self.value.is_some()
    }

    /// Constructs a value in a disengaged slot.
    #[inline]
    pub(crate) fn engage(&mut self, value: T) -> &mut T {
        debug_assert!(!self.is_engaged(), "engaging an engaged slot");
        self.value.insert(value)
    }

    /// Moves the value out, leaving the slot disengaged.
    #[inline]
    pub(crate) fn disengage(&mut self) -> Option<T> {
        self.value.take()
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::vacant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_requested_count() {
        let buckets = allocate_buckets(7, Slot::<String>::vacant).unwrap();
        assert_eq!(buckets.len(), 7);
        assert!(buckets.iter().all(|s| !s.is_engaged()));
    }

    #[test]
    fn byte_overflow_is_reported() {
        let err = allocate_buckets(usize::MAX, || 0u64).unwrap_err();
        assert_eq!(err, TableError::CapacityOverflow { buckets: usize::MAX });
    }

    #[test]
    fn refused_allocation_is_out_of_memory() {
        // Fits in isize but no allocator will hand out half the address space.
        let count = (isize::MAX as usize) / 16;
        match allocate_buckets(count, || [0u8; 8]) {
            Err(TableError::OutOfMemory { buckets, .. }) => assert_eq!(buckets, count),
            other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn slot_engage_and_disengage() {
        let mut s = Slot::vacant();
        assert!(s.get().is_none());
        *s.engage(1) += 1;
        assert_eq!(s.get(), Some(&2));
        assert_eq!(s.disengage(), Some(2));
        assert!(!s.is_engaged());
        assert_eq!(s.disengage(), None);
    }
}
