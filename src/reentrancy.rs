//! Debug-only guard against calls back into a table from `Hash`/`Eq`.
//!
//! Tables run user code (key hashing and comparison) in the middle of probes
//! and displacement chains, when buckets may be transiently out of order.
//! In debug builds a nested entry panics and names both operations. In
//! release builds the guard is a zero-sized no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Public entry points open a section with
/// `let _g = self.reentrancy.enter("insert");`.
#[derive(Debug)]
pub(crate) struct OperationGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Tables are single-threaded: keep them !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl OperationGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Opens a section for `operation`. Panics in debug builds if another
    /// section of the same table is still open.
    #[inline]
    pub(crate) fn enter(&self, operation: &'static str) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call to `{operation}` while `{outer}` is in progress");
            }
            self.active.set(Some(operation));
            return Section { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = operation;
            return Section { _z: PhantomData };
        }
    }
}

impl Default for OperationGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Open section; closes on drop.
pub(crate) struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OperationGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OperationGuard;

    #[test]
    fn sequential_sections_are_ok() {
        let g = OperationGuard::new();
        drop(g.enter("find"));
        drop(g.enter("insert"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_section_panics_with_both_names() {
        let g = OperationGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter("insert");
            let _inner = g.enter("find");
        }));
        let payload = res.expect_err("nested entry must panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert_eq!(msg, "reentrant call to `find` while `insert` is in progress");
    }
}
