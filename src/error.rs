//! Error type shared by every table operation.
//!
//! Absent keys are not errors: lookups report them through the end handle,
//! `None` or `false`. `TableError` covers handle misuse, allocation failure
//! and rejected configuration.
//!
//! Operations that may allocate come in two versions: `try_xxx` returns a
//! `Result`, and `xxx` calls it and panics with the error's message.

/// Failure of a table operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The end handle was dereferenced, erased or advanced.
    #[error("end handle does not refer to an entry")]
    EndOfTable,

    /// The handle was issued before a mutation that may have moved entries.
    #[error(
        "stale handle: issued at generation {handle_generation}, table is at generation {table_generation}"
    )]
    StaleHandle {
        handle_generation: u64,
        table_generation: u64,
    },

    /// The handle was issued by a different table.
    #[error("handle was issued by a different table")]
    ForeignHandle,

    /// The byte size of the requested bucket array does not fit in `usize`.
    #[error("capacity overflow: {buckets} buckets")]
    CapacityOverflow { buckets: usize },

    /// The allocator could not provide the bucket array.
    #[error("out of memory allocating {buckets} buckets ({bytes} bytes)")]
    OutOfMemory { buckets: usize, bytes: usize },

    /// The table configuration was rejected.
    #[error("invalid table configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Result type of fallible table operations.
pub type Result<T> = core::result::Result<T, TableError>;

/// Convenience wrappers use this to turn a `try_xxx` failure into a panic.
#[cold]
#[track_caller]
pub(crate) fn panic_from_error(error: TableError) -> ! {
    panic!("{}", error)
}
