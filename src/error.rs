//! Error type shared by the map, the pool and the scope.

use std::collections::TryReserveError;
use thiserror::Error;

/// Recoverable failures reported by map operations.
///
/// A lookup miss is not an error: lookups return `Option`. Misuse of a
/// precondition (erasing a key that is not present, for instance) is a
/// programming defect and panics instead of producing one of these.
#[derive(Debug, Clone, Copy, Error, Eq, PartialEq)]
pub enum MapError {
    /// The pool refused an allocation, or the global allocator could not
    /// reserve the bucket table.
    #[error("out of memory: {requested} bytes requested")]
    OutOfMemory { requested: usize },

    /// The table is at its configured maximum capacity and at its load limit.
    #[error("hash map is full at capacity {capacity}")]
    Full { capacity: usize },

    /// A `MapConfig` field is outside its valid range.
    #[error("invalid map configuration: {0}")]
    InvalidConfig(&'static str),
}

impl From<TryReserveError> for MapError {
    fn from(_: TryReserveError) -> Self {
        // The reserve error does not expose the requested layout.
        MapError::OutOfMemory { requested: usize::MAX }
    }
}
