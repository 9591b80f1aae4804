use thiserror::Error;

/// Errors returned by the fallible [`PackedMemoryArray`](crate::PackedMemoryArray)
/// operations.
///
/// The panicking counterparts (`element_at`, `delete_at`) treat these as
/// contract violations and panic with the same message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PmaError {
    #[error("slot {index} is out of bounds for capacity {capacity}")]
    OutOfBounds { index: usize, capacity: usize },

    #[error("slot {index} holds no element")]
    EmptySlot { index: usize },

    #[error("bulk load requires at least one element")]
    EmptyInput,

    #[error("bulk load input is not sorted at position {index}")]
    Unsorted { index: usize },
}

pub type Result<T> = std::result::Result<T, PmaError>;
