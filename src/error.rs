//! Error kinds for contract violations at the table boundary.
//!
//! Not-found is never an error: lookups report it as `Ok(None)` or
//! `Ok(false)`.

/// Reasons a table operation can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("table key length {len} exceeds the maximum of {max} bytes")]
    KeyTooLong { len: usize, max: usize },

    #[error("table key length {len} exceeds the {available} bytes provided")]
    KeyLengthOutOfBounds { len: usize, available: usize },

    #[error("table capacity {requested} exceeds the maximum of {max} slots")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("allocation of {capacity} elements failed")]
    AllocationFailed { capacity: usize },

    #[error("invalid table configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}

impl TableError {
    /// True for errors caused by the key argument rather than table state.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::KeyTooLong { .. } | Self::KeyLengthOutOfBounds { .. }
        )
    }
}
