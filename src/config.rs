//! Sizing and limits for a `Table`.

use crate::error::TableError;

/// Slot count of the first allocation.
pub const DEFAULT_INITIAL_CAPACITY: usize = 128;
/// Multiplier applied to the capacity on each growth step.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;
/// Live-plus-tombstone load above which the slot array is rebuilt.
pub const DEFAULT_MAX_FILL_RATIO: f64 = 0.75;
/// Largest slot array a table will allocate.
pub const DEFAULT_MAX_CAPACITY: usize = 1 << 30;
/// Largest key, in bytes.
pub const DEFAULT_MAX_KEY_LEN: usize = 1 << 20;
/// Retired keys held before a batch release.
pub const DEFAULT_GARBAGE_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub growth_factor: usize,
    pub max_fill_ratio: f64,
    pub max_capacity: usize,
    pub max_key_len: usize,
    pub garbage_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_fill_ratio: DEFAULT_MAX_FILL_RATIO,
            max_capacity: DEFAULT_MAX_CAPACITY,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            garbage_capacity: DEFAULT_GARBAGE_CAPACITY,
        }
    }
}

impl TableConfig {
    /// Check that the limits describe a table whose probes always terminate.
    pub fn validate(&self) -> Result<(), TableError> {
        let reason = if self.initial_capacity == 0 {
            "initial_capacity must be at least 1"
        } else if self.growth_factor < 2 {
            "growth_factor must be at least 2"
        } else if !(self.max_fill_ratio > 0.0 && self.max_fill_ratio < 1.0) {
            "max_fill_ratio must lie strictly between 0 and 1"
        } else if self.max_capacity < self.initial_capacity {
            "max_capacity must not be below initial_capacity"
        } else if self.garbage_capacity == 0 {
            "garbage_capacity must be at least 1"
        } else {
            return Ok(());
        };
        Err(TableError::InvalidConfig { reason })
    }

    /// True when `n` occupied slots would overload `capacity` slots.
    pub(crate) fn exceeds_fill_ratio(&self, n: usize, capacity: usize) -> bool {
        n as f64 > capacity as f64 * self.max_fill_ratio
    }

    /// Capacity after one growth step from `capacity`.
    pub(crate) fn next_capacity(&self, capacity: usize) -> Result<usize, TableError> {
        let next = if capacity == 0 {
            self.initial_capacity
        } else {
            capacity.saturating_mul(self.growth_factor)
        };
        if next > self.max_capacity {
            return Err(TableError::CapacityExceeded {
                requested: next,
                max: self.max_capacity,
            });
        }
        Ok(next)
    }
}
