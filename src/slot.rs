//! Slot states and the key arena that occupied slots point into.

use crate::key::Key;
use core::ptr::NonNull;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational handle of an installed key.
    pub(crate) struct KeyId;
}

/// Storage for every key currently installed in a slot.
pub(crate) type KeyArena = SlotMap<KeyId, Key>;

/// One position of the open-addressed array.
#[derive(Debug)]
pub(crate) enum Slot<T> {
    /// Never used since the array was last built or cleared; ends a probe.
    Empty,
    /// Vacated by `unset`. Probes continue past it; inserts may reuse it.
    Tombstone,
    Occupied { key: KeyId, value: NonNull<T> },
}

/// Allocate `capacity` empty slots, reporting allocation failure.
pub(crate) fn empty_slots<T>(capacity: usize) -> Result<Vec<Slot<T>>, crate::TableError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| crate::TableError::AllocationFailed { capacity })?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}
