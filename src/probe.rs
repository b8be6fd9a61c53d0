//! Linear probing over a slot array.
//!
//! A probe starts at `hash % capacity` and walks forward one slot at a time,
//! wrapping at the end. Only an `Empty` slot ends a probe; tombstones are
//! stepped over. None of these functions may be called on a zero-length
//! array, and the table keeps at least one `Empty` slot so a probe always
//! ends within one lap.

use crate::key::Key;
use crate::slot::{KeyArena, KeyId, Slot};

/// Outcome of a probe for insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// A live slot already holds an equal key.
    Found(usize),
    /// No equal key; the first reusable slot on the probe path.
    Vacant(usize),
}

#[inline]
fn start_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

#[inline]
fn next_index(index: usize, capacity: usize) -> usize {
    if index + 1 == capacity {
        0
    } else {
        index + 1
    }
}

#[inline]
fn key_matches(keys: &KeyArena, id: KeyId, target: &Key) -> bool {
    keys.get(id)
        .map(|k| k.bytes() == target.bytes())
        .unwrap_or(false)
}

/// Find `target`, or the slot an insert of `target` should use.
///
/// A tombstone seen before the terminating `Empty` slot is preferred over
/// that `Empty` slot.
pub(crate) fn probe_insert<T>(slots: &[Slot<T>], keys: &KeyArena, target: &Key) -> Probe {
    let capacity = slots.len();
    debug_assert!(capacity > 0, "probe on an unallocated slot array");
    let mut index = start_index(target.hash(), capacity);
    let mut first_tombstone = None;
    for _ in 0..capacity {
        match &slots[index] {
            Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(index)),
            Slot::Tombstone => {
                first_tombstone.get_or_insert(index);
            }
            Slot::Occupied { key, .. } => {
                if key_matches(keys, *key, target) {
                    return Probe::Found(index);
                }
            }
        }
        index = next_index(index, capacity);
    }
    Probe::Vacant(first_tombstone.expect("load limit leaves a vacant slot on every probe lap"))
}

/// Find the live slot holding `target`, stepping over tombstones.
pub(crate) fn probe_live<T>(slots: &[Slot<T>], keys: &KeyArena, target: &Key) -> Option<usize> {
    let capacity = slots.len();
    debug_assert!(capacity > 0, "probe on an unallocated slot array");
    let mut index = start_index(target.hash(), capacity);
    for _ in 0..capacity {
        match &slots[index] {
            Slot::Empty => return None,
            Slot::Tombstone => {}
            Slot::Occupied { key, .. } => {
                if key_matches(keys, *key, target) {
                    return Some(index);
                }
            }
        }
        index = next_index(index, capacity);
    }
    None
}

/// First `Empty` slot on the probe path of `hash`.
///
/// Used while rebuilding an array, where no two keys are equal and no
/// tombstones exist yet.
pub(crate) fn probe_empty<T>(slots: &[Slot<T>], hash: u64) -> usize {
    let capacity = slots.len();
    debug_assert!(capacity > 0, "probe on an unallocated slot array");
    let mut index = start_index(hash, capacity);
    while !matches!(slots[index], Slot::Empty) {
        index = next_index(index, capacity);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyRef;
    use core::ptr::NonNull;

    fn key(s: &str) -> Key {
        Key::from_ref(KeyRef::from(s), 64).unwrap()
    }

    /// Build an array of `capacity` slots and place `keys` at given indices.
    fn layout(
        capacity: usize,
        placed: &[(usize, &str)],
        value: &mut u32,
    ) -> (Vec<Slot<u32>>, KeyArena) {
        let mut slots: Vec<Slot<u32>> = crate::slot::empty_slots(capacity).unwrap();
        let mut arena = KeyArena::with_key();
        for &(i, s) in placed {
            let id = arena.insert(key(s));
            slots[i] = Slot::Occupied {
                key: id,
                value: NonNull::from(&mut *value),
            };
        }
        (slots, arena)
    }

    fn home(s: &str, capacity: usize) -> usize {
        start_index(key(s).hash(), capacity)
    }

    /// Invariant: an absent key in an empty array lands on its home slot.
    #[test]
    fn vacant_at_home_slot() {
        let mut v = 0;
        let (slots, arena) = layout(8, &[], &mut v);
        assert_eq!(
            probe_insert(&slots, &arena, &key("k")),
            Probe::Vacant(home("k", 8))
        );
        assert_eq!(probe_live(&slots, &arena, &key("k")), None);
    }

    /// Invariant: a present key is found at its slot by both probe shapes.
    #[test]
    fn found_at_home_slot() {
        let mut v = 0;
        let h = home("k", 8);
        let (slots, arena) = layout(8, &[(h, "k")], &mut v);
        assert_eq!(probe_insert(&slots, &arena, &key("k")), Probe::Found(h));
        assert_eq!(probe_live(&slots, &arena, &key("k")), Some(h));
    }

    /// Invariant: collisions walk forward with wraparound.
    #[test]
    fn collision_wraps_around() {
        let mut v = 0;
        let cap = 4;
        let h = home("target", cap);
        // Occupy every slot from home onward except the one just before it.
        let placed: Vec<(usize, &str)> = ["o1", "o2", "o3"]
            .iter()
            .enumerate()
            .map(|(n, o)| ((h + n) % cap, *o))
            .collect();
        let (slots, arena) = layout(cap, &placed, &mut v);
        let last = (h + cap - 1) % cap;
        assert_eq!(
            probe_insert(&slots, &arena, &key("target")),
            Probe::Vacant(last)
        );
        assert_eq!(probe_live(&slots, &arena, &key("target")), None);
        assert_eq!(probe_empty(&slots, key("target").hash()), last);
    }

    /// Invariant: a tombstone does not end a lookup, and is preferred as the
    /// insertion point over the `Empty` slot that ends the probe.
    #[test]
    fn tombstone_is_skipped_and_reused() {
        let mut v = 0;
        let cap = 8;
        let h = home("k", cap);
        let (mut slots, arena) = layout(cap, &[((h + 1) % cap, "k")], &mut v);
        slots[h] = Slot::Tombstone;

        // Lookup walks over the tombstone to the live key.
        assert_eq!(probe_live(&slots, &arena, &key("k")), Some((h + 1) % cap));
        assert_eq!(
            probe_insert(&slots, &arena, &key("k")),
            Probe::Found((h + 1) % cap)
        );

        // A key whose probe starts at the same tombstone reuses it.
        let mut other = None;
        for i in 0..10_000 {
            let s = format!("x{}", i);
            if home(&s, cap) == h {
                other = Some(s);
                break;
            }
        }
        let other = other.expect("some key hashes to the tombstone slot");
        assert_eq!(
            probe_insert(&slots, &arena, &key(&other)),
            Probe::Vacant(h)
        );
        assert_eq!(probe_live(&slots, &arena, &key(&other)), None);
    }

    /// Invariant: a full lap over tombstones and live slots without a match
    /// reports not-found instead of looping.
    #[test]
    fn live_probe_terminates_without_empty_slots() {
        let mut v = 0;
        let (mut slots, arena) = layout(2, &[(0, "a")], &mut v);
        slots[1] = Slot::Tombstone;
        assert_eq!(probe_live(&slots, &arena, &key("zz")), None);
        assert_eq!(probe_insert(&slots, &arena, &key("zz")), Probe::Vacant(1));
    }

    /// Invariant: the rebuild probe returns the first empty slot on the path.
    #[test]
    fn empty_probe_skips_occupied() {
        let mut v = 0;
        let cap = 4;
        let h = home("a", cap);
        let (slots, _arena) = layout(cap, &[(h, "a")], &mut v);
        assert_eq!(probe_empty(&slots, key("a").hash()), (h + 1) % cap);
    }
}
