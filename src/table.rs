//! Table: the open-addressed map from owned byte keys to caller pointers.

use crate::config::TableConfig;
use crate::error::TableError;
use crate::garbage::GarbageBin;
use crate::key::{Key, KeyRef};
use crate::probe::{probe_empty, probe_insert, probe_live, Probe};
use crate::slot::{empty_slots, KeyArena, Slot};
use core::cell::RefCell;
use core::fmt;
use core::ptr::NonNull;

/// A string-keyed table of caller-owned pointers.
///
/// The table copies and owns every key. Values are opaque: the table
/// stores, returns and overwrites `NonNull<T>` but never reads through,
/// copies or frees them.
///
/// Lookups take `&self`. The key garbage bin they feed lives behind a
/// `RefCell`, which together with the raw values keeps the table
/// `!Send + !Sync`.
pub struct Table<T> {
    slots: Vec<Slot<T>>,
    keys: KeyArena, // every installed key; slots hold handles into it
    count: usize,
    tombstones: usize,
    garbage: RefCell<GarbageBin>,
    config: TableConfig,
}

/// Point-in-time occupancy figures for a `Table`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    pub len: usize,
    pub capacity: usize,
    pub tombstones: usize,
    pub pending_garbage: usize,
    pub load_factor: f64,
}

impl<T> Table<T> {
    /// Empty table with the default configuration. Allocates nothing.
    pub fn new() -> Self {
        Self::from_valid_config(TableConfig::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TableConfig) -> Self {
        Self {
            slots: Vec::new(),
            keys: KeyArena::with_key(),
            count: 0,
            tombstones: 0,
            garbage: RefCell::new(GarbageBin::new(config.garbage_capacity)),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots; 0 until the first insert or `grow`.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn stats(&self) -> TableStats {
        let capacity = self.capacity();
        TableStats {
            len: self.count,
            capacity,
            tombstones: self.tombstones,
            pending_garbage: self.garbage.borrow().len(),
            load_factor: if capacity == 0 {
                0.0
            } else {
                self.count as f64 / capacity as f64
            },
        }
    }

    fn make_key(&self, key: KeyRef<'_>) -> Result<Key, TableError> {
        Key::from_ref(key, self.config.max_key_len)
    }

    /// Insert or overwrite. Returns `true` when `key` was not present.
    ///
    /// On overwrite only the value changes; the stored key is kept and the
    /// freshly built one goes to the garbage bin.
    pub fn set<'k>(
        &mut self,
        key: impl Into<KeyRef<'k>>,
        value: NonNull<T>,
    ) -> Result<bool, TableError> {
        let key = self.make_key(key.into())?;
        self.set_with_key(key, value)
    }

    fn set_with_key(&mut self, key: Key, value: NonNull<T>) -> Result<bool, TableError> {
        if !self.slots.is_empty() {
            if let Probe::Found(index) = probe_insert(&self.slots, &self.keys, &key) {
                self.overwrite(index, key, value);
                return Ok(false);
            }
        }

        self.make_room_for_one()?;
        match probe_insert(&self.slots, &self.keys, &key) {
            Probe::Found(index) => {
                self.overwrite(index, key, value);
                Ok(false)
            }
            Probe::Vacant(index) => {
                if matches!(self.slots[index], Slot::Tombstone) {
                    self.tombstones -= 1;
                }
                let id = self.keys.insert(key);
                self.slots[index] = Slot::Occupied { key: id, value };
                self.count += 1;
                Ok(true)
            }
        }
    }

    fn overwrite(&mut self, index: usize, redundant: Key, value: NonNull<T>) {
        if let Slot::Occupied { value: stored, .. } = &mut self.slots[index] {
            *stored = value;
        }
        self.garbage.get_mut().retire(redundant);
    }

    /// Value stored under `key`, if any.
    pub fn get<'k>(
        &self,
        key: impl Into<KeyRef<'k>>,
    ) -> Result<Option<NonNull<T>>, TableError> {
        Ok(self.lookup(key.into())?.map(|index| self.value_at(index)))
    }

    pub fn exists<'k>(&self, key: impl Into<KeyRef<'k>>) -> Result<bool, TableError> {
        Ok(self.lookup(key.into())?.is_some())
    }

    /// Remove `key`. Returns `true` when an entry was removed.
    ///
    /// The slot becomes a tombstone so probes for keys stored past it still
    /// reach them. The removed key is retired to the garbage bin.
    pub fn unset<'k>(&mut self, key: impl Into<KeyRef<'k>>) -> Result<bool, TableError> {
        let Some(index) = self.lookup(key.into())? else {
            return Ok(false);
        };
        let vacated = core::mem::replace(&mut self.slots[index], Slot::Tombstone);
        if let Slot::Occupied { key, .. } = vacated {
            let removed = self
                .keys
                .remove(key)
                .expect("occupied slot refers to an installed key");
            self.garbage.get_mut().retire(removed);
        }
        self.count -= 1;
        self.tombstones += 1;
        Ok(true)
    }

    /// Remove every entry, keeping the capacity.
    ///
    /// Installed keys and the garbage bin are released immediately.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.keys.clear();
        let released = self.garbage.get_mut().flush();
        crate::log_trace!(
            "cleared {} entries, released {} binned keys",
            self.count,
            released
        );
        self.count = 0;
        self.tombstones = 0;
    }

    /// Ensure at least `min_capacity` slots.
    ///
    /// Returns `false` when the table is already that large. Otherwise the
    /// new capacity is the larger of `min_capacity` and the next growth
    /// step. Only the slot array is rebuilt; keys move by handle.
    pub fn grow(&mut self, min_capacity: usize) -> Result<bool, TableError> {
        let capacity = self.capacity();
        if min_capacity <= capacity {
            return Ok(false);
        }
        if min_capacity > self.config.max_capacity {
            return Err(TableError::CapacityExceeded {
                requested: min_capacity,
                max: self.config.max_capacity,
            });
        }
        let target = match self.config.next_capacity(capacity) {
            Ok(step) => step.max(min_capacity),
            Err(_) => min_capacity,
        };
        crate::log_debug!("growing table from {} to {} slots on request", capacity, target);
        self.rebuild(target)?;
        Ok(true)
    }

    /// Merge every entry of `source` into this table with `set` semantics.
    ///
    /// Keys are deep copied; the two tables never share key storage.
    pub fn copy_from(&mut self, source: &Table<T>) -> Result<(), TableError> {
        for slot in source.slots.iter() {
            if let Slot::Occupied { key, value } = slot {
                let key = source
                    .keys
                    .get(*key)
                    .expect("occupied slot refers to an installed key")
                    .duplicate()?;
                self.set_with_key(key, *value)?;
            }
        }
        Ok(())
    }

    /// New table with this table's configuration, at least its capacity,
    /// and deep copies of all of its keys.
    pub fn try_clone(&self) -> Result<Self, TableError> {
        let mut table = Self::from_valid_config(self.config);
        table.grow(self.capacity())?;
        table.copy_from(self)?;
        Ok(table)
    }

    /// Release the keys waiting in the garbage bin now. Returns how many.
    pub fn flush_garbage(&self) -> usize {
        self.garbage.borrow_mut().flush()
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.slots.iter(),
            keys: &self.keys,
            remaining: self.count,
        }
    }

    fn lookup(&self, key: KeyRef<'_>) -> Result<Option<usize>, TableError> {
        if self.slots.is_empty() {
            key.resolve(self.config.max_key_len)?;
            return Ok(None);
        }
        let probe_key = self.make_key(key)?;
        let found = probe_live(&self.slots, &self.keys, &probe_key);
        self.garbage.borrow_mut().retire(probe_key);
        Ok(found)
    }

    fn value_at(&self, index: usize) -> NonNull<T> {
        match self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("live probe returned a slot without an entry"),
        }
    }

    /// Grow, or purge tombstones, so one more entry fits under the fill ratio.
    ///
    /// Growth counts live entries only; tombstones are then counted against
    /// the same ratio and purged in place when they would overload the array.
    /// Either way at least one `Empty` slot remains for probes to stop at.
    fn make_room_for_one(&mut self) -> Result<(), TableError> {
        let needed = self.count + 1;
        let capacity = self.capacity();
        if self.config.exceeds_fill_ratio(needed, capacity) {
            let mut target = capacity;
            while self.config.exceeds_fill_ratio(needed, target) {
                target = self.config.next_capacity(target)?;
            }
            crate::log_debug!(
                "growing table from {} to {} slots ({} live)",
                capacity,
                target,
                self.count
            );
            self.rebuild(target)
        } else if self.config.exceeds_fill_ratio(needed + self.tombstones, capacity) {
            crate::log_debug!(
                "purging {} tombstones from {} slots",
                self.tombstones,
                capacity
            );
            self.rebuild(capacity)
        } else {
            Ok(())
        }
    }

    /// Move every live entry into a fresh array of `capacity` slots.
    ///
    /// Uses each key's cached hash; key bytes are neither copied nor rehashed.
    /// On allocation failure the table is left unchanged.
    fn rebuild(&mut self, capacity: usize) -> Result<(), TableError> {
        let mut slots = empty_slots(capacity)?;
        for slot in core::mem::take(&mut self.slots) {
            if let Slot::Occupied { key, value } = slot {
                let hash = self
                    .keys
                    .get(key)
                    .expect("occupied slot refers to an installed key")
                    .hash();
                let index = probe_empty(&slots, hash);
                slots[index] = Slot::Occupied { key, value };
            }
        }
        self.slots = slots;
        self.tombstones = 0;
        Ok(())
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("Table")
            .field("len", &stats.len)
            .field("capacity", &stats.capacity)
            .field("load_factor", &stats.load_factor)
            .finish()
    }
}

/// Iterator over `(key bytes, value)` pairs of a `Table`.
pub struct Iter<'a, T> {
    slots: core::slice::Iter<'a, Slot<T>>,
    keys: &'a KeyArena,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (&'a [u8], NonNull<T>);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let keys = self.keys;
        let item = self.slots.by_ref().find_map(|slot| match slot {
            Slot::Occupied { key, value } => keys.get(*key).map(|k| (k.bytes(), *value)),
            _ => None,
        })?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = (&'a [u8], NonNull<T>);
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
