//! Bounded bin of retired keys, released in batches.
//!
//! Keys leave the live structure in two ways: a lookup key that was only
//! needed for probing, or a stored key displaced by `unset`/an overwrite.
//! Neither is dropped at the call site; both move into the bin, and the
//! whole bin is released at once when it fills up or the table goes away.

use crate::key::Key;

#[derive(Debug)]
pub(crate) struct GarbageBin {
    held: Vec<Key>,
    capacity: usize,
}

impl GarbageBin {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            held: Vec::new(),
            capacity,
        }
    }

    /// Take ownership of `key`; a full bin is flushed first.
    pub(crate) fn retire(&mut self, key: Key) {
        if self.held.len() >= self.capacity {
            let released = self.flush();
            crate::log_trace!("garbage bin full, released {} keys", released);
        }
        self.held.push(key);
    }

    /// Release every held key. Returns how many were released.
    pub(crate) fn flush(&mut self) -> usize {
        let n = self.held.len();
        // Keep the buffer; a bin that filled once tends to fill again.
        self.held.clear();
        n
    }

    pub(crate) fn len(&self) -> usize {
        self.held.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl Drop for GarbageBin {
    fn drop(&mut self) {
        if !self.is_empty() {
            let released = self.flush();
            crate::log_trace!("garbage bin dropped, released {} keys", released);
        }
    }
}
