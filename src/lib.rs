//! keyed-table: a single-threaded, string-keyed table of caller-owned
//! pointers, built on open addressing with linear probing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small associative container whose every ownership transfer
//!   is an explicit move: keys are copied in, installed, and later retired;
//!   values are never touched.
//! - Layers:
//!   - `key`: owned `Key` (private byte copy, cached FNV-1a hash) and the
//!     borrowed `KeyRef` input it is built from.
//!   - `slot`/`probe`: the slot states (`Empty`, `Tombstone`, `Occupied`)
//!     and the linear probe sequences over them.
//!   - `garbage`: bounded bin of retired keys, released in batches.
//!   - `table`: public `Table` tying the pieces together; growth, rehash
//!     and the set/get/exists/unset/clear/copy operations.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (raw values, `RefCell` bin).
//! - Keys are owned by the table, values by the caller. The table never
//!   dereferences, copies or frees a value.
//! - Capacity only grows. A rebuild moves key handles, never key bytes.
//! - Contract violations (oversized keys, capacity ceiling, allocation
//!   failure) are `TableError`s. A missing key is not an error.
//!
//! Key ownership
//! - Every operation builds a fresh `Key` from the caller's bytes, reads
//!   included. An inserted key moves into the key arena and its handle into
//!   a slot. A key that turns out to be redundant (overwrite, lookup) or
//!   that is displaced (`unset`) moves into the garbage bin; the bin drops
//!   its keys all at once when full, on `clear`, or with the table.
//!
//! Probing and deletion
//! - Probes start at `hash % capacity` and step by one with wraparound.
//!   Only an `Empty` slot ends a probe; `unset` leaves a `Tombstone` so
//!   keys stored further along the same path stay reachable. Inserts reuse
//!   the first tombstone on their path.
//! - Growth is checked against `len + 1` before an insert. Tombstones are
//!   counted against the same fill ratio and purged by an in-place rebuild,
//!   so at least one `Empty` slot always remains.
//!
//! Notes and non-goals
//! - No concurrent access, no ordering guarantees for `iter`, no owned
//!   value storage, no persistence.
//! - No shrinking; `clear` keeps the slot array.
//!
//! Logging
//! - With the `logging` feature, growth, tombstone purges and bin releases
//!   are reported through the `log` facade. Without it the macros compile
//!   to nothing.

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        log::trace!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;

mod config;
mod error;
mod garbage;
mod key;
mod probe;
mod slot;
mod table;
mod table_proptest;

// Public surface
pub use config::{
    TableConfig, DEFAULT_GARBAGE_CAPACITY, DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_CAPACITY,
    DEFAULT_MAX_CAPACITY, DEFAULT_MAX_FILL_RATIO, DEFAULT_MAX_KEY_LEN,
};
pub use error::TableError;
pub use key::{fnv1a, KeyRef};
pub use table::{Iter, Table, TableStats};
