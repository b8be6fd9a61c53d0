#![cfg(test)]

// Property tests for Table kept inside the crate so they can read
// internal counters (tombstones, garbage) through `stats()` alongside the
// public operations.

use crate::config::TableConfig;
use crate::key::{fnv1a, KeyRef};
use crate::table::Table;
use core::ptr::NonNull;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn ptr(n: usize) -> NonNull<()> {
    NonNull::new(n as *mut ()).expect("values are non-zero")
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, usize),
    Get(usize),
    Exists(String),
    Unset(usize),
    Clear,
    Grow(usize),
    Flush,
    Iterate,
    CloneCheck,
}

fn arb_ops(pool_len: usize) -> impl Strategy<Value = Vec<OpI>> {
    let idx = 0..pool_len;
    let op = prop_oneof![
        4 => (idx.clone(), 1usize..1_000).prop_map(|(i, v)| OpI::Set(i, v)),
        2 => idx.clone().prop_map(OpI::Get),
        1 => "[a-z]{0,5}".prop_map(OpI::Exists),
        3 => idx.prop_map(OpI::Unset),
        1 => Just(OpI::Clear),
        1 => (0usize..64).prop_map(OpI::Grow),
        1 => Just(OpI::Flush),
        1 => Just(OpI::Iterate),
        1 => Just(OpI::CloneCheck),
    ];
    proptest::collection::vec(op, 1..80)
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::btree_set("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let pool: Vec<String> = pool.into_iter().collect();
        let n = pool.len();
        arb_ops(n).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Apply `ops` to a table and to a `HashMap` model, checking parity after
/// every step.
fn run_against_model(
    mut sut: Table<()>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, usize> = HashMap::new();
    let garbage_capacity = sut.config().garbage_capacity;
    let max_capacity = sut.config().max_capacity;

    for op in ops {
        let cap_before = sut.capacity();
        match op {
            OpI::Set(i, v) => {
                let k = &pool[i];
                let already = model.contains_key(k);
                match sut.set(k, ptr(v)) {
                    Ok(is_new) => {
                        prop_assert_eq!(is_new, !already, "set reports new iff absent");
                        model.insert(k.clone(), v);
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("set failed: {}", e))),
                }
            }
            OpI::Get(i) => {
                let k = &pool[i];
                let got = sut.get(k).expect("pool keys are valid");
                prop_assert_eq!(got, model.get(k).map(|&v| ptr(v)));
            }
            OpI::Exists(s) => {
                let has = sut.exists(s.as_str()).expect("short keys are valid");
                prop_assert_eq!(has, model.contains_key(&s));
            }
            OpI::Unset(i) => {
                let k = &pool[i];
                let removed = sut.unset(k).expect("pool keys are valid");
                prop_assert_eq!(removed, model.remove(k).is_some());
                prop_assert!(!sut.exists(k).expect("pool keys are valid"));
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before, "clear keeps capacity");
            }
            OpI::Grow(n) => {
                let n = n.min(max_capacity);
                let grew = sut.grow(n).expect("within the capacity ceiling");
                prop_assert_eq!(grew, n > cap_before);
                prop_assert!(sut.capacity() >= n);
            }
            OpI::Flush => {
                let pending = sut.stats().pending_garbage;
                prop_assert_eq!(sut.flush_garbage(), pending);
            }
            OpI::Iterate => {
                let s: BTreeMap<Vec<u8>, NonNull<()>> =
                    sut.iter().map(|(k, v)| (k.to_vec(), v)).collect();
                let m: BTreeMap<Vec<u8>, NonNull<()>> = model
                    .iter()
                    .map(|(k, &v)| (k.clone().into_bytes(), ptr(v)))
                    .collect();
                prop_assert_eq!(s, m);
            }
            OpI::CloneCheck => {
                let copy = sut.try_clone().expect("clone within limits");
                prop_assert_eq!(copy.len(), model.len());
                prop_assert!(copy.capacity() >= sut.capacity());
                for (k, &v) in &model {
                    prop_assert_eq!(copy.get(k).expect("valid key"), Some(ptr(v)));
                }
            }
        }

        // Post-conditions after each op
        // 1) Capacity never shrinks
        prop_assert!(sut.capacity() >= cap_before);
        // 2) Size parity
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        // 3) Probes always have an empty slot to stop at
        let stats = sut.stats();
        if stats.capacity > 0 {
            prop_assert!(stats.len + stats.tombstones < stats.capacity);
        }
        // 4) The garbage bin stays bounded
        prop_assert!(stats.pending_garbage <= garbage_capacity);
    }

    // Every model key is reachable; nothing else is.
    for (k, &v) in &model {
        prop_assert_eq!(sut.get(KeyRef::from(k)).expect("valid key"), Some(ptr(v)));
    }
    let keys: BTreeSet<Vec<u8>> = sut.iter().map(|(k, _)| k.to_vec()).collect();
    prop_assert_eq!(keys.len(), model.len());
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `set` reports a new key iff the model lacked it; values follow the model.
// - `get`/`exists` parity with the model, before and after `unset`.
// - `clear` empties without shrinking; `grow` only ever enlarges.
// - `iter` yields each live entry exactly once; clones carry every entry.
// - `len + tombstones < capacity` and a bounded garbage bin after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: Table<()> = Table::with_config(TableConfig {
            initial_capacity: 2,
            garbage_capacity: 5,
            ..TableConfig::default()
        }).unwrap();
        run_against_model(sut, &pool, ops)?;
    }
}

/// Keys whose probes all start at the same slot of an 8-slot array.
fn colliding_pool() -> Vec<String> {
    let target = fnv1a(b"p0") % 8;
    (0..)
        .map(|i| format!("p{}", i))
        .filter(|k| fnv1a(k.as_bytes()) % 8 == target)
        .take(6)
        .collect()
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior: a fixed 8-slot table whose keys all share one home
// slot. Every lookup walks the same cluster, so tombstone handling and
// in-place purges decide correctness.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops(6)) {
        let pool = colliding_pool();
        let sut: Table<()> = Table::with_config(TableConfig {
            initial_capacity: 8,
            max_capacity: 8,
            garbage_capacity: 3,
            ..TableConfig::default()
        }).unwrap();
        run_against_model(sut, &pool, ops)?;
    }
}
