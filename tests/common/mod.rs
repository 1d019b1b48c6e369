//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use treefsm::{Machine, MachineKey, MemoryStore, NodeSpec, TransitionEngine};

/// Route engine logs to the test writer. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a machine over a fresh memory store with one session.
pub fn machine(description: &[NodeSpec]) -> (Machine, Arc<MemoryStore>, MachineKey) {
    init_tracing();
    let engine = TransitionEngine::new(description).expect("valid description");
    let store = Arc::new(MemoryStore::new());
    let key = store.create("test");
    (Machine::new(engine, store.clone()), store, key)
}

/// Concatenate every string payload the machine's actions dispatched.
pub fn output(store: &MemoryStore, key: &MachineKey) -> String {
    store
        .results(key)
        .iter()
        .filter_map(|record| record.payload.as_str().map(str::to_owned))
        .collect()
}
