//! Basic Machine
//!
//! This example drives a single-state machine that loops on itself and
//! counts every input it sees.
//!
//! Key concepts:
//! - Describing a machine as a tree of `NodeSpec`s
//! - Immediate actions settle inside `submit`
//! - `next` pointing back at the same state forms a self-loop
//!
//! Run with: cargo run --example basic_machine

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use treefsm::{ActionOutcome, Machine, MemoryStore, NodeSpec, TransitionEngine};

fn main() {
    println!("=== Basic Machine Example ===\n");

    let counter = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&counter);

    // One state whose successor is itself
    let description = vec![NodeSpec::new("Counting")
        .action(move |ctx| {
            let seen = calls.fetch_add(1, Ordering::SeqCst) + 1;
            ctx.dispatch(format!("seen {seen}"));
            ActionOutcome::Immediate
        })
        .next("Counting")];

    let engine = TransitionEngine::new(&description).unwrap();
    println!("Index built with {} states", engine.index().len());

    let store = Arc::new(MemoryStore::new());
    let machine = Machine::new(engine, store.clone());
    let key = store.create("counter");

    for input in ["tick", "tick", "tick"] {
        let submission = machine.submit(&key, input).unwrap();
        println!("  {input} -> {submission:?}");
    }

    let state = store.state(&key).unwrap();
    println!("\nCurrent state: {}", state.current_path);
    println!("Inputs counted: {}", counter.load(Ordering::SeqCst));
    for record in store.results(&key) {
        println!("  [{}] {}", record.path, record.payload);
    }

    println!("\n=== Example Complete ===");
}
