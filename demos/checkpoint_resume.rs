//! Checkpoint and Resume
//!
//! This example checkpoints a running machine session, serializes it, and
//! resumes it on a fresh store as if the process had restarted.
//!
//! Key concepts:
//! - `MemoryStore::checkpoint` snapshots state plus transition history
//! - JSON for readability, bincode bytes for compactness
//! - Validating a checkpoint against the description before resuming
//!
//! Run with: cargo run --example checkpoint_resume

use std::sync::Arc;

use treefsm::checkpoint::Checkpoint;
use treefsm::{ActionOutcome, Machine, MemoryStore, NodeSpec, TransitionEngine};

fn description() -> Vec<NodeSpec> {
    let log = |text: &'static str| {
        move |ctx: &treefsm::ActionContext| {
            ctx.dispatch(text);
            ActionOutcome::Immediate
        }
    };

    vec![
        NodeSpec::new("Draft").action(log("drafting")).next("Review"),
        NodeSpec::new("Review")
            .action(log("reviewing"))
            .child(NodeSpec::new("Approved").accepts("approve").action(log("approved")))
            .child(NodeSpec::new("Rejected").accepts("reject").next("Draft")),
    ]
}

fn main() {
    println!("=== Checkpoint and Resume Example ===\n");

    // First run: reach Review, then stop
    let store = Arc::new(MemoryStore::new());
    let machine = Machine::new(TransitionEngine::new(&description()).unwrap(), store.clone());
    let key = store.create("document-42");

    for input in ["open", "submit"] {
        machine.submit(&key, input).unwrap();
    }
    println!("Before interruption: {}", store.state(&key).unwrap().current_path);

    let checkpoint = store.checkpoint(&key).unwrap();
    let json = checkpoint.to_json().unwrap();
    let bytes = checkpoint.to_bytes().unwrap();
    println!("  [Checkpoint] {} (json {} bytes, binary {} bytes)", checkpoint.id, json.len(), bytes.len());

    // Second run: a fresh process with nothing in memory
    let engine = TransitionEngine::new(&description()).unwrap();
    let restored = Checkpoint::from_bytes(&bytes).unwrap();
    restored.validate_against(engine.index()).unwrap();

    let store = Arc::new(MemoryStore::new());
    let machine = Machine::new(engine, store.clone());
    let key = store.restore(restored);
    println!("Resumed at: {}", store.state(&key).unwrap().current_path);

    machine.submit(&key, "approve").unwrap();
    println!("After resume: {}", store.state(&key).unwrap().current_path);
    println!("History: {:?}", store.history(&key).unwrap().get_path());

    println!("\n=== Example Complete ===");
}
