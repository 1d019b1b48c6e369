//! Async Replay
//!
//! This example shows input arriving while a deferred action is still in
//! flight. The machine buffers it and replays it in arrival order once the
//! action completes.
//!
//! Key concepts:
//! - Deferred actions as async closures or Stillwater effects
//! - Input submitted mid-transition returns `Submission::Buffered`
//! - `Machine::idle` waits for the buffer to drain
//! - Burst input ends in the same state as one-at-a-time input
//!
//! Run with: cargo run --example async_replay

use std::sync::Arc;
use std::time::Duration;

use stillwater::effect::prelude::*;
use treefsm::{ActionContext, ActionError, Machine, Matcher, MemoryStore, NodeSpec, TransitionEngine};

fn slow_append(text: &'static str) -> impl Fn() -> BoxedEffect<(), ActionError, ActionContext> {
    move || {
        from_async(move |ctx: &ActionContext| {
            let ctx = ctx.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ctx.dispatch(text);
                Ok(())
            }
        })
        .boxed()
    }
}

fn description() -> Vec<NodeSpec> {
    vec![NodeSpec::new("A")
        .effect(slow_append("a"))
        .child(NodeSpec::new("B").accepts("c").effect(slow_append("b")))
        .child(
            NodeSpec::new("C")
                .accepts(Matcher::pattern("c.*b").unwrap())
                .effect(slow_append("c"))
                .next("A"),
        )]
}

fn output(store: &MemoryStore, key: &treefsm::MachineKey) -> String {
    store
        .results(key)
        .iter()
        .filter_map(|record| record.payload.as_str().map(str::to_owned))
        .collect()
}

#[tokio::main]
async fn main() {
    println!("=== Async Replay Example ===\n");

    let inputs = ["first", "caaaab", "second", "c"];
    let store = Arc::new(MemoryStore::new());

    println!("1. One input at a time:");
    let machine = Machine::new(TransitionEngine::new(&description()).unwrap(), store.clone());
    let sequential = store.create("sequential");
    for input in inputs {
        let submission = machine.submit(&sequential, input).unwrap();
        println!("  {input:>8} -> {submission:?}");
        machine.idle(&sequential).await;
    }

    println!("\n2. The same inputs in one burst:");
    let burst = store.create("burst");
    for input in inputs {
        let submission = machine.submit(&burst, input).unwrap();
        println!("  {input:>8} -> {submission:?}");
    }
    machine.idle(&burst).await;

    for key in [&sequential, &burst] {
        let state = store.state(key).unwrap();
        println!(
            "\n  {}: output {:?}, state {}, path {:?}",
            key.as_str(),
            output(&store, key),
            state.current_path,
            store.history(key).unwrap().get_path()
        );
    }

    println!("\n=== Example Complete ===");
}
