//! Property-based tests for indexing, resolution and input replay.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated descriptions and input sequences.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use treefsm::builder::build_index;
use treefsm::config::EngineConfig;
use treefsm::{ActionOutcome, Machine, MemoryStore, NodeSpec, TransitionEngine, END, START};

/// A three-level tree: `shape[i][j]` is the number of grandchildren
/// under the j-th child of the i-th top-level node.
fn tree(shape: &[Vec<usize>]) -> (Vec<NodeSpec>, Vec<String>) {
    let mut paths = Vec::new();
    let description = shape
        .iter()
        .enumerate()
        .map(|(i, children)| {
            let top = format!("S{i}");
            paths.push(top.clone());
            NodeSpec::new(&top).noop().children(children.iter().enumerate().map(
                |(j, &grandchildren)| {
                    let child = format!("{top}.C{j}");
                    paths.push(child.clone());
                    NodeSpec::new(format!("C{j}")).noop().children((0..grandchildren).map(
                        |k| {
                            paths.push(format!("{child}.G{k}"));
                            NodeSpec::new(format!("G{k}")).noop()
                        },
                    ))
                },
            ))
        })
        .collect();
    (description, paths)
}

prop_compose! {
    fn arbitrary_shape()(
        shape in prop::collection::vec(prop::collection::vec(0..3usize, 0..4), 0..5)
    ) -> Vec<Vec<usize>> {
        shape
    }
}

prop_compose! {
    fn arbitrary_input()(text in "[a-z]{0,6}") -> String {
        text
    }
}

fn index(description: &[NodeSpec]) -> treefsm::Index {
    build_index(description, &EngineConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn full_names_join_ancestors(shape in arbitrary_shape()) {
        let (description, expected) = tree(&shape);
        let index = index(&description);

        prop_assert_eq!(index.len(), expected.len() + 2);
        for path in &expected {
            let node = index.get(path).unwrap();
            prop_assert_eq!(node.full_name(), path.as_str());
            prop_assert!(path.ends_with(node.name()));
        }
    }

    #[test]
    fn leaves_always_end(input in arbitrary_input()) {
        let engine = TransitionEngine::new(&[NodeSpec::new("Leaf").noop()]).unwrap();
        let store = Arc::new(MemoryStore::new());
        let machine = Machine::new(engine, store.clone());
        let key = store.create("leaf");

        machine.submit(&key, "enter").unwrap();
        machine.submit(&key, input.as_str()).unwrap();

        prop_assert_eq!(store.state(&key).unwrap().current_path, END);
    }

    #[test]
    fn next_wins_over_child_matchers(
        input in arbitrary_input(),
        literals in prop::collection::vec("[a-z]{0,2}", 1..4)
    ) {
        let engine = TransitionEngine::new(&[
            NodeSpec::new("A")
                .noop()
                .next("Target")
                .children(literals.iter().enumerate().map(|(i, literal)| {
                    NodeSpec::new(format!("K{i}")).accepts(literal.as_str()).noop()
                })),
            NodeSpec::new("Target").noop(),
        ])
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        let machine = Machine::new(engine, store.clone());
        let key = store.create("next");

        machine.submit(&key, "enter").unwrap();
        machine.submit(&key, input.as_str()).unwrap();

        prop_assert_eq!(store.state(&key).unwrap().current_path, "Target");
    }

    #[test]
    fn first_accepting_sibling_wins(
        literals in prop::collection::vec("[ab]{1,2}", 1..6),
        input in "[ab]{1,2}"
    ) {
        let description = [NodeSpec::new("Root")
            .noop()
            .children(literals.iter().enumerate().map(|(i, literal)| {
                NodeSpec::new(format!("K{i}")).accepts(literal.as_str()).noop()
            }))];
        let engine = TransitionEngine::new(&description).unwrap();
        let store = Arc::new(MemoryStore::new());
        let machine = Machine::new(engine, store.clone());
        let key = store.create("siblings");
        machine.submit(&key, "enter").unwrap();

        let result = machine.submit(&key, input.as_str());

        match literals.iter().position(|literal| *literal == input) {
            Some(first) => {
                prop_assert!(result.is_ok());
                prop_assert_eq!(
                    store.state(&key).unwrap().current_path,
                    format!("Root.K{first}")
                );
            }
            None => {
                prop_assert!(result.is_err());
                prop_assert_eq!(store.state(&key).unwrap().current_path, "Root");
            }
        }
    }

    #[test]
    fn buffered_inputs_replay_in_arrival_order(
        inputs in prop::collection::vec(arbitrary_input(), 1..8)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let seen = runtime.block_on(async {
            let engine = TransitionEngine::new(&[NodeSpec::new("Loop")
                .deferred(|ctx| {
                    let ctx = ctx.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        ctx.dispatch(ctx.input().as_text().into_owned());
                        Ok(())
                    }
                })
                .next("Loop")])
            .unwrap();
            let store = Arc::new(MemoryStore::new());
            let machine = Machine::new(engine, store.clone());
            let key = store.create("fifo");

            for input in &inputs {
                machine.submit(&key, input.as_str()).unwrap();
            }
            machine.idle(&key).await;

            store
                .results(&key)
                .into_iter()
                .map(|record| record.payload.as_str().unwrap_or_default().to_string())
                .collect::<Vec<_>>()
        });

        prop_assert_eq!(seen, inputs);
    }

    #[test]
    fn start_is_never_a_child(shape in arbitrary_shape()) {
        let (description, _) = tree(&shape);
        let index = index(&description);

        let start_suffix = format!(".{START}");
        prop_assert!(index.paths().all(|path| !path.ends_with(&start_suffix)));
        prop_assert_eq!(index.start().children().len(), shape.len());
    }
}

#[test]
fn immediate_actions_do_not_need_a_runtime() {
    let engine = TransitionEngine::new(&[NodeSpec::new("A")
        .action(|_| ActionOutcome::Immediate)
        .next("A")])
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    let machine = Machine::new(engine, store.clone());
    let key = store.create("plain");

    for _ in 0..5 {
        machine.submit(&key, 1).unwrap();
    }

    assert_eq!(store.history(&key).unwrap().len(), 5);
}
