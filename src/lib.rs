//! Treefsm: an embeddable finite state machine engine
//!
//! A machine is described as a tree of states. Each input selects a
//! successor (an explicit `next` path, or the first child whose matcher
//! accepts it) and runs that state's action. Actions may finish at once
//! or return a deferred completion; while one is in flight, further
//! input for the same machine is buffered and replayed in arrival order.
//!
//! # Core Concepts
//!
//! - **Description**: a tree of [`NodeSpec`]s compiled into an immutable [`Index`]
//! - **Resolution**: `next` override, else first accepting child, else `END`
//! - **Actions**: return [`ActionOutcome::Immediate`] or [`ActionOutcome::Deferred`],
//!   a Stillwater effect run against the entering state's [`ActionContext`]
//! - **Host**: owns runtime state through the [`MachineHost`] capability pair
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use treefsm::{ActionOutcome, Machine, MemoryStore, NodeSpec, TransitionEngine};
//!
//! let description = vec![NodeSpec::new("A")
//!     .action(|ctx| {
//!         ctx.dispatch("tick");
//!         ActionOutcome::Immediate
//!     })
//!     .next("A")];
//!
//! let engine = TransitionEngine::new(&description).unwrap();
//! let store = Arc::new(MemoryStore::new());
//! let machine = Machine::new(engine, store.clone());
//!
//! let key = store.create("counter");
//! for _ in 0..3 {
//!     machine.submit(&key, "tick").unwrap();
//! }
//!
//! assert_eq!(store.results(&key).len(), 3);
//! assert_eq!(store.state(&key).unwrap().current_path, "A");
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod effects;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    Index, Input, MachineEvent, MachineKey, MachineRuntimeState, Matcher, END, START,
};
pub use builder::{BuildError, NodeSpec};
pub use effects::{
    ActionContext, ActionError, ActionOutcome, EngineError, Machine, MachineHost, Submission,
    TransitionEngine,
};
pub use store::MemoryStore;
