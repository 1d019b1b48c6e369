//! Effectful side of the engine.
//!
//! This module is the "imperative shell" around the pure core: it runs
//! actions, waits on deferred completions and talks to the host.
//!
//! # Key Concepts
//!
//! - **Actions**: run on entry to a state; return `Immediate` or `Deferred`
//! - **Effects**: deferred work is a Stillwater `BoxedEffect` whose
//!   environment is the entering state's `ActionContext`
//! - **Transition Engine**: handles one input against an immutable index
//! - **Machine**: buffers input while an action is in flight and replays
//!   it in arrival order once the action settles
//! - **Host**: owns runtime state and receives every output event

mod action;
mod host;
mod machine;
mod transition;

pub use action::{Action, ActionContext, ActionError, ActionOutcome, Deferred};
pub use host::MachineHost;
pub use machine::{Machine, Submission};
pub use transition::{EngineError, PendingTransition, Settlement, Step, TransitionEngine};
