//! Core state machine types and logic.
//!
//! This module contains the pure part of the engine:
//! - Input tokens and the matchers that accept them
//! - The immutable path index and successor resolution
//! - Runtime state, output events and the reducer folding them
//! - Immutable transition history
//!
//! Nothing in this module performs I/O or runs actions.

mod history;
mod index;
mod input;
mod matcher;
mod resolver;
mod state;

pub use history::{TransitionHistory, TransitionRecord};
pub use index::{DanglingReference, Index, Node, NodeId, END, START};
pub use input::Input;
pub use matcher::Matcher;
pub use resolver::{resolve, Successor};
pub use state::{MachineEvent, MachineKey, MachineRuntimeState};
