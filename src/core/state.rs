//! Per-machine runtime state and the events that evolve it.
//!
//! The host owns the runtime state; the engine only describes how it
//! changes by emitting [`MachineEvent`]s. [`MachineRuntimeState::apply`]
//! is the pure reducer a host uses to fold those events in.

use super::index::START;
use super::input::Input;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Identifies one machine instance within a host store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MachineKey(String);

impl MachineKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MachineKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Runtime position of one machine.
///
/// # Example
///
/// ```rust
/// use treefsm::core::{MachineEvent, MachineRuntimeState, START};
///
/// let state = MachineRuntimeState::new();
/// assert_eq!(state.current_path, START);
///
/// let state = state.apply(&MachineEvent::Transitioning { path: "A".into() });
/// assert!(state.transitioning);
///
/// let state = state.apply(&MachineEvent::Settled {
///     from: START.into(),
///     path: "A".into(),
///     input: "go".into(),
/// });
/// assert_eq!(state.current_path, "A");
/// assert!(!state.transitioning);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineRuntimeState {
    /// Full name of the node the machine currently rests on
    pub current_path: String,

    /// True while exactly one deferred action is in flight
    pub transitioning: bool,

    /// Inputs received while transitioning, oldest first
    pub input_buffer: VecDeque<Input>,
}

impl Default for MachineRuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineRuntimeState {
    /// Fresh runtime state positioned at `START`.
    pub fn new() -> Self {
        Self {
            current_path: START.to_string(),
            transitioning: false,
            input_buffer: VecDeque::new(),
        }
    }

    /// True when nothing is in flight and nothing is waiting.
    pub fn is_idle(&self) -> bool {
        !self.transitioning && self.input_buffer.is_empty()
    }

    /// Fold one event into the state, returning the next state.
    ///
    /// This is a pure function; the receiver is left untouched.
    pub fn apply(&self, event: &MachineEvent) -> Self {
        let mut next = self.clone();
        match event {
            MachineEvent::Settled { path, .. } => {
                next.current_path = path.clone();
                next.transitioning = false;
            }
            MachineEvent::Transitioning { .. } => {
                next.transitioning = true;
            }
            MachineEvent::BufferUpdated { buffer } => {
                next.input_buffer = buffer.iter().cloned().collect();
            }
            MachineEvent::ActionResult { .. } => {}
        }
        next
    }
}

/// Output events emitted by the engine, one per internal event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// A transition completed; the machine now rests on `path`.
    Settled {
        from: String,
        path: String,
        input: Input,
    },

    /// A deferred action towards `path` started.
    Transitioning { path: String },

    /// The input buffer changed; `buffer` is its full new content.
    BufferUpdated { buffer: Vec<Input> },

    /// A result dispatched by an action through its context.
    ActionResult {
        path: String,
        payload: serde_json::Value,
    },
}

impl MachineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Settled { .. } => "settled",
            Self::Transitioning { .. } => "transitioning",
            Self::BufferUpdated { .. } => "buffer_updated",
            Self::ActionResult { .. } => "action_result",
        }
    }
}
