//! Per-state actions and their outcomes.

use super::host::MachineHost;
use crate::core::{Input, MachineEvent, MachineKey, MachineRuntimeState};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::prelude::*;
use thiserror::Error;

/// Action run when a machine enters a state.
pub type Action = Arc<dyn Fn(&ActionContext) -> ActionOutcome + Send + Sync>;

/// Deferred work of an action, run against the entering state's context.
pub type Deferred = BoxedEffect<(), ActionError, ActionContext>;

/// Failure reported by a deferred action.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("Action failed: {0}")]
    Failed(String),

    #[error("Action panicked: {0}")]
    Panicked(String),
}

impl ActionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// What an action returned: done already, or work still in flight.
pub enum ActionOutcome {
    /// The transition settles as soon as the action returns.
    Immediate,

    /// The transition settles when the effect completes.
    Deferred(Deferred),
}

impl ActionOutcome {
    /// Defer an effect; it runs with the [`ActionContext`] as environment.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stillwater::effect::prelude::*;
    /// use treefsm::{ActionContext, ActionError, ActionOutcome};
    ///
    /// let outcome = ActionOutcome::effect(from_fn(|ctx: &ActionContext| {
    ///     ctx.dispatch("done");
    ///     Ok::<_, ActionError>(())
    /// }));
    /// assert!(outcome.is_deferred());
    /// ```
    pub fn effect<Eff>(effect: Eff) -> Self
    where
        Eff: Effect<Output = (), Error = ActionError, Env = ActionContext> + 'static,
    {
        Self::Deferred(effect.boxed())
    }

    /// Defer an already-started future.
    pub fn deferred<F>(completion: F) -> Self
    where
        F: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Self::effect(from_async(move |_: &ActionContext| completion))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl fmt::Debug for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => f.write_str("Immediate"),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Everything an action may see or do.
///
/// The context is cheap to clone, so deferred actions can move a copy
/// into their completion and dispatch results once the work is done.
#[derive(Clone)]
pub struct ActionContext {
    key: MachineKey,
    input: Input,
    path: String,
    host: Arc<dyn MachineHost>,
}

impl ActionContext {
    pub fn new(key: MachineKey, input: Input, path: String, host: Arc<dyn MachineHost>) -> Self {
        Self {
            key,
            input,
            path,
            host,
        }
    }

    pub fn key(&self) -> &MachineKey {
        &self.key
    }

    /// The input that selected this state.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Full name of the state being entered.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current runtime state of this machine, as the host sees it.
    pub fn state(&self) -> Option<MachineRuntimeState> {
        self.host.runtime_state(&self.key)
    }

    /// Deliver a result to the host, tagged with this state's path.
    pub fn dispatch(&self, payload: impl Into<serde_json::Value>) {
        self.host.dispatch(
            &self.key,
            MachineEvent::ActionResult {
                path: self.path.clone(),
                payload: payload.into(),
            },
        );
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("key", &self.key)
            .field("input", &self.input)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
