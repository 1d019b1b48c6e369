//! One input cycle: validate, resolve, run the action, classify.

use super::action::{ActionContext, ActionError, ActionOutcome, Deferred};
use super::host::MachineHost;
use crate::builder::{build_index, BuildError, NodeSpec};
use crate::config::EngineConfig;
use crate::core::{
    resolve, Index, Input, MachineEvent, MachineKey, MachineRuntimeState, Node, Successor, END,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use stillwater::effect::Effect;
use thiserror::Error;
use tokio::runtime::Handle;

/// Usage errors raised while handling an input.
///
/// None of these change runtime state; the offending input is dropped.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("No runtime state for machine '{key}'")]
    UnknownMachine { key: MachineKey },

    #[error("Machine '{key}' is in nonexistent state '{path}'")]
    UnknownState { key: MachineKey, path: String },

    #[error("No valid successor from '{path}' for input {input}")]
    NoValidSuccessor {
        key: MachineKey,
        path: String,
        input: Input,
    },

    /// Raised before the action runs for states declared with
    /// `deferred`/`effect`. A plain `action` that returns a deferred
    /// outcome has already run when this is reported.
    #[error("Deferred action entering '{path}' needs a Tokio runtime")]
    NoRuntime { path: String },

    #[error("Action entering '{path}' of machine '{key}' panicked: {message}")]
    ActionPanicked {
        key: MachineKey,
        path: String,
        message: String,
    },
}

/// A completed transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    pub from: String,
    pub path: String,
    pub input: Input,
    /// Set when a deferred action failed or panicked.
    pub error: Option<ActionError>,
}

impl Settlement {
    pub fn event(&self) -> MachineEvent {
        MachineEvent::Settled {
            from: self.from.clone(),
            path: self.path.clone(),
            input: self.input.clone(),
        }
    }
}

/// Result of handling one input.
#[derive(Debug)]
pub enum Step {
    /// The machine is at `END`; the input was discarded.
    Ignored,

    /// The transition completed synchronously.
    Settled(Settlement),

    /// A deferred action is in flight.
    Pending(PendingTransition),
}

/// Where a failed deferred action settles.
#[derive(Clone, Debug, PartialEq)]
enum Fallback {
    /// No `on_error`: settle on the successor as if the action succeeded.
    Successor,
    Path(String),
    /// `on_error` names a path that is not in the index.
    Dangling(String),
}

/// A transition waiting on its deferred action.
pub struct PendingTransition {
    key: MachineKey,
    from: String,
    path: String,
    input: Input,
    fallback: Fallback,
    completion: Deferred,
    context: ActionContext,
}

impl PendingTransition {
    /// Path the machine settles on when the action succeeds.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the action and produce the settlement.
    ///
    /// Resolves exactly once, whether the action succeeds, fails or panics.
    pub async fn wait(self) -> Settlement {
        let context = self.context;
        let result = AssertUnwindSafe(self.completion.run(&context))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ActionError::Panicked(panic_message(panic.as_ref()))));

        let Err(error) = result else {
            return Settlement {
                from: self.from,
                path: self.path,
                input: self.input,
                error: None,
            };
        };

        let path = match self.fallback {
            Fallback::Successor => {
                tracing::warn!(
                    machine = %self.key,
                    path = %self.path,
                    error = %error,
                    "Action failed without on_error; settling as success"
                );
                self.path
            }
            Fallback::Path(path) => {
                tracing::error!(
                    machine = %self.key,
                    path = %self.path,
                    on_error = %path,
                    error = %error,
                    "Action failed; routing to on_error"
                );
                path
            }
            Fallback::Dangling(target) => {
                tracing::warn!(
                    machine = %self.key,
                    path = %self.path,
                    on_error = %target,
                    error = %error,
                    "Action failed and on_error is not a known state; routing to END"
                );
                END.to_string()
            }
        };

        Settlement {
            from: self.from,
            path,
            input: self.input,
            error: Some(error),
        }
    }
}

impl std::fmt::Debug for PendingTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransition")
            .field("key", &self.key)
            .field("from", &self.from)
            .field("path", &self.path)
            .field("input", &self.input)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Stateless transition engine over an immutable index.
///
/// The engine never stores runtime state; it reads the state it is
/// given and describes the transition. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct TransitionEngine {
    index: Arc<Index>,
    config: EngineConfig,
}

impl TransitionEngine {
    /// Compile a description with the default configuration.
    pub fn new(description: &[NodeSpec]) -> Result<Self, BuildError> {
        Self::with_config(description, EngineConfig::default())
    }

    pub fn with_config(description: &[NodeSpec], config: EngineConfig) -> Result<Self, BuildError> {
        let index = build_index(description, &config)?;
        for dangling in index.dangling_references() {
            tracing::warn!(
                from = %dangling.from,
                target = %dangling.target,
                "State references an unknown path; it will route to END"
            );
        }
        Ok(Self {
            index: Arc::new(index),
            config,
        })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle one input for a machine that is not transitioning.
    ///
    /// Runs the successor's action, if any, and classifies the outcome.
    /// Errors leave the runtime state untouched.
    pub fn handle_input(
        &self,
        key: &MachineKey,
        state: &MachineRuntimeState,
        input: Input,
        host: &Arc<dyn MachineHost>,
    ) -> Result<Step, EngineError> {
        let current = self
            .index
            .get(&state.current_path)
            .ok_or_else(|| EngineError::UnknownState {
                key: key.clone(),
                path: state.current_path.clone(),
            })?;

        if current.full_name() == END {
            tracing::warn!(machine = %key, input = %input, "Machine has ended; input discarded");
            return Ok(Step::Ignored);
        }

        let successor = match resolve(&self.index, current, &input) {
            Successor::Node(id) => self.index.node(id),
            Successor::Terminal => {
                tracing::debug!(machine = %key, from = %current.full_name(), "No successors; ending");
                return Ok(Step::Settled(settle_at_end(current, input)));
            }
            Successor::Dangling(target) => {
                tracing::warn!(
                    machine = %key,
                    from = %current.full_name(),
                    next = %target,
                    "Next state does not exist; routing to END"
                );
                return Ok(Step::Settled(settle_at_end(current, input)));
            }
            Successor::NoMatch => {
                return Err(EngineError::NoValidSuccessor {
                    key: key.clone(),
                    path: current.full_name().to_string(),
                    input,
                })
            }
        };

        if successor.is_deferred() && Handle::try_current().is_err() {
            return Err(EngineError::NoRuntime {
                path: successor.full_name().to_string(),
            });
        }

        let context = ActionContext::new(
            key.clone(),
            input.clone(),
            successor.full_name().to_string(),
            Arc::clone(host),
        );
        let outcome = match successor.action() {
            Some(action) => panic::catch_unwind(AssertUnwindSafe(|| action(&context))).map_err(
                |panic| EngineError::ActionPanicked {
                    key: key.clone(),
                    path: successor.full_name().to_string(),
                    message: panic_message(panic.as_ref()),
                },
            )?,
            None => ActionOutcome::Immediate,
        };

        tracing::debug!(
            machine = %key,
            from = %current.full_name(),
            to = %successor.full_name(),
            input = %input,
            deferred = outcome.is_deferred(),
            "Transition"
        );

        match outcome {
            ActionOutcome::Immediate => Ok(Step::Settled(Settlement {
                from: current.full_name().to_string(),
                path: successor.full_name().to_string(),
                input,
                error: None,
            })),
            ActionOutcome::Deferred(completion) => Ok(Step::Pending(PendingTransition {
                key: key.clone(),
                from: current.full_name().to_string(),
                path: successor.full_name().to_string(),
                input,
                fallback: self.fallback(successor),
                completion,
                context,
            })),
        }
    }

    fn fallback(&self, node: &Node) -> Fallback {
        match node.on_error() {
            None => Fallback::Successor,
            Some(target) if self.index.contains(target) => Fallback::Path(target.to_string()),
            Some(target) => Fallback::Dangling(target.to_string()),
        }
    }
}

fn settle_at_end(current: &Node, input: Input) -> Settlement {
    Settlement {
        from: current.full_name().to_string(),
        path: END.to_string(),
        input,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::START;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn host() -> (Arc<MemoryStore>, Arc<dyn MachineHost>) {
        let store = Arc::new(MemoryStore::new());
        let host: Arc<dyn MachineHost> = store.clone();
        (store, host)
    }

    fn at(path: &str) -> MachineRuntimeState {
        MachineRuntimeState {
            current_path: path.to_string(),
            ..MachineRuntimeState::new()
        }
    }

    fn settled_path(step: Step) -> String {
        match step {
            Step::Settled(settlement) => settlement.path,
            other => panic!("Expected settled step, got {other:?}"),
        }
    }

    #[test]
    fn unknown_current_path_is_fatal() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").noop()]).unwrap();
        let (_, host) = host();

        let result = engine.handle_input(&"m".into(), &at("Gone"), Input::from("x"), &host);

        assert!(matches!(result, Err(EngineError::UnknownState { .. })));
    }

    #[test]
    fn input_at_end_is_ignored_without_running_actions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = TransitionEngine::new(&[NodeSpec::new("A").action(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            ActionOutcome::Immediate
        })])
        .unwrap();
        let (_, host) = host();

        let step = engine
            .handle_input(&"m".into(), &at(END), Input::from("x"), &host)
            .unwrap();

        assert!(matches!(step, Step::Ignored));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn leaf_settles_at_end_regardless_of_input() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").noop()]).unwrap();
        let (_, host) = host();

        for input in [Input::from("x"), Input::from(7)] {
            let step = engine
                .handle_input(&"m".into(), &at("A"), input, &host)
                .unwrap();
            assert_eq!(settled_path(step), END);
        }
    }

    #[test]
    fn dangling_next_settles_at_end() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").noop().next("Nowhere")]).unwrap();
        let (_, host) = host();

        let step = engine
            .handle_input(&"m".into(), &at("A"), Input::from("x"), &host)
            .unwrap();

        assert_eq!(settled_path(step), END);
    }

    #[test]
    fn unmatched_input_is_fatal() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A")
            .noop()
            .child(NodeSpec::new("B").accepts("b").noop())])
        .unwrap();
        let (_, host) = host();

        let error = engine
            .handle_input(&"m".into(), &at("A"), Input::from("z"), &host)
            .unwrap_err();

        assert_eq!(
            error,
            EngineError::NoValidSuccessor {
                key: "m".into(),
                path: "A".into(),
                input: Input::from("z"),
            }
        );
    }

    #[test]
    fn immediate_action_settles_on_successor() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").noop()]).unwrap();
        let (_, host) = host();

        let step = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap();

        match step {
            Step::Settled(settlement) => {
                assert_eq!(settlement.from, START);
                assert_eq!(settlement.path, "A");
                assert_eq!(settlement.input, Input::from("go"));
                assert!(settlement.error.is_none());
            }
            other => panic!("Expected settled step, got {other:?}"),
        }
    }

    #[test]
    fn action_sees_context() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").action(|ctx| {
            ctx.dispatch(serde_json::json!({
                "path": ctx.path(),
                "input": ctx.input().as_text(),
                "from": ctx.state().map(|s| s.current_path),
            }));
            ActionOutcome::Immediate
        })])
        .unwrap();
        let (store, host) = host();
        let key = store.create("m");

        engine
            .handle_input(&key, &at(START), Input::from("go"), &host)
            .unwrap();

        let results = store.results(&key);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].payload,
            serde_json::json!({"path": "A", "input": "go", "from": "START"})
        );
    }

    #[tokio::test]
    async fn deferred_action_is_pending_until_awaited() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A")
            .deferred(|_| async { Ok(()) })
            .next("A")])
        .unwrap();
        let (_, host) = host();

        let step = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap();
        let Step::Pending(pending) = step else {
            panic!("Expected pending step");
        };
        assert_eq!(pending.path(), "A");

        let settlement = pending.wait().await;
        assert_eq!(settlement.path, "A");
        assert!(settlement.error.is_none());
    }

    #[tokio::test]
    async fn failed_action_without_on_error_settles_as_success() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A")
            .deferred(|_| async { Err(ActionError::failed("boom")) })])
        .unwrap();
        let (_, host) = host();

        let Step::Pending(pending) = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap()
        else {
            panic!("Expected pending step");
        };
        let settlement = pending.wait().await;

        assert_eq!(settlement.path, "A");
        assert_eq!(settlement.error, Some(ActionError::failed("boom")));
    }

    #[tokio::test]
    async fn failed_action_routes_to_on_error() {
        let engine = TransitionEngine::new(&[
            NodeSpec::new("A")
                .deferred(|_| async { Err(ActionError::failed("boom")) })
                .on_error("Failed"),
            NodeSpec::new("Failed").noop(),
        ])
        .unwrap();
        let (_, host) = host();

        let Step::Pending(pending) = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap()
        else {
            panic!("Expected pending step");
        };

        assert_eq!(pending.wait().await.path, "Failed");
    }

    #[tokio::test]
    async fn dangling_on_error_routes_to_end() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A")
            .deferred(|_| async { Err(ActionError::failed("boom")) })
            .on_error("Missing")])
        .unwrap();
        let (_, host) = host();

        let Step::Pending(pending) = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap()
        else {
            panic!("Expected pending step");
        };

        assert_eq!(pending.wait().await.path, END);
    }

    #[tokio::test]
    async fn panicking_action_still_settles() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").deferred(|_| async {
            let explode = true;
            if explode {
                panic!("action blew up");
            }
            Ok(())
        })])
        .unwrap();
        let (_, host) = host();

        let Step::Pending(pending) = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap()
        else {
            panic!("Expected pending step");
        };
        let settlement = pending.wait().await;

        assert_eq!(settlement.path, "A");
        assert_eq!(
            settlement.error,
            Some(ActionError::Panicked("action blew up".into()))
        );
    }

    #[test]
    fn panicking_synchronous_action_is_reported() {
        let engine = TransitionEngine::new(&[NodeSpec::new("A").action(|_| {
            let explode = true;
            if explode {
                panic!("sync blew up");
            }
            ActionOutcome::Immediate
        })])
        .unwrap();
        let (_, host) = host();

        let error = engine
            .handle_input(&"m".into(), &at(START), Input::from("go"), &host)
            .unwrap_err();

        assert_eq!(
            error,
            EngineError::ActionPanicked {
                key: "m".into(),
                path: "A".into(),
                message: "sync blew up".into(),
            }
        );
    }

    #[test]
    fn deferred_state_without_runtime_is_rejected_before_its_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = TransitionEngine::new(&[NodeSpec::new("A").deferred(move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.dispatch("started");
            async { Ok(()) }
        })])
        .unwrap();
        let (store, host) = host();
        let key = store.create("m");

        let error = engine
            .handle_input(&key, &at(START), Input::from("go"), &host)
            .unwrap_err();

        assert_eq!(error, EngineError::NoRuntime { path: "A".into() });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.results(&key).is_empty());
    }

    #[tokio::test]
    async fn effect_runs_with_the_entering_context() {
        use stillwater::effect::prelude::*;

        let engine = TransitionEngine::new(&[NodeSpec::new("A").effect(|| {
            from_fn(|ctx: &ActionContext| {
                ctx.dispatch(ctx.input().as_text().into_owned());
                Ok::<_, ActionError>(())
            })
        })])
        .unwrap();
        let (store, host) = host();
        let key = store.create("m");

        let Step::Pending(pending) = engine
            .handle_input(&key, &at(START), Input::from("hello"), &host)
            .unwrap()
        else {
            panic!("Expected pending step");
        };
        assert!(store.results(&key).is_empty());

        let settlement = pending.wait().await;
        assert_eq!(settlement.path, "A");
        assert_eq!(store.results(&key)[0].payload, serde_json::json!("hello"));
    }
}
