//! Fluent description of one state and its subtree.

use crate::core::Matcher;
use crate::effects::{Action, ActionContext, ActionError, ActionOutcome};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::Effect;

/// Declarative description of a state.
///
/// Descriptions are plain values: building an index borrows them and never
/// writes back, so one description can back any number of engines.
///
/// # Example
///
/// ```rust
/// use treefsm::builder::NodeSpec;
/// use treefsm::core::Matcher;
/// use treefsm::effects::ActionOutcome;
///
/// let description = vec![NodeSpec::new("A")
///     .noop()
///     .child(NodeSpec::new("B").accepts("c").noop())
///     .child(
///         NodeSpec::new("C")
///             .accepts(Matcher::pattern("c.*b").unwrap())
///             .action(|ctx| {
///                 ctx.dispatch("c");
///                 ActionOutcome::Immediate
///             })
///             .next("A"),
///     )];
///
/// assert_eq!(description[0].child_specs().len(), 2);
/// ```
#[derive(Clone)]
pub struct NodeSpec {
    pub(crate) name: String,
    pub(crate) accepts: Option<Matcher>,
    pub(crate) action: Option<Action>,
    pub(crate) deferred: bool,
    pub(crate) children: Vec<NodeSpec>,
    pub(crate) next: Option<String>,
    pub(crate) on_error: Option<String>,
}

impl NodeSpec {
    /// Start describing a state. Names must be unique among siblings and
    /// must not contain `.`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accepts: None,
            action: None,
            deferred: false,
            children: Vec::new(),
            next: None,
            on_error: None,
        }
    }

    /// Only enter this state for inputs the matcher accepts.
    /// Without a matcher the state accepts any input.
    pub fn accepts(mut self, matcher: impl Into<Matcher>) -> Self {
        self.accepts = Some(matcher.into());
        self
    }

    /// Set the action run on entry (required).
    ///
    /// Prefer [`deferred`](Self::deferred) or [`effect`](Self::effect) for
    /// asynchronous work, so a missing runtime is caught before the action
    /// runs.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&ActionContext) -> ActionOutcome + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self.deferred = false;
        self
    }

    /// Set an asynchronous action; the transition settles when the
    /// returned future resolves.
    pub fn deferred<F, Fut>(self, action: F) -> Self
    where
        F: Fn(&ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        let mut spec = self.action(move |ctx| ActionOutcome::deferred(action(ctx)));
        spec.deferred = true;
        spec
    }

    /// Set an effectful action. The factory builds a fresh effect on every
    /// entry; it runs with the state's [`ActionContext`] as environment.
    pub fn effect<F, Eff>(self, factory: F) -> Self
    where
        F: Fn() -> Eff + Send + Sync + 'static,
        Eff: Effect<Output = (), Error = ActionError, Env = ActionContext> + 'static,
    {
        let mut spec = self.action(move |_| ActionOutcome::effect(factory()));
        spec.deferred = true;
        spec
    }

    /// Set an action that does nothing.
    pub fn noop(self) -> Self {
        self.action(|_| ActionOutcome::Immediate)
    }

    /// Append a child; declaration order is matching precedence.
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Always move to the state at this full path, ignoring the input.
    pub fn next(mut self, path: impl Into<String>) -> Self {
        self.next = Some(path.into());
        self
    }

    /// Settle on this full path when the deferred action fails.
    pub fn on_error(mut self, path: impl Into<String>) -> Self {
        self.on_error = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn child_specs(&self) -> &[NodeSpec] {
        &self.children
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("accepts", &self.accepts)
            .field("has_action", &self.action.is_some())
            .field("deferred", &self.deferred)
            .field("children", &self.children)
            .field("next", &self.next)
            .field("on_error", &self.on_error)
            .finish()
    }
}
