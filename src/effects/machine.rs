//! Input admission, buffering and replay for many machines.
//!
//! [`Machine`] wires a [`TransitionEngine`] to a [`MachineHost`]. It
//! guarantees that each machine key has at most one action in flight:
//! inputs arriving while a deferred action is pending are buffered and
//! replayed oldest-first, one at a time, after it settles.

use super::host::MachineHost;
use super::transition::{EngineError, Settlement, Step, TransitionEngine};
use crate::core::{Input, MachineEvent, MachineKey, MachineRuntimeState};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// What happened to a submitted input.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    /// The transition completed; the machine rests on `path`.
    Settled { path: String },

    /// A deferred action towards `path` is in flight.
    Pending { path: String },

    /// The machine was transitioning; the input waits at `depth` in the
    /// buffer (1 = next to run).
    Buffered { depth: usize },

    /// The machine has ended; the input was discarded.
    Ignored,
}

/// Per-key coordination.
///
/// `gate` serialises every read-modify-write of the key's runtime state;
/// `busy` is true while an action is in flight or input is buffered.
struct Slot {
    gate: Mutex<()>,
    busy: watch::Sender<bool>,
}

impl Slot {
    fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            gate: Mutex::new(()),
            busy,
        }
    }
}

struct Shared {
    engine: TransitionEngine,
    host: Arc<dyn MachineHost>,
    slots: DashMap<MachineKey, Arc<Slot>>,
}

/// Drives any number of independent machines sharing one description.
///
/// Cloning is cheap and clones share coordination state.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use treefsm::builder::NodeSpec;
/// use treefsm::effects::{Machine, Submission, TransitionEngine};
/// use treefsm::store::MemoryStore;
///
/// let engine = TransitionEngine::new(&[NodeSpec::new("A").noop().next("A")]).unwrap();
/// let store = Arc::new(MemoryStore::new());
/// let machine = Machine::new(engine, store.clone());
///
/// let key = store.create("session");
/// let submission = machine.submit(&key, "go").unwrap();
///
/// assert_eq!(submission, Submission::Settled { path: "A".into() });
/// ```
#[derive(Clone)]
pub struct Machine {
    shared: Arc<Shared>,
}

impl Machine {
    pub fn new(engine: TransitionEngine, host: Arc<dyn MachineHost>) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                host,
                slots: DashMap::new(),
            }),
        }
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.shared.engine
    }

    pub fn host(&self) -> &Arc<dyn MachineHost> {
        &self.shared.host
    }

    /// Submit one input to the machine identified by `key`.
    ///
    /// While the machine is transitioning, or older input is still waiting,
    /// the input is buffered behind it. Otherwise it is handled at once; a
    /// deferred action is spawned on the current Tokio runtime and the call
    /// returns without waiting for it.
    ///
    /// Actions run while the key's gate is held, so an action must never
    /// submit input to its own machine synchronously.
    pub fn submit(
        &self,
        key: &MachineKey,
        input: impl Into<Input>,
    ) -> Result<Submission, EngineError> {
        let input = input.into();
        let slot = self.shared.slot(key);
        let _gate = slot.gate.lock();

        let state = self
            .shared
            .host
            .runtime_state(key)
            .ok_or_else(|| EngineError::UnknownMachine { key: key.clone() })?;

        if state.transitioning || !state.input_buffer.is_empty() {
            let submission = self.shared.buffer(key, &slot, &state, input);
            if !state.transitioning {
                self.shared.drain(key, &slot);
            }
            return Ok(submission);
        }

        let submission = self.shared.advance(key, &slot, &state, input)?;
        if !matches!(submission, Submission::Pending { .. }) {
            self.shared.drain(key, &slot);
        }
        Ok(submission)
    }

    /// Wait until `key` has no action in flight and an empty buffer.
    ///
    /// Returns at once for keys this machine has never seen.
    pub async fn idle(&self, key: &MachineKey) {
        let Some(mut busy) = self.shared.slots.get(key).map(|slot| slot.busy.subscribe()) else {
            return;
        };
        // A closed channel means the slot was released, which only happens once idle.
        let _ = busy.wait_for(|busy| !*busy).await;
    }

    pub fn is_busy(&self, key: &MachineKey) -> bool {
        self.shared
            .slots
            .get(key)
            .is_some_and(|slot| *slot.busy.borrow())
    }

    /// Number of keys with coordination state.
    ///
    /// Slots are released when a settle or drain finds the session gone.
    pub fn tracked_keys(&self) -> usize {
        self.shared.slots.len()
    }

    /// Drop coordination state for a key whose session the host discarded.
    ///
    /// Needed only for idle keys; busy keys release their slot themselves.
    pub fn forget(&self, key: &MachineKey) {
        if let Some((_, slot)) = self.shared.slots.remove(key) {
            slot.busy.send_replace(false);
        }
    }
}

impl Shared {
    fn slot(&self, key: &MachineKey) -> Arc<Slot> {
        Arc::clone(
            &*self
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    fn buffer(
        &self,
        key: &MachineKey,
        slot: &Slot,
        state: &MachineRuntimeState,
        input: Input,
    ) -> Submission {
        let mut buffer: Vec<Input> = state.input_buffer.iter().cloned().collect();
        buffer.push(input);
        let depth = buffer.len();

        tracing::debug!(machine = %key, depth, "Machine transitioning; input buffered");
        self.host.dispatch(key, MachineEvent::BufferUpdated { buffer });
        slot.busy.send_replace(true);

        Submission::Buffered { depth }
    }

    /// Handle one input for an idle machine. Caller holds the gate.
    fn advance(
        self: &Arc<Self>,
        key: &MachineKey,
        slot: &Slot,
        state: &MachineRuntimeState,
        input: Input,
    ) -> Result<Submission, EngineError> {
        let runtime = Handle::try_current().ok();

        match self.engine.handle_input(key, state, input, &self.host)? {
            Step::Ignored => Ok(Submission::Ignored),
            Step::Settled(settlement) => {
                self.host.dispatch(key, settlement.event());
                Ok(Submission::Settled {
                    path: settlement.path,
                })
            }
            Step::Pending(pending) => {
                let path = pending.path().to_string();
                let runtime = runtime.ok_or_else(|| EngineError::NoRuntime { path: path.clone() })?;

                self.host
                    .dispatch(key, MachineEvent::Transitioning { path: path.clone() });
                slot.busy.send_replace(true);

                let shared = Arc::clone(self);
                let key = key.clone();
                runtime.spawn(async move {
                    let settlement = pending.wait().await;
                    shared.settle(&key, settlement);
                });

                Ok(Submission::Pending { path })
            }
        }
    }

    fn release(&self, key: &MachineKey, slot: &Arc<Slot>) {
        self.slots.remove_if(key, |_, current| Arc::ptr_eq(current, slot));
        slot.busy.send_replace(false);
    }

    /// Complete a pending transition and replay buffered input.
    fn settle(self: &Arc<Self>, key: &MachineKey, settlement: Settlement) {
        let slot = self.slot(key);
        let _gate = slot.gate.lock();

        if self.host.runtime_state(key).is_none() {
            tracing::debug!(machine = %key, "Session discarded before settle");
            self.release(key, &slot);
            return;
        }

        tracing::debug!(machine = %key, path = %settlement.path, "Transition settled");
        self.host.dispatch(key, settlement.event());
        self.drain(key, &slot);
    }

    /// Replay buffered inputs oldest-first until the buffer is empty or
    /// a deferred action starts. Caller holds the gate.
    fn drain(self: &Arc<Self>, key: &MachineKey, slot: &Arc<Slot>) {
        loop {
            let Some(state) = self.host.runtime_state(key) else {
                self.release(key, slot);
                return;
            };
            if state.transitioning {
                return;
            }

            let mut buffer = state.input_buffer.clone();
            let Some(input) = buffer.pop_front() else {
                slot.busy.send_replace(false);
                return;
            };

            self.host.dispatch(
                key,
                MachineEvent::BufferUpdated {
                    buffer: buffer.iter().cloned().collect(),
                },
            );
            let state = MachineRuntimeState {
                input_buffer: buffer,
                ..state
            };

            match self.advance(key, slot, &state, input) {
                Ok(Submission::Pending { .. }) => return,
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(machine = %key, error = %error, "Buffered input rejected");
                }
            }
        }
    }
}
