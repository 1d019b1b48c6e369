//! In-memory reference host.
//!
//! [`MemoryStore`] keeps one session per machine key and folds every
//! engine event into it with the pure reducer. It is what tests and
//! simple embeddings use; real hosts implement
//! [`MachineHost`](crate::effects::MachineHost) over their own store.

use crate::checkpoint::Checkpoint;
use crate::config::StoreConfig;
use crate::core::{MachineEvent, MachineKey, MachineRuntimeState, TransitionHistory, TransitionRecord};
use crate::effects::MachineHost;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A result an action dispatched through its context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub path: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
struct Session {
    state: MachineRuntimeState,
    history: TransitionHistory,
    results: Vec<ActionRecord>,
}

/// Thread-safe session store implementing [`MachineHost`].
pub struct MemoryStore {
    sessions: DashMap<MachineKey, Session>,
    config: StoreConfig,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Start a fresh session at `START`, replacing any existing one.
    pub fn create(&self, key: impl Into<MachineKey>) -> MachineKey {
        let key = key.into();
        self.sessions.insert(key.clone(), Session::default());
        key
    }

    /// Discard a session, returning its final runtime state.
    pub fn remove(&self, key: &MachineKey) -> Option<MachineRuntimeState> {
        self.sessions.remove(key).map(|(_, session)| session.state)
    }

    pub fn state(&self, key: &MachineKey) -> Option<MachineRuntimeState> {
        self.sessions.get(key).map(|session| session.state.clone())
    }

    pub fn history(&self, key: &MachineKey) -> Option<TransitionHistory> {
        self.sessions.get(key).map(|session| session.history.clone())
    }

    /// Results dispatched by actions, in dispatch order.
    pub fn results(&self, key: &MachineKey) -> Vec<ActionRecord> {
        self.sessions
            .get(key)
            .map(|session| session.results.clone())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<MachineKey> {
        let mut keys: Vec<_> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Snapshot a session's runtime state and history.
    pub fn checkpoint(&self, key: &MachineKey) -> Option<Checkpoint> {
        self.sessions
            .get(key)
            .map(|session| Checkpoint::new(key.clone(), session.state.clone(), session.history.clone()))
    }

    /// Recreate a session from a checkpoint, replacing any existing one.
    ///
    /// Validate the checkpoint against the engine's index first with
    /// [`Checkpoint::validate_against`].
    pub fn restore(&self, checkpoint: Checkpoint) -> MachineKey {
        let key = checkpoint.key.clone();
        self.sessions.insert(
            key.clone(),
            Session {
                state: checkpoint.state,
                history: checkpoint.history,
                results: Vec::new(),
            },
        );
        key
    }
}

impl MachineHost for MemoryStore {
    fn runtime_state(&self, key: &MachineKey) -> Option<MachineRuntimeState> {
        self.state(key)
    }

    fn dispatch(&self, key: &MachineKey, event: MachineEvent) {
        let Some(mut session) = self.sessions.get_mut(key) else {
            tracing::warn!(machine = %key, event = event.kind(), "Event for unknown session dropped");
            return;
        };

        match &event {
            MachineEvent::Settled { from, path, input } if self.config.record_history => {
                let history = session.history.record(TransitionRecord {
                    from: from.clone(),
                    to: path.clone(),
                    input: input.clone(),
                    timestamp: Utc::now(),
                });
                session.history = match self.config.history_limit {
                    Some(limit) => history.truncated(limit),
                    None => history,
                };
            }
            MachineEvent::ActionResult { path, payload } => {
                session.results.push(ActionRecord {
                    path: path.clone(),
                    payload: payload.clone(),
                    timestamp: Utc::now(),
                });
            }
            _ => {}
        }

        session.state = session.state.apply(&event);
    }
}
