//! Capabilities the host lends to the engine.

use crate::core::{MachineEvent, MachineKey, MachineRuntimeState};

/// State accessor and result dispatch supplied by the host.
///
/// The host owns every machine's [`MachineRuntimeState`]; the engine
/// only reads it and emits events describing how it changes.
/// `dispatch` must fold the event in (typically with
/// [`MachineRuntimeState::apply`]) before returning, so that a following
/// `runtime_state` call observes it.
///
/// Implementations must not submit input to a machine from inside
/// `dispatch`; the engine holds that machine's gate while dispatching.
pub trait MachineHost: Send + Sync {
    /// Current runtime state of `key`, or `None` when no session exists.
    fn runtime_state(&self, key: &MachineKey) -> Option<MachineRuntimeState>;

    /// Deliver one output event for `key`.
    fn dispatch(&self, key: &MachineKey, event: MachineEvent);
}
