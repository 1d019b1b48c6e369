//! Checkpoint error types.

use crate::core::MachineKey;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The checkpointed path does not exist in the engine's index
    #[error("Checkpoint rests on unknown state '{path}'")]
    UnknownPath { path: String },

    #[error("Checkpoint of '{key}' was taken mid-transition ({buffered} buffered input(s))")]
    InFlight { key: MachineKey, buffered: usize },
}
