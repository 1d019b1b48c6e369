//! Checkpoint and resume for machine sessions.
//!
//! A checkpoint captures one machine's runtime state and history so a
//! host can persist it and resume the session after a restart. Actions
//! are not part of a checkpoint; the session resumes against an engine
//! built from the same description.

use crate::core::{Index, MachineKey, MachineRuntimeState, TransitionHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one machine session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub key: MachineKey,

    pub state: MachineRuntimeState,

    pub history: TransitionHistory,
}

impl Checkpoint {
    pub fn new(key: MachineKey, state: MachineRuntimeState, history: TransitionHistory) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            key,
            state,
            history,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Check that the session can resume against `index`.
    ///
    /// The current path must exist, and nothing may have been in flight
    /// when the checkpoint was taken: a deferred action cannot be resumed.
    pub fn validate_against(&self, index: &Index) -> Result<(), CheckpointError> {
        if !index.contains(&self.state.current_path) {
            return Err(CheckpointError::UnknownPath {
                path: self.state.current_path.clone(),
            });
        }
        if !self.state.is_idle() {
            return Err(CheckpointError::InFlight {
                key: self.key.clone(),
                buffered: self.state.input_buffer.len(),
            });
        }
        Ok(())
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version == CHECKPOINT_VERSION {
            Ok(())
        } else {
            Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            })
        }
    }
}
