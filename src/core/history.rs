//! Settled-transition history.
//!
//! History is an immutable value: recording returns a new history and
//! leaves the original untouched.

use super::input::Input;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of one settled transition.
///
/// # Example
///
/// ```rust
/// use treefsm::core::{Input, TransitionRecord};
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: "START".to_string(),
///     to: "A".to_string(),
///     input: Input::from("go"),
///     timestamp: Utc::now(),
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Path the machine left
    pub from: String,
    /// Path the machine settled on
    pub to: String,
    /// Input that triggered the transition
    pub input: Input,
    /// When the transition settled
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of settled transitions.
///
/// # Example
///
/// ```rust
/// use treefsm::core::{Input, TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let history = TransitionHistory::new()
///     .record(TransitionRecord {
///         from: "START".into(),
///         to: "A".into(),
///         input: Input::from("first"),
///         timestamp: Utc::now(),
///     })
///     .record(TransitionRecord {
///         from: "A".into(),
///         to: "A.B".into(),
///         input: Input::from("c"),
///         timestamp: Utc::now(),
///     });
///
/// assert_eq!(history.get_path(), vec!["START", "A", "A.B"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: Vec<TransitionRecord>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Keep only the `limit` most recent records.
    pub fn truncated(&self, limit: usize) -> Self {
        let skip = self.records.len().saturating_sub(limit);
        Self {
            records: self.records[skip..].to_vec(),
        }
    }

    /// Paths traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&str> {
        self.records
            .first()
            .map(|first| first.from.as_str())
            .into_iter()
            .chain(self.records.iter().map(|record| record.to.as_str()))
            .collect()
    }

    /// Time between the first and last recorded transition.
    ///
    /// Returns `None` when the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
