//! Configuration values passed explicitly to engines and stores.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine construction options.
///
/// # Example
///
/// ```rust
/// use treefsm::config::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "strict_references": true }"#).unwrap();
/// assert!(config.strict_references);
/// assert_eq!(config, EngineConfig::default().with_strict_references(true));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject descriptions whose `next` or `on_error` targets do not
    /// exist, instead of routing them to `END` at runtime.
    pub strict_references: bool,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}

/// Options for [`MemoryStore`](crate::store::MemoryStore).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Keep a transition history per session
    pub record_history: bool,

    /// Most recent transitions kept per session; unbounded when `None`
    pub history_limit: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            history_limit: None,
        }
    }
}

impl StoreConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let engine = EngineConfig::from_json("{}").unwrap();
        let store = StoreConfig::from_json(r#"{ "history_limit": 10 }"#).unwrap();

        assert!(!engine.strict_references);
        assert!(store.record_history);
        assert_eq!(store.history_limit, Some(10));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let result = StoreConfig::from_json(r#"{ "record_history": "yes" }"#);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn setters_chain() {
        let config = StoreConfig::default()
            .with_history(false)
            .with_history_limit(3);

        assert!(!config.record_history);
        assert_eq!(config.history_limit, Some(3));
    }
}
