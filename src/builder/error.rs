//! Construction errors for state descriptions.

use thiserror::Error;

/// One defect found in a state description.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DescriptionError {
    #[error("State under '{parent}' has an empty name")]
    EmptyName { parent: String },

    #[error("State name '{name}' must not contain '.'")]
    InvalidName { name: String },

    #[error("Top-level state name '{name}' is reserved")]
    ReservedName { name: String },

    #[error("Duplicate state path '{path}'")]
    DuplicatePath { path: String },

    #[error("State '{path}' has no action. Call .action(..), .deferred(..) or .noop()")]
    MissingAction { path: String },

    #[error("State '{from}' references unknown path '{target}'")]
    DanglingReference { from: String, target: String },
}

/// A description that cannot be compiled, with every defect found.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid state description: {summary}")]
pub struct BuildError {
    errors: Vec<DescriptionError>,
    summary: String,
}

impl BuildError {
    pub fn new(errors: Vec<DescriptionError>) -> Self {
        let summary = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self { errors, summary }
    }

    /// Defects in the order they were found (depth-first).
    pub fn errors(&self) -> &[DescriptionError] {
        &self.errors
    }
}
