//! Acceptance rules deciding which child a given input selects.
//!
//! Matchers are pure: evaluating one never has side effects, so the
//! resolver may evaluate them in any context.

use super::input::Input;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Input) -> bool + Send + Sync>;

/// Pure rule that decides whether an input selects a node.
///
/// A node without a matcher is a wildcard and accepts any input.
///
/// # Example
///
/// ```rust
/// use treefsm::core::{Input, Matcher};
///
/// let literal = Matcher::text("c");
/// let pattern = Matcher::pattern("c.*b").unwrap();
/// let even = Matcher::predicate(|input: &Input| {
///     matches!(input, Input::Number(n) if n % 2.0 == 0.0)
/// });
///
/// assert!(literal.accepts(&Input::from("c")));
/// assert!(!literal.accepts(&Input::from("caaaab")));
/// assert!(pattern.accepts(&Input::from("caaaab")));
/// assert!(even.accepts(&Input::from(4)));
/// ```
#[derive(Clone)]
pub enum Matcher {
    /// Strictly equal to a text input.
    Text(String),
    /// Strictly equal to a number input.
    Number(f64),
    /// Unanchored search over the input's text form.
    Pattern(Regex),
    Predicate(Predicate),
}

impl Matcher {
    pub fn text(literal: impl Into<String>) -> Self {
        Self::Text(literal.into())
    }

    pub fn number(literal: impl Into<f64>) -> Self {
        Self::Number(literal.into())
    }

    /// Compile a pattern matcher.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Create a matcher from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Input) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Check whether this matcher accepts the input.
    pub fn accepts(&self, input: &Input) -> bool {
        match (self, input) {
            (Self::Text(literal), Input::Text(text)) => literal == text,
            (Self::Number(literal), Input::Number(number)) => literal == number,
            (Self::Text(_), _) | (Self::Number(_), _) => false,
            (Self::Pattern(regex), input) => regex.is_match(&input.as_text()),
            (Self::Predicate(predicate), input) => predicate(input),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(literal) => f.debug_tuple("Text").field(literal).finish(),
            Self::Number(literal) => f.debug_tuple("Number").field(literal).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Matcher {
    fn from(literal: &str) -> Self {
        Self::text(literal)
    }
}

impl From<f64> for Matcher {
    fn from(literal: f64) -> Self {
        Self::Number(literal)
    }
}

impl From<i32> for Matcher {
    fn from(literal: i32) -> Self {
        Self::Number(f64::from(literal))
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}
