//! Input tokens fed to a machine.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// An opaque, atomic input token.
///
/// Inputs are compared strictly: a text token never equals a number token,
/// even when their text forms coincide.
///
/// # Example
///
/// ```rust
/// use treefsm::core::Input;
///
/// let text = Input::from("caaaab");
/// let number = Input::from(3);
///
/// assert_eq!(text.as_text(), "caaaab");
/// assert_eq!(number.as_text(), "3");
/// assert_ne!(Input::from("3"), number);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Input {
    Text(String),
    Number(f64),
}

impl Input {
    /// Text form of the token, used by pattern matchers.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Number(number) => Cow::Owned(number.to_string()),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<char> for Input {
    fn from(c: char) -> Self {
        Self::Text(c.to_string())
    }
}

impl From<f64> for Input {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<i32> for Input {
    fn from(number: i32) -> Self {
        Self::Number(f64::from(number))
    }
}
