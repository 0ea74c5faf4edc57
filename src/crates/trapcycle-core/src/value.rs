use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal pitch written as a note name (`c4`, `f#3`)
///
/// Kept distinct from plain numbers so the final pitch resolver can tell an
/// absolute pitch apart from a scale degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsoluteNote(pub i32);

impl AbsoluteNote {
    pub fn pitch(self) -> i32 {
        self.0
    }
}

impl fmt::Display for AbsoluteNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note({})", self.0)
    }
}

/// Represents a value carried by a pattern event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Scale degree, or semitone offset when no scale is configured
    Number(f64),
    /// Absolute pitch from a note name
    Note(AbsoluteNote),
    /// Rest
    Rest,
}

impl Value {
    /// Check if this value is a rest
    pub fn is_rest(&self) -> bool {
        matches!(self, Value::Rest)
    }

    /// Try to extract a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to extract an absolute note
    pub fn as_note(&self) -> Option<AbsoluteNote> {
        match self {
            Value::Note(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Note(n) => write!(f, "{}", n),
            Value::Rest => write!(f, "~"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<AbsoluteNote> for Value {
    fn from(n: AbsoluteNote) -> Self {
        Value::Note(n)
    }
}
