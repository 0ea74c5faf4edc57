use thiserror::Error;

/// Errors raised by exact time arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("Zero denominator in rational time")]
    ZeroDenominator,

    #[error("Rational time overflowed 64 bits")]
    Overflow,

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Errors raised while reading a note name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error("Invalid note name: {0}")]
    InvalidName(String),

    #[error("Invalid octave in note name: {0}")]
    InvalidOctave(String),
}

/// Errors raised while building a scale
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("Unknown scale: {name}. Available: [{available}]")]
    UnknownScale { name: String, available: String },

    #[error("Invalid scale root: {0}")]
    InvalidRoot(#[from] NoteError),

    #[error("Scale has no intervals")]
    Empty,
}
