use crate::span::Span;
use std::fmt;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Syntax error in a notation string
///
/// Every variant that points at source text carries the byte [`Span`] of the
/// offending token.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    UnexpectedEof {
        expected: String,
        pos: usize,
    },
    UnclosedDelimiter {
        delimiter: char,
        open_span: Span,
    },
    InvalidNumber {
        value: String,
        span: Span,
    },
    InvalidNote {
        value: String,
        span: Span,
    },
}

impl ParseError {
    pub fn unexpected_token(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, pos: usize) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            pos,
        }
    }

    pub fn unclosed_delimiter(delimiter: char, open_span: Span) -> Self {
        ParseError::UnclosedDelimiter { delimiter, open_span }
    }

    pub fn invalid_number(value: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidNumber {
            value: value.into(),
            span,
        }
    }

    pub fn invalid_note(value: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidNote {
            value: value.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { pos, .. } => Span::point(*pos),
            ParseError::UnclosedDelimiter { open_span, .. } => *open_span,
            ParseError::InvalidNumber { span, .. } => *span,
            ParseError::InvalidNote { span, .. } => *span,
        }
    }

    /// Source text of the offending token, if there is one
    pub fn found(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedToken { found, .. } => Some(found),
            ParseError::InvalidNumber { value, .. } => Some(value),
            ParseError::InvalidNote { value, .. } => Some(value),
            ParseError::UnexpectedEof { .. } | ParseError::UnclosedDelimiter { .. } => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, span } => {
                write!(f, "Expected {}, found '{}' at {}", expected, found, span)
            }
            ParseError::UnexpectedEof { expected, pos } => {
                write!(f, "Unexpected end of input at {}, expected {}", pos, expected)
            }
            ParseError::UnclosedDelimiter { delimiter, open_span } => {
                write!(f, "Unclosed delimiter '{}' opened at {}", delimiter, open_span)
            }
            ParseError::InvalidNumber { value, span } => {
                write!(f, "Invalid number '{}' at {}", value, span)
            }
            ParseError::InvalidNote { value, span } => {
                write!(f, "Invalid note '{}' at {}", value, span)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_token_and_position() {
        let err = ParseError::unexpected_token("number", "x", Span::new(2, 3));
        assert_eq!(err.to_string(), "Expected number, found 'x' at 2..3");
        assert_eq!(err.found(), Some("x"));
        assert_eq!(err.span(), Span::new(2, 3));
    }

    #[test]
    fn test_eof_span_is_a_point() {
        let err = ParseError::unexpected_eof("number", 4);
        assert_eq!(err.span(), Span::point(4));
        assert_eq!(err.found(), None);
    }
}
