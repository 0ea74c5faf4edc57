use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Byte range of a token or node in the notation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Zero-width span at a position (end of input, empty groups)
    pub fn point(pos: usize) -> Self {
        Span::new(pos, pos)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn merge(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The covered source text, if the span fits inside `source`
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.to_range())
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let merged = Span::new(4, 6).merge(Span::new(0, 2));
        assert_eq!(merged, Span::new(0, 6));
        assert_eq!(merged.len(), 6);
    }

    #[test]
    fn test_span_text() {
        let source = "0 [3 5]";
        assert_eq!(Span::new(2, 7).text(source), Some("[3 5]"));
        assert_eq!(Span::new(5, 20).text(source), None);
        assert!(Span::point(7).is_empty());
    }
}
