use crate::span::Span;
use serde::{Deserialize, Serialize};
use trapcycle_core::Fraction;

/// Abstract Syntax Tree for mini notation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ast {
    Atom(AtomNode),
    Pattern(PatternNode),
    Element(ElementNode),
}

impl Ast {
    pub fn span(&self) -> Span {
        match self {
            Ast::Atom(node) => node.span,
            Ast::Pattern(node) => node.span,
            Ast::Element(node) => node.span,
        }
    }

    /// An empty sequence, which evaluates to silence
    pub fn empty(span: Span) -> Self {
        Ast::Pattern(PatternNode::new(Vec::new(), Alignment::Sequence, span))
    }
}

/// Atom - a leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomNode {
    pub value: AtomValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AtomValue {
    /// Bare number: a scale degree or semitone offset
    Number(f64),
    /// Note name with its resolved pitch
    Note { name: String, pitch: i32 },
    /// `~` or `-`
    Silence,
}

impl AtomNode {
    pub fn new(value: AtomValue, span: Span) -> Self {
        AtomNode { value, span }
    }

    pub fn number(n: f64, span: Span) -> Self {
        AtomNode::new(AtomValue::Number(n), span)
    }

    pub fn note(name: impl Into<String>, pitch: i32, span: Span) -> Self {
        AtomNode::new(
            AtomValue::Note {
                name: name.into(),
                pitch,
            },
            span,
        )
    }

    pub fn silence(span: Span) -> Self {
        AtomNode::new(AtomValue::Silence, span)
    }
}

/// Pattern - a composite pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternNode {
    pub children: Vec<Ast>,
    pub alignment: Alignment,
    pub span: Span,
}

impl PatternNode {
    pub fn new(children: Vec<Ast>, alignment: Alignment, span: Span) -> Self {
        PatternNode {
            children,
            alignment,
            span,
        }
    }
}

/// How the children of a pattern node share time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    /// Space separated: children subdivide the cycle by weight
    Sequence,
    /// Comma separated: children play at once
    Stack,
    /// `<...>`: one child per cycle
    Slowcat,
}

/// Element - an atom or group with its modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub source: Box<Ast>,
    /// Applied in source order
    pub ops: Vec<SliceOp>,
    /// Relative share of its sequence slot
    pub weight: i64,
    /// Copies of this element inside `<...>`; 0 removes it
    pub reps: usize,
    pub span: Span,
}

impl ElementNode {
    pub fn new(source: Ast, span: Span) -> Self {
        ElementNode {
            source: Box::new(source),
            ops: Vec::new(),
            weight: 1,
            reps: 1,
            span,
        }
    }

    pub fn add_op(&mut self, op: SliceOp) {
        self.ops.push(op);
    }
}

/// Slice operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SliceOp {
    /// `*n` or `/n`
    Stretch {
        amount: Fraction,
        op_type: StretchType,
    },
    /// `!n` in a sequence: repeat within the slot
    Replicate { amount: i64 },
    /// `?p`: keep with probability `keep`
    DegradeBy { keep: f64, seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StretchType {
    Fast, // *
    Slow, // /
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_creation() {
        let atom = AtomNode::note("c4", 60, Span::new(0, 2));
        assert_eq!(
            atom.value,
            AtomValue::Note {
                name: "c4".to_string(),
                pitch: 60
            }
        );
        assert_eq!(atom.span, Span::new(0, 2));
    }

    #[test]
    fn test_element_defaults() {
        let atom = Ast::Atom(AtomNode::number(3.0, Span::new(0, 1)));
        let element = ElementNode::new(atom, Span::new(0, 1));
        assert_eq!(element.weight, 1);
        assert_eq!(element.reps, 1);
        assert!(element.ops.is_empty());
    }

    #[test]
    fn test_empty_pattern() {
        match Ast::empty(Span::point(0)) {
            Ast::Pattern(p) => {
                assert!(p.children.is_empty());
                assert_eq!(p.alignment, Alignment::Sequence);
            }
            other => panic!("Expected Pattern, got {:?}", other),
        }
    }
}
