use crate::ast::*;
use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Token};
use crate::span::Span;
use trapcycle_core::note::{note_to_midi, DEFAULT_OCTAVE};
use trapcycle_core::Fraction;

/// Keep-probability for a bare `?`
pub const DEFAULT_KEEP_PROBABILITY: f64 = 0.5;

/// Parser for mini notation
///
/// One method per grammar rule:
///
/// ```text
/// pattern  ::= layer (',' layer)*
/// layer    ::= element*
/// element  ::= atom modifier*
/// modifier ::= '*' NUM | '/' NUM | '@' NUM | '!' NUM | '?' NUM?
/// atom     ::= NUM | NOTE | '~' | '-' | '[' pattern ']' | '<' element* '>'
/// ```
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    seed_counter: u64,
}

impl<'source> Parser<'source> {
    /// Create a new parser from source code
    pub fn new(source: &'source str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            seed_counter: 0,
        }
    }

    /// Parse the whole input; leftover tokens are an error
    pub fn parse_all(&mut self) -> Result<Ast> {
        if self.peek().is_none() {
            return Ok(Ast::empty(Span::point(0)));
        }

        let ast = self.parse_pattern()?;

        match self.next() {
            None => Ok(ast),
            Some((_, span)) => Err(ParseError::unexpected_token(
                "end of input",
                self.lexer.slice(span),
                span,
            )),
        }
    }

    /// Parse comma separated layers
    fn parse_pattern(&mut self) -> Result<Ast> {
        let first = self.parse_layer()?;

        if !matches!(self.peek(), Some((Token::Comma, _))) {
            return Ok(first);
        }

        let mut layers = vec![first];
        while let Some((Token::Comma, _)) = self.peek() {
            self.next(); // consume separator
            layers.push(self.parse_layer()?);
        }

        let span = layers[0].span().merge(layers[layers.len() - 1].span());
        Ok(Ast::Pattern(PatternNode::new(layers, Alignment::Stack, span)))
    }

    /// Parse a sequence of elements up to a closing delimiter or comma
    fn parse_layer(&mut self) -> Result<Ast> {
        let mut elements = Vec::new();

        while let Some((token, _)) = self.peek() {
            if token.ends_layer() {
                break;
            }
            elements.push(Ast::Element(self.parse_element(false)?));
        }

        let span = match (elements.first(), elements.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => Span::point(self.position()),
        };
        Ok(Ast::Pattern(PatternNode::new(elements, Alignment::Sequence, span)))
    }

    /// Parse an atom and the modifiers that follow it
    ///
    /// Inside `<...>` a `!n` becomes `n` copies of the element; elsewhere it
    /// repeats the element `n` times inside its own slot, weighted `n`.
    fn parse_element(&mut self, in_slowcat: bool) -> Result<ElementNode> {
        let source = self.parse_atom()?;
        let start_span = source.span();
        let mut element = ElementNode::new(source, start_span);
        let mut end_span = start_span;

        while let Some((token, span)) = self.peek() {
            if !token.is_modifier() {
                break;
            }
            self.next();
            end_span = span;

            match token {
                Token::Star | Token::Slash => {
                    let (amount, span) = self.expect_fraction()?;
                    end_span = span;
                    let op_type = if token == Token::Star {
                        StretchType::Fast
                    } else {
                        StretchType::Slow
                    };
                    element.add_op(SliceOp::Stretch { amount, op_type });
                }
                Token::At => {
                    let (n, span) = self.expect_number()?;
                    end_span = span;
                    element.weight = (n.trunc() as i64).max(0);
                }
                Token::Bang => {
                    let (n, span) = self.expect_number()?;
                    end_span = span;
                    let count = n.trunc() as i64;
                    if count <= 0 {
                        element.weight = 0;
                        element.reps = 0;
                        if !in_slowcat {
                            element.add_op(SliceOp::Replicate { amount: count });
                        }
                    } else if in_slowcat {
                        element.reps = count as usize;
                    } else {
                        element.weight = count;
                        element.add_op(SliceOp::Replicate { amount: count });
                    }
                }
                Token::Question => {
                    // Only an adjacent number is a probability: "0?0.3" vs "0? 1"
                    let keep = match self.peek() {
                        Some((Token::Number(n), num_span)) if num_span.start == span.end => {
                            self.next();
                            end_span = num_span;
                            n
                        }
                        _ => DEFAULT_KEEP_PROBABILITY,
                    };

                    let seed = self.seed_counter;
                    self.seed_counter += 1;

                    element.add_op(SliceOp::DegradeBy { keep, seed });
                }
                _ => unreachable!("is_modifier covers every modifier token"),
            }
        }

        element.span = start_span.merge(end_span);
        Ok(element)
    }

    /// Parse a leaf value or a bracketed group
    fn parse_atom(&mut self) -> Result<Ast> {
        match self.peek() {
            Some((Token::LBracket, _)) => self.parse_sub_cycle(),
            Some((Token::LAngle, _)) => self.parse_slow_sequence(),
            Some((Token::Tilde | Token::Dash, span)) => {
                self.next();
                Ok(Ast::Atom(AtomNode::silence(span)))
            }
            Some((Token::Number(n), span)) => {
                self.next();
                Ok(Ast::Atom(AtomNode::number(n, span)))
            }
            Some((Token::Note, span)) => {
                self.next();
                let name = self.lexer.slice(span);
                let pitch = note_to_midi(name, DEFAULT_OCTAVE)
                    .map_err(|_| ParseError::invalid_note(name, span))?;
                Ok(Ast::Atom(AtomNode::note(name, pitch, span)))
            }
            Some((_, span)) => Err(ParseError::unexpected_token(
                "number, note, rest or group",
                self.lexer.slice(span),
                span,
            )),
            None => Err(ParseError::unexpected_eof(
                "number, note, rest or group",
                self.position(),
            )),
        }
    }

    /// Parse a sub-cycle: [pattern]
    fn parse_sub_cycle(&mut self) -> Result<Ast> {
        let start_span = self.expect_token(Token::LBracket)?;
        let pattern = self.parse_pattern()?;
        let end_span = self.expect_closing(Token::RBracket, '[', start_span)?;

        // Update span to include brackets
        match pattern {
            Ast::Pattern(mut p) => {
                p.span = start_span.merge(end_span);
                Ok(Ast::Pattern(p))
            }
            other => Ok(other),
        }
    }

    /// Parse a slow sequence: <a b c>, one element per cycle
    fn parse_slow_sequence(&mut self) -> Result<Ast> {
        let start_span = self.expect_token(Token::LAngle)?;
        let mut elements = Vec::new();

        while let Some((token, span)) = self.peek() {
            match token {
                Token::RAngle => break,
                Token::Comma => {
                    return Err(ParseError::unexpected_token(
                        "element or '>'",
                        self.lexer.slice(span),
                        span,
                    ))
                }
                _ => elements.push(Ast::Element(self.parse_element(true)?)),
            }
        }

        let end_span = self.expect_closing(Token::RAngle, '<', start_span)?;
        Ok(Ast::Pattern(PatternNode::new(
            elements,
            Alignment::Slowcat,
            start_span.merge(end_span),
        )))
    }

    // Helper methods

    fn peek(&mut self) -> Option<(Token, Span)> {
        self.lexer.peek_token()
    }

    fn next(&mut self) -> Option<(Token, Span)> {
        self.lexer.next_token()
    }

    fn position(&self) -> usize {
        self.lexer.source().len()
    }

    fn expect_token(&mut self, expected: Token) -> Result<Span> {
        match self.next() {
            Some((token, span)) if token == expected => Ok(span),
            Some((_, span)) => Err(ParseError::unexpected_token(
                expected.to_string(),
                self.lexer.slice(span),
                span,
            )),
            None => Err(ParseError::unexpected_eof(expected.to_string(), self.position())),
        }
    }

    fn expect_closing(&mut self, expected: Token, open: char, open_span: Span) -> Result<Span> {
        match self.peek() {
            None => Err(ParseError::unclosed_delimiter(open, open_span)),
            Some(_) => self.expect_token(expected),
        }
    }

    fn expect_number(&mut self) -> Result<(f64, Span)> {
        match self.next() {
            Some((Token::Number(n), span)) => Ok((n, span)),
            Some((_, span)) => Err(ParseError::unexpected_token(
                "number",
                self.lexer.slice(span),
                span,
            )),
            None => Err(ParseError::unexpected_eof("number", self.position())),
        }
    }

    /// A modifier argument read exactly from its source text
    fn expect_fraction(&mut self) -> Result<(Fraction, Span)> {
        let (_, span) = self.expect_number()?;
        let text = self.lexer.slice(span);
        let amount =
            Fraction::from_decimal_str(text).map_err(|_| ParseError::invalid_number(text, span))?;
        Ok((amount, span))
    }
}

/// Convenience function to parse a mini notation string
pub fn parse(source: &str) -> Result<Ast> {
    let mut parser = Parser::new(source);
    parser.parse_all()
}
