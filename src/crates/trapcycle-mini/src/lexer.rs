use crate::span::Span;
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
pub enum Token {
    // Optionally signed, optionally decimal. Longest match keeps "-1" a number
    // and a lone "-" a rest.
    #[regex(r"-?[0-9]+(\.[0-9]+)?", parse_number, priority = 10)]
    Number(f64),

    // Letter, accidentals, optional signed octave: c, eb4, f##5, cs-1
    #[regex(r"[a-gA-G][#bsf]*(-?[0-9]+)?", priority = 5)]
    Note,

    // Delimiters
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,

    // Separators
    #[token(",")]
    Comma,

    // Modifiers
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("@")]
    At,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,

    // Rests
    #[token("~")]
    Tilde,
    #[token("-")]
    Dash,

    // Error token
    Error,
}

fn parse_number(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

impl Token {
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Token::Star | Token::Slash | Token::At | Token::Bang | Token::Question
        )
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Token::Tilde | Token::Dash)
    }

    /// True for tokens that close a layer
    pub fn ends_layer(&self) -> bool {
        matches!(self, Token::RBracket | Token::RAngle | Token::Comma)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Note => write!(f, "note"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::Comma => write!(f, ","),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::At => write!(f, "@"),
            Token::Bang => write!(f, "!"),
            Token::Question => write!(f, "?"),
            Token::Tilde => write!(f, "~"),
            Token::Dash => write!(f, "-"),
            Token::Error => write!(f, "invalid character"),
        }
    }
}

/// Lexer wrapper with position tracking
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<(Token, Span)>>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Lexer {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> Option<(Token, Span)> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }

        let token = self.inner.next()?;
        let span = Span::from(self.inner.span());
        Some((token.unwrap_or(Token::Error), span))
    }

    pub fn peek_token(&mut self) -> Option<(Token, Span)> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token());
        }
        self.peeked.as_ref().and_then(|x| x.clone())
    }

    pub fn source(&self) -> &'source str {
        self.inner.source()
    }

    pub fn slice(&self, span: Span) -> &'source str {
        &self.source()[span.to_range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some((token, _)) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_lex_notes() {
        let tokens = lex("c eb4 f##5 cs-1 B");
        assert_eq!(tokens, vec![Token::Note; 5]);
    }

    #[test]
    fn test_lex_numbers() {
        let tokens = lex("1 2.5 -3 0.25");
        assert_eq!(
            tokens,
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(-3.0),
                Token::Number(0.25)
            ]
        );
    }

    #[test]
    fn test_lex_rests() {
        assert_eq!(lex("~ -"), vec![Token::Tilde, Token::Dash]);
        assert_eq!(lex("0 - 1"), vec![Token::Number(0.0), Token::Dash, Token::Number(1.0)]);
        assert_eq!(lex("e-"), vec![Token::Note, Token::Dash]);
    }

    #[test]
    fn test_lex_brackets() {
        let tokens = lex("[0 <1 2>]");
        assert_eq!(
            tokens,
            vec![
                Token::LBracket,
                Token::Number(0.0),
                Token::LAngle,
                Token::Number(1.0),
                Token::Number(2.0),
                Token::RAngle,
                Token::RBracket
            ]
        );
    }

    #[test]
    fn test_lex_modifiers() {
        let tokens = lex("0*2 3@3 5!2 7? 1/2");
        assert_eq!(
            tokens,
            vec![
                Token::Number(0.0),
                Token::Star,
                Token::Number(2.0),
                Token::Number(3.0),
                Token::At,
                Token::Number(3.0),
                Token::Number(5.0),
                Token::Bang,
                Token::Number(2.0),
                Token::Number(7.0),
                Token::Question,
                Token::Number(1.0),
                Token::Slash,
                Token::Number(2.0)
            ]
        );
    }

    #[test]
    fn test_lex_invalid_character() {
        let tokens = lex("0 x");
        assert_eq!(tokens, vec![Token::Number(0.0), Token::Error]);
    }

    #[test]
    fn test_lexer_slice() {
        let input = "c4 eb";
        let mut lexer = Lexer::new(input);

        let (token, span) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Note);
        assert_eq!(lexer.slice(span), "c4");

        let (_, span) = lexer.next_token().unwrap();
        assert_eq!(lexer.slice(span), "eb");
        assert_eq!(span, Span::new(3, 5));
    }

    #[test]
    fn test_lexer_peek() {
        let mut lexer = Lexer::new("0 1");

        let (token, _) = lexer.peek_token().unwrap();
        assert_eq!(token, Token::Number(0.0));

        // Peek again - should be same
        let (token, _) = lexer.peek_token().unwrap();
        assert_eq!(token, Token::Number(0.0));

        let (token, _) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Number(0.0));

        let (token, _) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Number(1.0));
        assert!(lexer.next_token().is_none());
    }
}
