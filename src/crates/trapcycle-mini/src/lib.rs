//! Mini notation parser and evaluator for trapcycle
//!
//! This crate turns the compact pattern notation into an AST and evaluates
//! it into a [`trapcycle_core::Pattern`].
//!
//! # Examples
//!
//! ```
//! use trapcycle_mini::{compile, parse};
//! use trapcycle_core::TimeSpan;
//!
//! // Parse mini notation
//! let ast = parse("0 [3 5] ~ <7 9>").unwrap();
//!
//! // Evaluate to a pattern and query the first cycle
//! let pattern = compile("0 3 5 7").unwrap();
//! assert_eq!(pattern.query(TimeSpan::from_ints(0, 1)).len(), 4);
//! ```
//!
//! # Mini Notation Syntax
//!
//! - Space-separated sequences: `0 3 5`
//! - Nested groups: `[0 1]`
//! - One element per cycle: `<0 3 5>`
//! - Stacking (layering): `0 3, 7`
//! - Silence: `~` or `-`
//! - Speed: `0*2`, `[0 1]/2`
//! - Weight: `0@3`
//! - Replication: `0!3`
//! - Random removal: `0?`, `0?0.3`
//!
//! Bare numbers are scale degrees; note names (`c4`, `eb`, `f#5`) are
//! absolute pitches.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod span;


pub use ast::{Alignment, Ast};
pub use error::{ParseError, Result};
pub use evaluator::{compile, compile_seeded, evaluate, evaluate_seeded};
pub use lexer::{Lexer, Token};
pub use parser::{parse, Parser};
pub use span::Span;
