//! Parser for Datalog programs
//!
//! A parser-combinator parser built on Chumsky: a character-level lexer
//! feeding a token-level statement parser.
//!
//! # Supported Syntax
//!
//! - **Facts**: `edge(a, b).`
//! - **Rules**: `tc(X, Y) :- edge(X, Z), tc(Z, Y).`
//! - **Queries**: `tc(X, Y)?`
//! - **(Dis)unification**: `X = Y`, `X != Y`
//! - **Negation**: `not blocked(X)`
//! - **Anonymous variables**: `_` (each occurrence distinct)
//! - **Comments**: `% to end of line`
//!
//! Identifiers starting with an uppercase letter or `_` are variables;
//! everything else is a constant or predicate name. Zero-arity atoms are
//! bare identifiers: `done.`
//!
//! # Example
//!
//! ```ignore
//! use datalog_parser::parse_program;
//!
//! let program = parse_program("edge(a, b). tc(X, Y) :- edge(X, Y). tc(X, Y)?")?;
//! ```

pub mod parser;
pub mod token;

pub use parser::{parse_program, parse_query, ParseError};
pub use token::Token;
