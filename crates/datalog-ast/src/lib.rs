//! Core data structures for Datalog programs
//!
//! This crate defines the term/atom/clause data model shared by every other
//! layer of the engine.
//!
//! # Key Components
//!
//! - **Symbol**: Interned string, the identity of constants and variables
//! - **PredSym**: Interned predicate symbol with its arity
//! - **Term**: Variable or constant (no function symbols)
//! - **Atom**: Predicate applied to terms (e.g., `edge(a, B)`)
//! - **Premise**: Body element: positive atom, negated atom, `=` or `!=`
//! - **Clause**: Head plus ordered body; a fact is a body-less clause
//! - **Program**: A list of clauses and queries
//!
//! # Syntax Examples
//!
//! - **Facts**: `edge(a, b).`
//! - **Rules**: `tc(X, Y) :- edge(X, Z), tc(Z, Y).`
//! - **Queries**: `tc(X, Y)?`
//! - **Explicit (dis)unification**: `cycle(X) :- X = Y, tc(X, Y).`
//! - **Negation**: `dry(X) :- node(X), not wet(X).`

pub mod ast;

pub use ast::{Atom, Clause, PredSym, Premise, Program, Statement, Symbol, Term};
