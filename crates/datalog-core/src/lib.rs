//! Substitutions and unification
//!
//! The general-purpose substitution used for query matching and program
//! analysis. Clause evaluation uses a denser, array-backed representation
//! that lives with the evaluator.

pub mod unification;

pub use unification::{disunify, unify, unify_atoms, Substitution};
