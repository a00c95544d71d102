//! Program validation and stratification
//!
//! Turns a raw clause set into a [`ValidProgram`]: checks safety (range
//! restriction, negation and disunification boundedness), partitions
//! predicates into EDB and IDB, and assigns strata so that negation is
//! evaluated only over fully saturated lower strata.
//!
//! # Validation Rules
//!
//! A program is valid if:
//! 1. No clause head contains an anonymous variable
//! 2. Every head variable can be bound by the body (positive atoms, or
//!    unification chains rooted in constants or bound variables)
//! 3. Every variable of a negated atom or disunification can be bound
//! 4. The dependency graph has no cycle through negation
//! 5. Each predicate name is used at a single arity
//!
//! Explicit unification and disunification in rule bodies are opt-in
//! features, mirroring the engine surface:
//!
//! ```ignore
//! let program = DatalogValidator::new()
//!     .with_unification()
//!     .with_disunification()
//!     .validate(&clauses)?;
//! ```

pub mod stratification;
pub mod validator;

pub use stratification::{stratify, Stratification};
pub use validator::{DatalogValidator, ValidProgram, ValidationError, RESERVED_PREFIX};
