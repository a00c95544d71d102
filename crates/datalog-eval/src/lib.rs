//! Bottom-up Datalog evaluation
//!
//! This crate drives saturation: validated clauses are rewritten by the
//! semi-naive annotator into per-round evaluation plans, the clause
//! evaluator enumerates new head facts from a triggering fact, and the
//! saturator runs the fixed point (serially or on a chunked work pool),
//! one stratum at a time.
//!
//! # Example
//!
//! ```ignore
//! use datalog_eval::{BottomUpEngine, DatalogEngine};
//!
//! let mut engine = BottomUpEngine::chunked_concurrent(64);
//! engine.init(&clauses)?;
//! let results = engine.query(&query)?;
//! ```

pub mod annotate;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod saturate;
pub mod substitution;

pub use annotate::{annotate_clause, annotate_program, AnnotatedClause, BodyPremise, StratumPlan};
pub use engine::{BottomUpEngine, DatalogEngine, FactSet};
pub use error::EvalError;
pub use evaluator::ClauseEvaluator;
pub use saturate::{Saturator, Strategy, DEFAULT_CHUNK_SIZE};
pub use substitution::ClauseSubstitution;
