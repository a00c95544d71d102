//! Engine API
//!
//! `init` validates a clause set; `query` answers a query atom. For an EDB
//! predicate the answer comes straight from the initial facts; for an IDB
//! predicate the engine saturates once (lazily, cached until the next
//! `init`) and filters the index against the query.

use crate::error::EvalError;
use crate::saturate::{Saturator, DEFAULT_CHUNK_SIZE};
use datalog_ast::{Atom, Clause};
use datalog_core::{unify_atoms, Substitution};
use datalog_index::FactIndexer;
use datalog_validate::{DatalogValidator, ValidProgram, ValidationError};
use std::collections::HashSet;

/// Query answers: a set of ground atoms.
pub type FactSet = HashSet<Atom>;

/// A Datalog engine: load a program, then ask for matching ground atoms.
pub trait DatalogEngine {
    fn init(&mut self, clauses: &[Clause]) -> Result<(), ValidationError>;
    fn query(&mut self, query: &Atom) -> Result<FactSet, EvalError>;
}

/// Semi-naive bottom-up engine over the saturator strategies.
pub struct BottomUpEngine {
    saturator: Saturator,
    program: Option<ValidProgram>,
    saturated: Option<FactIndexer>,
}

impl BottomUpEngine {
    fn with_saturator(saturator: Saturator) -> Self {
        BottomUpEngine {
            saturator,
            program: None,
            saturated: None,
        }
    }

    /// Single-threaded semi-naive evaluation.
    pub fn semi_naive_serial() -> Self {
        BottomUpEngine::with_saturator(Saturator::serial())
    }

    /// Parallel evaluation, one work item per derived fact.
    pub fn semi_naive_concurrent() -> Self {
        BottomUpEngine::with_saturator(Saturator::concurrent())
    }

    /// Parallel evaluation with facts bundled into work items of
    /// `chunk_size`.
    pub fn chunked_concurrent(chunk_size: usize) -> Self {
        BottomUpEngine::with_saturator(Saturator::chunked(chunk_size))
    }
}

impl Default for BottomUpEngine {
    fn default() -> Self {
        BottomUpEngine::chunked_concurrent(DEFAULT_CHUNK_SIZE)
    }
}

impl DatalogEngine for BottomUpEngine {
    fn init(&mut self, clauses: &[Clause]) -> Result<(), ValidationError> {
        let validator = DatalogValidator::new()
            .with_unification()
            .with_disunification();
        let program = validator.validate(clauses)?;
        self.program = Some(program);
        self.saturated = None;
        Ok(())
    }

    fn query(&mut self, query: &Atom) -> Result<FactSet, EvalError> {
        let program = self.program.as_ref().ok_or(EvalError::Uninitialized)?;
        program.validate_query(query)?;

        if program.is_edb(query.pred) {
            let facts = program
                .initial_facts()
                .iter()
                .filter(|f| f.pred == query.pred);
            return Ok(filter_matching(facts, query));
        }

        if self.saturated.is_none() {
            self.saturated = Some(self.saturator.saturate(program)?);
        }
        let index = match &self.saturated {
            Some(index) => index,
            None => unreachable!("saturation result cached above"),
        };
        Ok(filter_index(index, query))
    }
}

/// The subset of `facts` matching the query pattern.
pub(crate) fn filter_matching<'a>(
    facts: impl Iterator<Item = &'a Atom>,
    query: &Atom,
) -> FactSet {
    facts
        .filter(|fact| {
            let mut subst = Substitution::new();
            unify_atoms(query, fact, &mut subst)
        })
        .cloned()
        .collect()
}

/// The indexed facts matching the query pattern.
pub(crate) fn filter_index(index: &FactIndexer, query: &Atom) -> FactSet {
    let candidates = index.index_into(query, &Substitution::new());
    filter_matching(candidates.iter(), query)
}
