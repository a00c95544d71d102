//! Magic-set engine
//!
//! `init` stores the validated program; every `query` adorns it, runs the
//! rewritten program on the concurrent saturator, and strips the mangling
//! from the answers. The transformation is defined for positive programs:
//! negation and explicit (dis)unification are rejected at `init`.

use crate::transform::magic_transform;
use datalog_ast::{Atom, Clause, Premise};
use datalog_core::{unify_atoms, Substitution};
use datalog_eval::{DatalogEngine, EvalError, FactSet, Saturator};
use datalog_validate::{DatalogValidator, ValidProgram, ValidationError};

#[derive(Default)]
pub struct MagicSetEngine {
    program: Option<ValidProgram>,
}

impl MagicSetEngine {
    pub fn new() -> Self {
        MagicSetEngine::default()
    }
}

impl DatalogEngine for MagicSetEngine {
    fn init(&mut self, clauses: &[Clause]) -> Result<(), ValidationError> {
        // No unification/disunification toggles: the rewriting is defined
        // over plain positive atoms.
        let program = DatalogValidator::new().validate(clauses)?;
        for rule in program.rules() {
            if rule.body.iter().any(|p| matches!(p, Premise::Negated(_))) {
                return Err(ValidationError::DisallowedFeature {
                    clause: rule.to_string(),
                    feature: "negation under magic-set evaluation",
                });
            }
        }
        self.program = Some(program);
        Ok(())
    }

    fn query(&mut self, query: &Atom) -> Result<FactSet, EvalError> {
        let program = self.program.as_ref().ok_or(EvalError::Uninitialized)?;
        program.validate_query(query)?;

        // EDB queries never need the transformation.
        if program.is_edb(query.pred) {
            return Ok(matching(program.initial_facts(), query));
        }

        let magic = magic_transform(program, query);
        let rewritten = DatalogValidator::new()
            .with_reserved_names()
            .validate(&magic.clauses)
            .expect("magic-set rewriting produced an invalid program");
        let index = Saturator::concurrent().saturate(&rewritten)?;

        // Translate matching answers back to the original vocabulary.
        let mut results = FactSet::new();
        for fact in index.index_into(&magic.query, &Substitution::new()) {
            let mut subst = Substitution::new();
            if unify_atoms(&magic.query, &fact, &mut subst) {
                results.insert(Atom::from_parts(query.pred, fact.terms.clone()));
            }
        }
        Ok(results)
    }
}

fn matching(facts: &[Atom], query: &Atom) -> FactSet {
    facts
        .iter()
        .filter(|fact| {
            let mut subst = Substitution::new();
            unify_atoms(query, fact, &mut subst)
        })
        .cloned()
        .collect()
}
