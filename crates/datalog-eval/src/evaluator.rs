//! Clause evaluation
//!
//! Given an annotated clause and a candidate fact for its delta atom,
//! enumerate every ground head atom derivable from that fact plus the facts
//! currently in the indexer. The walk follows the annotator's fixed premise
//! order with trail-based backtracking; all cross-worker effects go through
//! the caller's `report` callback.

use crate::annotate::{AnnotatedClause, BodyPremise};
use crate::substitution::ClauseSubstitution;
use datalog_ast::{Atom, Symbol, Term};
use datalog_index::FactIndexer;

pub struct ClauseEvaluator<'a> {
    clause: &'a AnnotatedClause,
    index: &'a FactIndexer,
}

impl<'a> ClauseEvaluator<'a> {
    pub fn new(clause: &'a AnnotatedClause, index: &'a FactIndexer) -> Self {
        ClauseEvaluator { clause, index }
    }

    /// Derive every head fact obtainable with `fact` as the delta premise.
    pub fn evaluate(&self, fact: &Atom, report: &mut dyn FnMut(Atom)) {
        let Some(delta) = &self.clause.delta else {
            debug_assert!(false, "one-shot clauses are evaluated via evaluate_one_shot");
            return;
        };
        if fact.pred != delta.pred {
            return;
        }
        let mut subst = ClauseSubstitution::new(self.clause.var_count());
        if !self.bind_atom(delta, fact, &mut subst) {
            return;
        }
        self.walk(0, &mut subst, report);
    }

    /// Evaluate a clause with no positive body atom (only `=`, `!=`, `not`).
    pub fn evaluate_one_shot(&self, report: &mut dyn FnMut(Atom)) {
        debug_assert!(self.clause.delta.is_none());
        let mut subst = ClauseSubstitution::new(self.clause.var_count());
        self.walk(0, &mut subst, report);
    }

    fn walk(&self, i: usize, subst: &mut ClauseSubstitution, report: &mut dyn FnMut(Atom)) {
        let Some(premise) = self.clause.rest.get(i) else {
            report(self.apply_head(subst));
            return;
        };

        match premise {
            BodyPremise::Atom(pattern) => {
                let resolved: Vec<Option<Symbol>> = pattern
                    .terms
                    .iter()
                    .map(|t| self.resolve(t, subst))
                    .collect();
                for fact in self.index.index_into_resolved(pattern.pred, &resolved) {
                    let mark = subst.mark();
                    if self.bind_atom(pattern, &fact, subst) {
                        self.walk(i + 1, subst, report);
                    }
                    subst.undo_to(mark);
                }
            }
            BodyPremise::Negated(pattern) => {
                // The annotator schedules negations only once every variable
                // is bound; a `None` here means the branch cannot succeed.
                let constants: Option<Vec<Term>> = pattern
                    .terms
                    .iter()
                    .map(|t| self.resolve(t, subst).map(Term::Constant))
                    .collect();
                if let Some(terms) = constants {
                    let ground = Atom::from_parts(pattern.pred, terms);
                    if !self.index.contains(&ground) {
                        self.walk(i + 1, subst, report);
                    }
                }
            }
            BodyPremise::Unify(l, r) => match (self.resolve(l, subst), self.resolve(r, subst)) {
                (Some(a), Some(b)) => {
                    if a == b {
                        self.walk(i + 1, subst, report);
                    }
                }
                (Some(value), None) => self.bind_and_walk(r, value, i, subst, report),
                (None, Some(value)) => self.bind_and_walk(l, value, i, subst, report),
                // Unreachable for validated programs; fail the branch.
                (None, None) => {}
            },
            BodyPremise::Disunify(l, r) => {
                // Both sides must be ground; anything else fails the branch.
                if let (Some(a), Some(b)) = (self.resolve(l, subst), self.resolve(r, subst)) {
                    if a != b {
                        self.walk(i + 1, subst, report);
                    }
                }
            }
        }
    }

    fn bind_and_walk(
        &self,
        term: &Term,
        value: Symbol,
        i: usize,
        subst: &mut ClauseSubstitution,
        report: &mut dyn FnMut(Atom),
    ) {
        let Term::Variable(v) = term else {
            return;
        };
        let mark = subst.mark();
        subst.set(self.clause.slot(*v), value);
        self.walk(i + 1, subst, report);
        subst.undo_to(mark);
    }

    /// Match `fact` against `pattern`, binding the pattern's free variables.
    /// Handles repeated variables and already-bound slots.
    fn bind_atom(&self, pattern: &Atom, fact: &Atom, subst: &mut ClauseSubstitution) -> bool {
        for (pt, ft) in pattern.terms.iter().zip(fact.terms.iter()) {
            let Term::Constant(c) = ft else {
                panic!("non-ground fact during clause evaluation: {}", fact)
            };
            match pt {
                Term::Constant(pc) => {
                    if pc != c {
                        return false;
                    }
                }
                Term::Variable(v) => {
                    let slot = self.clause.slot(*v);
                    match subst.get(slot) {
                        Some(existing) => {
                            if existing != *c {
                                return false;
                            }
                        }
                        None => subst.set(slot, *c),
                    }
                }
            }
        }
        true
    }

    fn resolve(&self, term: &Term, subst: &ClauseSubstitution) -> Option<Symbol> {
        match term {
            Term::Constant(c) => Some(*c),
            Term::Variable(v) => subst.get(self.clause.slot(*v)),
        }
    }

    fn apply_head(&self, subst: &ClauseSubstitution) -> Atom {
        let terms = self
            .clause
            .head
            .terms
            .iter()
            .map(|t| match self.resolve(t, subst) {
                Some(c) => Term::Constant(c),
                None => panic!(
                    "unbound head variable after body evaluation: {}",
                    self.clause.head
                ),
            })
            .collect();
        Atom::from_parts(self.clause.head.pred, terms)
    }
}
