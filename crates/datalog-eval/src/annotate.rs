//! Semi-naive clause annotation
//!
//! Rewrites each validated rule into one or more [`AnnotatedClause`]s so
//! that evaluation only considers derivations using at least one fact that
//! is new this round:
//!
//! - one annotated clause per positive IDB body atom, with that atom as the
//!   "delta" trigger;
//! - rules whose positive atoms are all EDB get a single version triggered
//!   by their first positive atom (EDB facts flow through the work pool as
//!   seed items);
//! - rules with no positive atom at all become one-shots, evaluated when
//!   their stratum is seeded.
//!
//! Each annotated clause carries a fixed execution order: the delta first,
//! the other positive atoms in source order, and every negation and
//! (dis)unification at the earliest point its variables allow. The order is
//! computed once and reused for every evaluation of the clause.

use datalog_ast::{Atom, Clause, PredSym, Premise, Symbol, Term};
use datalog_validate::ValidProgram;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A body premise in execution position, delta excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPremise {
    Atom(Atom),
    Negated(Atom),
    Unify(Term, Term),
    Disunify(Term, Term),
}

/// One evaluation plan for a rule: trigger pattern, ordered remaining
/// premises, and a dense numbering of the rule's variables.
#[derive(Debug, Clone)]
pub struct AnnotatedClause {
    pub head: Atom,
    /// Pattern the triggering fact must match; `None` for one-shots.
    pub delta: Option<Atom>,
    /// Remaining premises in execution order.
    pub rest: Vec<BodyPremise>,
    var_index: HashMap<Symbol, usize>,
}

impl AnnotatedClause {
    pub fn var_count(&self) -> usize {
        self.var_index.len()
    }

    /// Dense slot of a clause variable. Every variable of the clause is
    /// registered at annotation time.
    pub(crate) fn slot(&self, var: Symbol) -> usize {
        self.var_index[&var]
    }
}

/// The annotated rules of one stratum.
#[derive(Debug, Clone, Default)]
pub struct StratumPlan {
    /// Annotated clauses keyed by their delta predicate.
    pub rules_by_pred: HashMap<PredSym, Vec<Arc<AnnotatedClause>>>,
    /// Clauses with no positive body atom, run once at stratum seeding.
    pub one_shots: Vec<Arc<AnnotatedClause>>,
    /// Predicates whose facts seed this stratum.
    pub delta_preds: HashSet<PredSym>,
}

/// Annotate every rule of a validated program, grouped by stratum.
pub fn annotate_program(program: &ValidProgram) -> Vec<StratumPlan> {
    let mut plans: Vec<StratumPlan> = (0..program.num_strata())
        .map(|_| StratumPlan::default())
        .collect();

    for rule in program.rules() {
        let stratum = program.stratum_of(rule.head.pred);
        let plan = &mut plans[stratum];
        for annotated in annotate_clause(rule, program.idb_predicates()) {
            let annotated = Arc::new(annotated);
            match &annotated.delta {
                Some(delta) => {
                    plan.delta_preds.insert(delta.pred);
                    plan.rules_by_pred
                        .entry(delta.pred)
                        .or_default()
                        .push(annotated);
                }
                None => plan.one_shots.push(annotated),
            }
        }
    }

    plans
}

/// Annotate a single rule: one clause per delta candidate.
pub fn annotate_clause(clause: &Clause, idb: &HashSet<PredSym>) -> Vec<AnnotatedClause> {
    let positives: Vec<usize> = clause
        .body
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_positive())
        .map(|(i, _)| i)
        .collect();
    let idb_positions: Vec<usize> = positives
        .iter()
        .copied()
        .filter(|&i| match &clause.body[i] {
            Premise::Atom(atom) => idb.contains(&atom.pred),
            _ => false,
        })
        .collect();

    let delta_choices: Vec<Option<usize>> = if !idb_positions.is_empty() {
        idb_positions.into_iter().map(Some).collect()
    } else if let Some(&first) = positives.first() {
        vec![Some(first)]
    } else {
        vec![None]
    };

    delta_choices
        .into_iter()
        .map(|choice| order_clause(clause, choice))
        .collect()
}

fn order_clause(clause: &Clause, delta_pos: Option<usize>) -> AnnotatedClause {
    let mut bound: HashSet<Symbol> = HashSet::new();
    let mut rest: Vec<BodyPremise> = Vec::new();
    let mut pending: Vec<&Premise> = clause
        .body
        .iter()
        .filter(|p| !p.is_positive())
        .collect();

    let delta = delta_pos.map(|i| match &clause.body[i] {
        Premise::Atom(atom) => atom.clone(),
        _ => unreachable!("delta premise must be a positive atom"),
    });
    if let Some(atom) = &delta {
        bound.extend(atom.variables());
    }

    place_ready(&mut pending, &mut bound, &mut rest);
    for (i, premise) in clause.body.iter().enumerate() {
        if Some(i) == delta_pos {
            continue;
        }
        if let Premise::Atom(atom) = premise {
            rest.push(BodyPremise::Atom(atom.clone()));
            bound.extend(atom.variables());
            place_ready(&mut pending, &mut bound, &mut rest);
        }
    }
    assert!(
        pending.is_empty(),
        "validated clause left unorderable premises: {}",
        clause
    );

    // Dense numbering, first occurrence in execution order.
    let mut var_index: HashMap<Symbol, usize> = HashMap::new();
    let mut number = |t: &Term| {
        if let Term::Variable(v) = t {
            let next = var_index.len();
            var_index.entry(*v).or_insert(next);
        }
    };
    if let Some(atom) = &delta {
        atom.terms.iter().for_each(&mut number);
    }
    for premise in &rest {
        match premise {
            BodyPremise::Atom(a) | BodyPremise::Negated(a) => {
                a.terms.iter().for_each(&mut number)
            }
            BodyPremise::Unify(l, r) | BodyPremise::Disunify(l, r) => {
                number(l);
                number(r);
            }
        }
    }
    clause.head.terms.iter().for_each(&mut number);

    AnnotatedClause {
        head: clause.head.clone(),
        delta,
        rest,
        var_index,
    }
}

/// Move every ready pending premise into the execution order, repeating
/// until nothing more unlocks. A unification is ready once one side is a
/// constant or bound variable (and then binds the other side); negation and
/// disunification wait for all of their variables.
fn place_ready(
    pending: &mut Vec<&Premise>,
    bound: &mut HashSet<Symbol>,
    rest: &mut Vec<BodyPremise>,
) {
    loop {
        let mut placed_any = false;
        let mut i = 0;
        while i < pending.len() {
            if is_ready(pending[i], bound) {
                match pending.remove(i) {
                    Premise::Negated(a) => rest.push(BodyPremise::Negated(a.clone())),
                    Premise::Unification(l, r) => {
                        for t in [l, r] {
                            if let Term::Variable(v) = t {
                                bound.insert(*v);
                            }
                        }
                        rest.push(BodyPremise::Unify(*l, *r));
                    }
                    Premise::Disunification(l, r) => rest.push(BodyPremise::Disunify(*l, *r)),
                    Premise::Atom(_) => unreachable!("positive atoms are never pending"),
                }
                placed_any = true;
            } else {
                i += 1;
            }
        }
        if !placed_any {
            break;
        }
    }
}

fn is_ready(premise: &Premise, bound: &HashSet<Symbol>) -> bool {
    let resolved = |t: &Term| match t {
        Term::Constant(_) => true,
        Term::Variable(v) => bound.contains(v),
    };
    match premise {
        Premise::Unification(l, r) => resolved(l) || resolved(r),
        Premise::Disunification(l, r) => resolved(l) && resolved(r),
        Premise::Negated(a) => a.terms.iter().all(resolved),
        Premise::Atom(_) => false,
    }
}
