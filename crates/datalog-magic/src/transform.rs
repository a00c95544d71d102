//! The magic-set program transformation
//!
//! Given a query and a validated positive program, generate a program whose
//! saturation explores only query-relevant derivations:
//!
//! - an *input* relation per adorned IDB predicate carries the bindings
//!   flowing into its calls, seeded from the query's constants;
//! - per rule, a chain of *supplementary* relations carries exactly the
//!   bound variables still needed later in the body or by the head;
//! - every IDB body atom propagates its bound arguments onward through a
//!   new input rule, enqueueing its adorned predicate for rewriting.
//!
//! The first supplementary relation is elided: the input relation plays its
//! role. EDB atoms and facts are carried unchanged. Explicit IDB facts
//! become rules filtered through the input relation, so only called
//! bindings materialize.
//!
//! Generated names live under the reserved `%` prefix: `tc[bf]` becomes
//! `%tc_bf`, its input relation `%input%tc_bf`, and the second
//! supplementary relation of its first rule `%tc_bf_r0_sup1`.

use crate::adorn::{adorn_rule, AdornedPred, AdornedRule};
use datalog_ast::{Atom, Clause, PredSym, Premise, Symbol, Term};
use datalog_validate::ValidProgram;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The rewritten program plus the query over the mangled vocabulary.
#[derive(Debug, Clone)]
pub struct MagicProgram {
    pub clauses: Vec<Clause>,
    pub query: Atom,
}

fn mangled_base(p: &AdornedPred) -> String {
    let mut s = format!("%{}_", p.pred.name);
    for &b in &p.adornment {
        s.push(if b { 'b' } else { 'f' });
    }
    s
}

/// Name of the relation standing for an adorned predicate: EDB predicates
/// (and adornment-free ones) keep their name, adorned IDB predicates are
/// mangled.
fn relation_name(program: &ValidProgram, p: &AdornedPred) -> String {
    if program.is_idb(p.pred) && !p.adornment.is_empty() {
        mangled_base(p)
    } else {
        p.pred.name.as_ref().clone()
    }
}

fn relation_atom(program: &ValidProgram, p: &AdornedPred, args: Vec<Term>) -> Atom {
    Atom::new(relation_name(program, p), args)
}

fn input_atom(p: &AdornedPred, args: Vec<Term>) -> Atom {
    Atom::new(format!("%input{}", mangled_base(p)), args)
}

fn sup_atom(p: &AdornedPred, rule_no: usize, sup_no: usize, vars: &[Symbol]) -> Atom {
    Atom::new(
        format!("{}_r{}_sup{}", mangled_base(p), rule_no, sup_no),
        vars.iter().map(|v| Term::Variable(*v)).collect(),
    )
}

fn push_unique(clauses: &mut Vec<Clause>, emitted: &mut HashSet<Clause>, clause: Clause) {
    if emitted.insert(clause.clone()) {
        clauses.push(clause);
    }
}

/// Variables of each supplementary relation: bound by the body prefix and
/// still needed by the rest of the body or the head. Index `i` describes
/// `sup_i`; positions 0 and `n` are elided (input relation / rule head).
fn sup_attributes(adorned: &AdornedRule) -> Vec<Vec<Symbol>> {
    let n = adorned.body.len();
    let mut result = vec![Vec::new(); n.max(1)];
    for i in 1..n {
        let mut available: Vec<Symbol> = Vec::new();
        let mut seen: HashSet<Symbol> = HashSet::new();
        for term in adorned.head.bound_args() {
            if let Term::Variable(v) = term {
                if seen.insert(v) {
                    available.push(v);
                }
            }
        }
        for body_atom in &adorned.body[..i] {
            for v in body_atom.atom.variables() {
                if seen.insert(v) {
                    available.push(v);
                }
            }
        }

        let mut needed: HashSet<Symbol> = adorned.head.atom.variables().collect();
        for body_atom in &adorned.body[i..] {
            needed.extend(body_atom.atom.variables());
        }

        result[i] = available.into_iter().filter(|v| needed.contains(v)).collect();
    }
    result
}

/// Rewrite `program` for goal-directed evaluation of `query`. The query's
/// predicate must be IDB; EDB queries never reach the transformation.
pub fn magic_transform(program: &ValidProgram, query: &Atom) -> MagicProgram {
    let query_pred = AdornedPred::from_query(query);

    let mut idb_rules: HashMap<PredSym, Vec<&Clause>> = HashMap::new();
    for rule in program.rules() {
        idb_rules.entry(rule.head.pred).or_default().push(rule);
    }
    let mut idb_facts: HashMap<PredSym, Vec<&Atom>> = HashMap::new();
    for fact in program.initial_facts() {
        if program.is_idb(fact.pred) {
            idb_facts.entry(fact.pred).or_default().push(fact);
        }
    }

    let mut clauses: Vec<Clause> = Vec::new();
    let mut emitted: HashSet<Clause> = HashSet::new();

    // Seed: the query's constants flow in through its input relation.
    let seed_args: Vec<Term> = query.terms.iter().filter(|t| t.is_constant()).copied().collect();
    push_unique(
        &mut clauses,
        &mut emitted,
        Clause::fact(input_atom(&query_pred, seed_args)),
    );

    let mut worklist: Vec<AdornedPred> = vec![query_pred.clone()];
    let mut in_process: HashSet<AdornedPred> = HashSet::new();
    in_process.insert(query_pred.clone());

    while let Some(p) = worklist.pop() {
        // Explicit IDB facts, filtered by the call pattern.
        for fact in idb_facts.get(&p.pred).into_iter().flatten() {
            let bound_args: Vec<Term> = fact
                .terms
                .iter()
                .zip(p.adornment.iter())
                .filter(|(_, b)| **b)
                .map(|(t, _)| *t)
                .collect();
            push_unique(
                &mut clauses,
                &mut emitted,
                Clause::rule(
                    relation_atom(program, &p, fact.terms.clone()),
                    vec![Premise::Atom(input_atom(&p, bound_args))],
                ),
            );
        }

        let Some(rules) = idb_rules.get(&p.pred) else {
            continue;
        };
        for (rule_no, rule) in rules.iter().enumerate() {
            let adorned = adorn_rule(&p.adornment, rule);
            let n = adorned.body.len();
            let sup_vars = sup_attributes(&adorned);

            // The input relation serves as sup_0.
            let mut prev_sup = input_atom(&p, adorned.head.bound_args());

            for i in 1..=n {
                let body_atom = &adorned.body[i - 1];
                let body_is_idb = program.is_idb(body_atom.pred.pred);
                if body_is_idb && in_process.insert(body_atom.pred.clone()) {
                    worklist.push(body_atom.pred.clone());
                }

                // sup_n is elided in favor of the rule's own head.
                let head = if i < n {
                    sup_atom(&p, rule_no, i, &sup_vars[i])
                } else {
                    relation_atom(program, &p, rule.head.terms.clone())
                };

                let rewritten_atom =
                    relation_atom(program, &body_atom.pred, body_atom.atom.terms.clone());
                push_unique(
                    &mut clauses,
                    &mut emitted,
                    Clause::rule(
                        head.clone(),
                        vec![Premise::Atom(prev_sup.clone()), Premise::Atom(rewritten_atom)],
                    ),
                );

                // Calls into IDB predicates propagate their bindings.
                if body_is_idb {
                    push_unique(
                        &mut clauses,
                        &mut emitted,
                        Clause::rule(
                            input_atom(&body_atom.pred, body_atom.bound_args()),
                            vec![Premise::Atom(prev_sup.clone())],
                        ),
                    );
                }

                prev_sup = head;
            }
        }
    }

    // EDB facts carry over unchanged.
    for fact in program.initial_facts() {
        if program.is_edb(fact.pred) {
            push_unique(&mut clauses, &mut emitted, Clause::fact(fact.clone()));
        }
    }

    let rewritten_query = relation_atom(program, &query_pred, query.terms.clone());
    debug!(
        clauses = clauses.len(),
        query = %rewritten_query,
        "magic-set rewriting complete"
    );

    MagicProgram {
        clauses,
        query: rewritten_query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_validate::DatalogValidator;

    fn var(name: &str) -> Term {
        Term::variable(name)
    }

    fn cst(name: &str) -> Term {
        Term::constant(name)
    }

    fn atom(pred: &str, terms: Vec<Term>) -> Atom {
        Atom::new(pred, terms)
    }

    fn tc_program() -> ValidProgram {
        let clauses = vec![
            Clause::rule(
                atom("tc", vec![var("X"), var("Y")]),
                vec![Premise::Atom(atom("edge", vec![var("X"), var("Y")]))],
            ),
            Clause::rule(
                atom("tc", vec![var("X"), var("Y")]),
                vec![
                    Premise::Atom(atom("edge", vec![var("X"), var("Z")])),
                    Premise::Atom(atom("tc", vec![var("Z"), var("Y")])),
                ],
            ),
            Clause::fact(atom("edge", vec![cst("a"), cst("b")])),
            Clause::fact(atom("edge", vec![cst("b"), cst("c")])),
        ];
        DatalogValidator::new().validate(&clauses).unwrap()
    }

    #[test]
    fn test_seed_fact_carries_query_constants() {
        let program = tc_program();
        let magic = magic_transform(&program, &atom("tc", vec![cst("a"), var("Y")]));
        let seed = Clause::fact(atom("%input%tc_bf", vec![cst("a")]));
        assert!(magic.clauses.contains(&seed));
        assert_eq!(magic.query, atom("%tc_bf", vec![cst("a"), var("Y")]));
    }

    #[test]
    fn test_recursive_rule_produces_sup_chain_and_input_rule() {
        let program = tc_program();
        let magic = magic_transform(&program, &atom("tc", vec![cst("a"), var("Y")]));

        // Second rule: sup chain through edge, then the recursive call.
        let sup_rule = Clause::rule(
            atom("%tc_bf_r1_sup1", vec![var("X"), var("Z")]),
            vec![
                Premise::Atom(atom("%input%tc_bf", vec![var("X")])),
                Premise::Atom(atom("edge", vec![var("X"), var("Z")])),
            ],
        );
        let final_rule = Clause::rule(
            atom("%tc_bf", vec![var("X"), var("Y")]),
            vec![
                Premise::Atom(atom("%tc_bf_r1_sup1", vec![var("X"), var("Z")])),
                Premise::Atom(atom("%tc_bf", vec![var("Z"), var("Y")])),
            ],
        );
        let input_rule = Clause::rule(
            atom("%input%tc_bf", vec![var("Z")]),
            vec![Premise::Atom(atom("%tc_bf_r1_sup1", vec![var("X"), var("Z")]))],
        );
        for expected in [&sup_rule, &final_rule, &input_rule] {
            assert!(
                magic.clauses.contains(expected),
                "missing clause: {}",
                expected
            );
        }
    }

    #[test]
    fn test_edb_facts_carry_over() {
        let program = tc_program();
        let magic = magic_transform(&program, &atom("tc", vec![cst("a"), var("Y")]));
        assert!(magic
            .clauses
            .contains(&Clause::fact(atom("edge", vec![cst("a"), cst("b")]))));
    }

    #[test]
    fn test_free_query_still_specializes_recursive_calls() {
        let program = tc_program();
        let magic = magic_transform(&program, &atom("tc", vec![var("X"), var("Y")]));
        // The outer call pattern is free, but the recursive call is bound
        // through Z, so a tc[bf] version must exist alongside tc[ff].
        assert!(magic.clauses.iter().any(|c| c.head.pred.name.as_ref() == "%tc_bf"));
        assert!(magic.clauses.iter().any(|c| c.head.pred.name.as_ref() == "%tc_ff"));
    }

    #[test]
    fn test_idb_fact_filtered_through_input() {
        // p(a). p(X) :- q(X). q heads nothing, so q is EDB.
        let clauses = vec![
            Clause::fact(atom("p", vec![cst("a")])),
            Clause::rule(
                atom("p", vec![var("X")]),
                vec![Premise::Atom(atom("q", vec![var("X")]))],
            ),
        ];
        let program = DatalogValidator::new().validate(&clauses).unwrap();
        let magic = magic_transform(&program, &atom("p", vec![cst("a")]));
        let fact_rule = Clause::rule(
            atom("%p_b", vec![cst("a")]),
            vec![Premise::Atom(atom("%input%p_b", vec![cst("a")]))],
        );
        assert!(magic.clauses.contains(&fact_rule));
    }

    #[test]
    fn test_rewritten_program_validates() {
        let program = tc_program();
        for query in [
            atom("tc", vec![cst("a"), var("Y")]),
            atom("tc", vec![var("X"), var("Y")]),
            atom("tc", vec![cst("a"), cst("b")]),
        ] {
            let magic = magic_transform(&program, &query);
            DatalogValidator::new()
                .with_reserved_names()
                .validate(&magic.clauses)
                .expect("rewritten program must validate");
        }
    }
}
