//! End-to-end scenarios, parsed from source text and run on every engine.

use crate::harness::{all_engines, assert_answers, bottom_up_engines, clauses, query};
use datalog_eval::{BottomUpEngine, DatalogEngine};
use datalog_validate::ValidationError;

const TC_PROGRAM: &str = "
    tc(X,Y) :- edge(X,Y).
    tc(X,Y) :- edge(X,Z), tc(Z,Y).
    edge(a,b). edge(b,c). edge(c,c). edge(c,d).
";

#[test]
fn test_transitive_closure_with_cycle() {
    assert_answers(
        bottom_up_engines(),
        TC_PROGRAM,
        "tc(X,Y)?",
        &[
            "tc(a,b)",
            "tc(a,c)",
            "tc(a,d)",
            "tc(b,c)",
            "tc(b,d)",
            "tc(c,c)",
            "tc(c,d)",
        ],
    );
}

#[test]
fn test_cycle_via_unification() {
    let program = format!("{} cycle(X) :- X = Y, tc(X,Y).", TC_PROGRAM);
    assert_answers(bottom_up_engines(), &program, "cycle(X)?", &["cycle(c)"]);
}

#[test]
fn test_begins_at_c() {
    let program = format!("{} beginsAtC(X,Y) :- tc(X,Y), c = X.", TC_PROGRAM);
    assert_answers(
        bottom_up_engines(),
        &program,
        "beginsAtC(X,Y)?",
        &["beginsAtC(c,c)", "beginsAtC(c,d)"],
    );
}

#[test]
fn test_noncycle_via_disunification() {
    let program = format!("{} noncycle(X,Y) :- X != Y, tc(X,Y).", TC_PROGRAM);
    assert_answers(
        bottom_up_engines(),
        &program,
        "noncycle(X,Y)?",
        &[
            "noncycle(a,b)",
            "noncycle(a,c)",
            "noncycle(a,d)",
            "noncycle(b,c)",
            "noncycle(b,d)",
            "noncycle(c,d)",
        ],
    );
}

#[test]
fn test_begins_not_at_c() {
    let program = format!("{} beginsNotAtC(X,Y) :- tc(X,Y), c != X.", TC_PROGRAM);
    assert_answers(
        bottom_up_engines(),
        &program,
        "beginsNotAtC(X,Y)?",
        &[
            "beginsNotAtC(a,b)",
            "beginsNotAtC(a,c)",
            "beginsNotAtC(a,d)",
            "beginsNotAtC(b,c)",
            "beginsNotAtC(b,d)",
        ],
    );
}

#[test]
fn test_recursion_over_disunification_filtered_edges() {
    let program = format!(
        "{} noC(X,Y) :- edge(X,Y), X != c, Y != c. noC(X,Y) :- noC(X,Z), noC(Z,Y).",
        TC_PROGRAM
    );
    assert_answers(bottom_up_engines(), &program, "noC(X,Y)?", &["noC(a,b)"]);
}

#[test]
fn test_bare_unification_rules() {
    let program = "
        p(X,b) :- X = a.
        p(b,Y) :- Y = a.
        p(X,Y) :- X = c, Y = d.
        p(X,X) :- X = c.
        p(X,Y) :- X = d, Y = X.
        p(X,Y) :- X = Y, X = e.
    ";
    assert_answers(
        bottom_up_engines(),
        program,
        "p(X,Y)?",
        &["p(a,b)", "p(b,a)", "p(c,d)", "p(c,c)", "p(d,d)", "p(e,e)"],
    );
}

#[test]
fn test_bare_unification_feeds_downstream_rule() {
    let program = "
        p(X,b) :- X = a.
        p(b,Y) :- Y = a.
        p(X,Y) :- X = c, Y = d.
        p(X,X) :- X = c.
        p(X,Y) :- X = d, Y = X.
        p(X,Y) :- X = Y, X = e.
        q(X,Y) :- p(X,Y).
    ";
    assert_answers(
        bottom_up_engines(),
        program,
        "q(X,Y)?",
        &["q(a,b)", "q(b,a)", "q(c,d)", "q(c,c)", "q(d,d)", "q(e,e)"],
    );
}

#[test]
fn test_impossible_bodies_yield_nothing() {
    assert_answers(bottom_up_engines(), "p :- a = b.", "p?", &[]);
    assert_answers(bottom_up_engines(), "p :- a != a.", "p?", &[]);
    assert_answers(
        bottom_up_engines(),
        "p :- Z = b, X = Y, a = X, Z = Y.",
        "p?",
        &[],
    );
    assert_answers(bottom_up_engines(), "p :- q(X), X != X. q(a).", "p?", &[]);
}

#[test]
fn test_satisfiable_ground_bodies() {
    assert_answers(bottom_up_engines(), "p :- a != b.", "p?", &["p"]);
    assert_answers(
        bottom_up_engines(),
        "q :- X != Y, X = a, Y = b.",
        "q?",
        &["q"],
    );
}

#[test]
fn test_unsafe_disunification_rejected() {
    let program = clauses("p(X) :- q(X), Y != _. q(a).");
    let mut engine = BottomUpEngine::semi_naive_serial();
    let result = engine.init(&program);
    assert!(
        matches!(result, Err(ValidationError::UnsafeVariable { .. })),
        "expected rejection, got {:?}",
        result
    );
}

#[test]
fn test_anonymous_unification_rejected() {
    let program = clauses("p(X) :- q(X), X = Y. q(a). p(b) :- X = _.");
    let mut engine = BottomUpEngine::semi_naive_serial();
    assert!(matches!(
        engine.init(&program),
        Err(ValidationError::UselessUnification { .. })
    ));
}

#[test]
fn test_stratified_negation_end_to_end() {
    let program = format!(
        "{} blocked(d). open(X,Y) :- tc(X,Y), not blocked(Y).",
        TC_PROGRAM
    );
    assert_answers(
        bottom_up_engines(),
        &program,
        "open(X,Y)?",
        &["open(a,b)", "open(a,c)", "open(b,c)", "open(c,c)"],
    );
}

#[test]
fn test_negated_only_body_fires_after_lower_strata() {
    // p depends on the *absence* of q(a); r consumes p's fact.
    let program = "
        q(b).
        p :- not q(a).
        r :- p.
    ";
    assert_answers(bottom_up_engines(), program, "r?", &["r"]);
}

#[test]
fn test_negation_chain() {
    let program = "
        base(a). base(b). base(c).
        excluded(a).
        included(X) :- base(X), not excluded(X).
        missing(X) :- base(X), not included(X).
    ";
    assert_answers(
        bottom_up_engines(),
        program,
        "included(X)?",
        &["included(b)", "included(c)"],
    );
    assert_answers(bottom_up_engines(), program, "missing(X)?", &["missing(a)"]);
}

#[test]
fn test_unstratified_program_rejected() {
    let program = clauses(
        "
        base(a).
        p(X) :- base(X), not q(X).
        q(X) :- base(X), not p(X).
    ",
    );
    let mut engine = BottomUpEngine::semi_naive_serial();
    assert!(matches!(
        engine.init(&program),
        Err(ValidationError::Unstratified { .. })
    ));
}

#[test]
fn test_all_engines_on_positive_program() {
    assert_answers(
        all_engines(),
        TC_PROGRAM,
        "tc(b,Y)?",
        &["tc(b,c)", "tc(b,d)"],
    );
    assert_answers(
        all_engines(),
        TC_PROGRAM,
        "tc(X,Y)?",
        &[
            "tc(a,b)",
            "tc(a,c)",
            "tc(a,d)",
            "tc(b,c)",
            "tc(b,d)",
            "tc(c,c)",
            "tc(c,d)",
        ],
    );
}

#[test]
fn test_edb_queries_on_all_engines() {
    assert_answers(
        all_engines(),
        TC_PROGRAM,
        "edge(c,Y)?",
        &["edge(c,c)", "edge(c,d)"],
    );
}

#[test]
fn test_same_generation_bound_query() {
    // The classic magic-set showcase: same-generation over a small tree.
    let program = "
        par(b, a). par(c, a). par(d, b). par(e, b). par(f, c).
        sg(X, X) :- person(X).
        sg(X, Y) :- par(X, XP), sg(XP, YP), par(Y, YP).
        person(a). person(b). person(c). person(d). person(e). person(f).
    ";
    assert_answers(
        all_engines(),
        program,
        "sg(d, Y)?",
        &["sg(d,d)", "sg(d,e)", "sg(d,f)"],
    );
}

#[test]
fn test_queries_are_idempotent_per_engine() {
    let program = clauses(TC_PROGRAM);
    let q = query("tc(X,Y)?");
    for (name, mut engine) in all_engines() {
        engine.init(&program).unwrap();
        let first = engine.query(&q).unwrap();
        let second = engine.query(&q).unwrap();
        assert_eq!(first, second, "engine {} is not idempotent", name);
    }
}
