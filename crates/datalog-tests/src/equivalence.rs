//! Property-based engine equivalence
//!
//! Generates random edge relations (and random query shapes) and checks
//! that every engine variant computes the same answer sets.

use crate::harness::{all_engines, bottom_up_engines, clauses, query};
use datalog_eval::FactSet;
use proptest::prelude::*;

const NODES: &[&str] = &["a", "b", "c", "d", "e", "f"];

fn edges_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..NODES.len(), 0..NODES.len()), 0..12)
}

fn tc_source(edges: &[(usize, usize)]) -> String {
    let mut source = String::from("tc(X,Y) :- edge(X,Y). tc(X,Y) :- edge(X,Z), tc(Z,Y). ");
    // The relation must be non-empty for `edge` to exist as a predicate.
    source.push_str("edge(a, a_sink). ");
    for (from, to) in edges {
        source.push_str(&format!("edge({}, {}). ", NODES[*from], NODES[*to]));
    }
    source
}

fn answers(engines: Vec<(&'static str, Box<dyn datalog_eval::DatalogEngine>)>, source: &str, q: &str) -> Vec<FactSet> {
    let program = clauses(source);
    let q = query(q);
    engines
        .into_iter()
        .map(|(name, mut engine)| {
            engine
                .init(&program)
                .unwrap_or_else(|e| panic!("{}: init failed: {}", name, e));
            engine
                .query(&q)
                .unwrap_or_else(|e| panic!("{}: query failed: {}", name, e))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_engines_agree_on_transitive_closure(edges in edges_strategy()) {
        let source = tc_source(&edges);
        let results = answers(all_engines(), &source, "tc(X,Y)?");
        for window in results.windows(2) {
            prop_assert_eq!(&window[0], &window[1]);
        }
    }

    #[test]
    fn test_engines_agree_on_bound_queries(edges in edges_strategy(), node in 0..NODES.len()) {
        let source = tc_source(&edges);
        let q = format!("tc({},Y)?", NODES[node]);
        let results = answers(all_engines(), &source, &q);
        for window in results.windows(2) {
            prop_assert_eq!(&window[0], &window[1]);
        }
    }

    #[test]
    fn test_engines_agree_under_disunification(edges in edges_strategy()) {
        let mut source = tc_source(&edges);
        source.push_str("noncycle(X,Y) :- X != Y, tc(X,Y). ");
        let results = answers(bottom_up_engines(), &source, "noncycle(X,Y)?");
        for window in results.windows(2) {
            prop_assert_eq!(&window[0], &window[1]);
        }
    }
}
