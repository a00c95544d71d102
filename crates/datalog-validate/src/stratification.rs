//! Stratification analysis for programs with negation
//!
//! Assigns each predicate to a stratum (layer) such that every negative
//! dependency points strictly downward. Predicates in higher strata may
//! consult the negation of lower-stratum predicates, whose extent is fully
//! determined by the time the higher stratum runs.
//!
//! # Algorithm
//!
//! 1. Build the predicate dependency graph over arena indices (one edge from
//!    each rule head to each body predicate, labelled negative for `not`)
//! 2. Run Tarjan's SCC algorithm; a negative edge inside a component is a
//!    cycle through negation and rejects the program
//! 3. Walk the components in the emission order (dependencies first) and
//!    assign `stratum = max(dep stratum + 1 for negative, dep stratum for
//!    positive)`

use crate::validator::ValidationError;
use datalog_ast::{Clause, PredSym, Premise};
use std::collections::HashMap;

/// Result of stratification analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stratification {
    /// Map from predicate to stratum number (0 = bottom stratum)
    pub strata: HashMap<PredSym, usize>,
    /// Total number of strata
    pub num_strata: usize,
}

impl Stratification {
    /// Stratum of a predicate; predicates outside the rule graph (pure EDB)
    /// sit at the bottom.
    pub fn stratum_of(&self, pred: PredSym) -> usize {
        self.strata.get(&pred).copied().unwrap_or(0)
    }
}

/// Dependency graph over arena indices.
struct DependencyGraph {
    preds: Vec<PredSym>,
    index_of: HashMap<PredSym, usize>,
    /// edges[from] = (to, negative?)
    edges: Vec<Vec<(usize, bool)>>,
}

impl DependencyGraph {
    fn new() -> Self {
        DependencyGraph {
            preds: Vec::new(),
            index_of: HashMap::new(),
            edges: Vec::new(),
        }
    }

    fn node(&mut self, pred: PredSym) -> usize {
        if let Some(&i) = self.index_of.get(&pred) {
            return i;
        }
        let i = self.preds.len();
        self.preds.push(pred);
        self.index_of.insert(pred, i);
        self.edges.push(Vec::new());
        i
    }

    fn add_edge(&mut self, from: PredSym, to: PredSym, negative: bool) {
        let f = self.node(from);
        let t = self.node(to);
        self.edges[f].push((t, negative));
    }
}

fn build_dependency_graph(rules: &[Clause]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for rule in rules {
        graph.node(rule.head.pred);
        for premise in &rule.body {
            match premise {
                Premise::Atom(atom) => graph.add_edge(rule.head.pred, atom.pred, false),
                Premise::Negated(atom) => graph.add_edge(rule.head.pred, atom.pred, true),
                // (Dis)unifications create no predicate dependencies.
                Premise::Unification(_, _) | Premise::Disunification(_, _) => {}
            }
        }
    }
    graph
}

/// Tarjan's strongly connected components over the arena.
///
/// Components are emitted dependencies-first: when a component is pushed,
/// every distinct component reachable from it has already been pushed.
struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl<'g> Tarjan<'g> {
    fn run(graph: &'g DependencyGraph) -> Vec<Vec<usize>> {
        let n = graph.preds.len();
        let mut t = Tarjan {
            graph,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        };
        for v in 0..n {
            if t.index[v].is_none() {
                t.strongconnect(v);
            }
        }
        t.components
    }

    fn strongconnect(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        for &(w, _) in &self.graph.edges[v] {
            match self.index[w] {
                None => {
                    self.strongconnect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if self.lowlink[v] == self.index[v].unwrap_or(0) {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().expect("tarjan stack underflow");
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

/// Stratify a rule set. Fails if a cycle through negation exists.
pub fn stratify(rules: &[Clause]) -> Result<Stratification, ValidationError> {
    if rules.is_empty() {
        return Ok(Stratification {
            strata: HashMap::new(),
            num_strata: 1,
        });
    }

    let graph = build_dependency_graph(rules);
    let components = Tarjan::run(&graph);

    // Which component each node belongs to.
    let mut component_of = vec![0usize; graph.preds.len()];
    for (c, members) in components.iter().enumerate() {
        for &v in members {
            component_of[v] = c;
        }
    }

    // Components arrive dependencies-first, so a single pass suffices.
    let mut component_stratum = vec![0usize; components.len()];
    for (c, members) in components.iter().enumerate() {
        let mut stratum = 0;
        for &v in members {
            for &(w, negative) in &graph.edges[v] {
                let target = component_of[w];
                if target == c {
                    if negative {
                        let cycle = members.iter().map(|&m| graph.preds[m]).collect();
                        return Err(ValidationError::Unstratified { predicates: cycle });
                    }
                    continue;
                }
                let required = component_stratum[target] + usize::from(negative);
                stratum = stratum.max(required);
            }
        }
        component_stratum[c] = stratum;
    }

    let mut strata = HashMap::new();
    let mut num_strata = 1;
    for (c, members) in components.iter().enumerate() {
        for &v in members {
            strata.insert(graph.preds[v], component_stratum[c]);
        }
        num_strata = num_strata.max(component_stratum[c] + 1);
    }

    Ok(Stratification { strata, num_strata })
}
