//! Indexed storage of ground atoms
//!
//! Facts are sharded by predicate in a concurrent map; each shard keeps the
//! facts in insertion order next to a posting list per `(position,
//! constant)` pair. A pattern lookup picks the shortest posting list among
//! its bound positions and filters it, falling back to a scan when every
//! position is free.
//!
//! Concurrent `add` and lookups are permitted: lookups snapshot matching
//! facts under the shard's read lock, so a fact added before the lookup
//! began is visible and one added concurrently may or may not be.

use dashmap::DashMap;
use datalog_ast::{Atom, PredSym, Symbol, Term};
use datalog_core::Substitution;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Shard {
    facts: Vec<Atom>,
    seen: HashSet<Atom>,
    /// Posting lists: positions into `facts`, keyed by argument slot and
    /// the constant stored there.
    by_arg: HashMap<(usize, Symbol), Vec<u32>>,
}

impl Shard {
    fn add(&mut self, fact: &Atom) -> bool {
        if !self.seen.insert(fact.clone()) {
            return false;
        }
        let idx = self.facts.len() as u32;
        for (position, term) in fact.terms.iter().enumerate() {
            match term {
                Term::Constant(c) => self.by_arg.entry((position, *c)).or_default().push(idx),
                Term::Variable(_) => panic!("non-ground atom added to the fact indexer: {}", fact),
            }
        }
        self.facts.push(fact.clone());
        true
    }

    fn matching(&self, resolved: &[Option<Symbol>]) -> Vec<Atom> {
        // Shortest posting list among the bound positions.
        let mut best: Option<&Vec<u32>> = None;
        for (position, slot) in resolved.iter().enumerate() {
            if let Some(c) = slot {
                match self.by_arg.get(&(position, *c)) {
                    // No fact carries this constant here at all.
                    None => return Vec::new(),
                    Some(list) => {
                        if best.map_or(true, |b| list.len() < b.len()) {
                            best = Some(list);
                        }
                    }
                }
            }
        }

        let matches = |fact: &Atom| {
            resolved
                .iter()
                .zip(fact.terms.iter())
                .all(|(slot, term)| match (slot, term) {
                    (Some(c), Term::Constant(a)) => c == a,
                    (None, _) => true,
                    (Some(_), Term::Variable(_)) => false,
                })
        };

        match best {
            Some(list) => list
                .iter()
                .map(|&i| &self.facts[i as usize])
                .filter(|f| matches(f))
                .cloned()
                .collect(),
            None => self.facts.iter().filter(|f| matches(f)).cloned().collect(),
        }
    }
}

/// Concurrent set of ground atoms with per-predicate argument indexes.
#[derive(Default)]
pub struct FactIndexer {
    shards: DashMap<PredSym, RwLock<Shard>>,
}

impl FactIndexer {
    pub fn new() -> Self {
        FactIndexer::default()
    }

    /// Idempotent insert; returns whether the set changed.
    pub fn add(&self, fact: &Atom) -> bool {
        let shard = self.shards.entry(fact.pred).or_default();
        let mut guard = shard.write();
        guard.add(fact)
    }

    pub fn contains(&self, fact: &Atom) -> bool {
        self.shards
            .get(&fact.pred)
            .map_or(false, |shard| shard.read().seen.contains(fact))
    }

    /// Ground atoms compatible with `pattern` under `subst`: explicit
    /// constants and already-bound variables filter, free variables are
    /// wildcards. Repeated free variables are *not* checked here; callers
    /// that care unify against each result.
    pub fn index_into(&self, pattern: &Atom, subst: &Substitution) -> Vec<Atom> {
        let resolved: Vec<Option<Symbol>> = pattern
            .terms
            .iter()
            .map(|t| match subst.apply(t) {
                Term::Constant(c) => Some(c),
                Term::Variable(_) => None,
            })
            .collect();
        self.index_into_resolved(pattern.pred, &resolved)
    }

    /// Lookup fast path for callers that already resolved the pattern's
    /// arguments to `Some(constant)` / `None` slots.
    pub fn index_into_resolved(&self, pred: PredSym, resolved: &[Option<Symbol>]) -> Vec<Atom> {
        match self.shards.get(&pred) {
            Some(shard) => shard.read().matching(resolved),
            None => Vec::new(),
        }
    }

    /// All facts of one predicate.
    pub fn facts_of(&self, pred: PredSym) -> Vec<Atom> {
        self.shards
            .get(&pred)
            .map(|shard| shard.read().facts.clone())
            .unwrap_or_default()
    }

    /// Predicates with at least one fact.
    pub fn predicates(&self) -> Vec<PredSym> {
        self.shards.iter().map(|entry| *entry.key()).collect()
    }

    /// Every stored fact. Snapshot; intended for result collection.
    pub fn all_facts(&self) -> Vec<Atom> {
        self.shards
            .iter()
            .flat_map(|entry| entry.value().read().facts.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|entry| entry.value().read().facts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn cst(name: &str) -> Term {
        Term::constant(name)
    }

    fn fact(pred: &str, terms: Vec<&str>) -> Atom {
        Atom::new(pred, terms.into_iter().map(Term::constant).collect())
    }

    #[test]
    fn test_add_is_idempotent() {
        let index = FactIndexer::new();
        assert!(index.add(&fact("edge", vec!["a", "b"])));
        assert!(!index.add(&fact("edge", vec!["a", "b"])));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_lookup_by_bound_argument() {
        let index = FactIndexer::new();
        index.add(&fact("edge", vec!["a", "b"]));
        index.add(&fact("edge", vec!["b", "c"]));
        index.add(&fact("edge", vec!["a", "c"]));

        let pred = PredSym::new("edge", 2);
        let a = match cst("a") {
            Term::Constant(c) => c,
            _ => unreachable!(),
        };
        let from_a = index.index_into_resolved(pred, &[Some(a), None]);
        assert_eq!(from_a.len(), 2);

        let all = index.index_into_resolved(pred, &[None, None]);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_lookup_with_substitution() {
        let index = FactIndexer::new();
        index.add(&fact("edge", vec!["a", "b"]));
        index.add(&fact("edge", vec!["b", "c"]));

        let mut subst = Substitution::new();
        let pattern = Atom::new("edge", vec![Term::variable("X"), Term::variable("Y")]);
        assert_eq!(index.index_into(&pattern, &subst).len(), 2);

        // Binding X narrows the lookup.
        match Term::variable("X") {
            Term::Variable(v) => subst.bind(v, cst("b")),
            _ => unreachable!(),
        }
        let narrowed = index.index_into(&pattern, &subst);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0], fact("edge", vec!["b", "c"]));
    }

    #[test]
    fn test_unknown_constant_matches_nothing() {
        let index = FactIndexer::new();
        index.add(&fact("edge", vec!["a", "b"]));
        let pred = PredSym::new("edge", 2);
        let z = match cst("z") {
            Term::Constant(c) => c,
            _ => unreachable!(),
        };
        assert!(index.index_into_resolved(pred, &[Some(z), None]).is_empty());
    }

    #[test]
    fn test_zero_arity_facts() {
        let index = FactIndexer::new();
        let done = fact("done", vec![]);
        assert!(index.add(&done));
        assert!(!index.add(&done));
        assert!(index.contains(&done));
        assert_eq!(index.index_into_resolved(done.pred, &[]).len(), 1);
    }

    #[test]
    fn test_concurrent_adds_keep_set_semantics() {
        let index = Arc::new(FactIndexer::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let index = Arc::clone(&index);
            handles.push(thread::spawn(move || {
                // Every thread inserts the same 100 facts.
                for i in 0..100 {
                    index.add(&fact("n", vec![&format!("c{}", i)]));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(index.len(), 100);
    }
}
