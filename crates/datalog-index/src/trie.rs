//! Concurrent derivation-fingerprint trie
//!
//! A fact's fingerprint is its predicate followed by its constant sequence.
//! `add` returns `true` for exactly one caller per distinct fact across all
//! threads; the atomic swap on the leaf node is the linearization point for
//! "who derived this first".

use dashmap::DashMap;
use datalog_ast::{Atom, PredSym, Symbol, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Node {
    present: AtomicBool,
    children: DashMap<Symbol, Arc<Node>>,
}

/// Concurrent set of ground-atom fingerprints, keyed per level by constant.
#[derive(Default)]
pub struct RedundancyTrie {
    roots: DashMap<PredSym, Arc<Node>>,
}

impl RedundancyTrie {
    pub fn new() -> Self {
        RedundancyTrie::default()
    }

    /// Record `fact`; `true` means it was absent and the caller proceeds,
    /// `false` means another derivation got there first.
    pub fn add(&self, fact: &Atom) -> bool {
        let mut node = Arc::clone(self.roots.entry(fact.pred).or_default().value());
        for term in &fact.terms {
            let constant = match term {
                Term::Constant(c) => *c,
                Term::Variable(_) => {
                    panic!("non-ground atom reached the redundancy trie: {}", fact)
                }
            };
            let next = Arc::clone(node.children.entry(constant).or_default().value());
            node = next;
        }
        !node.present.swap(true, Ordering::SeqCst)
    }

    /// Membership check without recording; test support.
    pub fn contains(&self, fact: &Atom) -> bool {
        let Some(root) = self.roots.get(&fact.pred) else {
            return false;
        };
        let mut node = Arc::clone(root.value());
        drop(root);
        for term in &fact.terms {
            let constant = match term {
                Term::Constant(c) => *c,
                Term::Variable(_) => return false,
            };
            let Some(child) = node.children.get(&constant).map(|c| Arc::clone(c.value())) else {
                return false;
            };
            node = child;
        }
        node.present.load(Ordering::SeqCst)
    }
}
