//! Adornments
//!
//! An adornment marks each argument position of a predicate as bound or
//! free at its call site. Rules are adorned left to right (the sideways
//! information passing strategy): an argument is bound if it is a constant
//! or a variable bound by the head's bound positions or an earlier body
//! atom; after an atom is passed, its variables are bound.

use datalog_ast::{Atom, Clause, PredSym, Premise, Symbol, Term};
use std::collections::HashSet;
use std::fmt;

/// A predicate together with a per-argument bound/free pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdornedPred {
    pub pred: PredSym,
    pub adornment: Vec<bool>,
}

impl AdornedPred {
    pub fn new(pred: PredSym, adornment: Vec<bool>) -> Self {
        debug_assert_eq!(pred.arity, adornment.len());
        AdornedPred { pred, adornment }
    }

    /// The adornment a query atom induces: constants bound, variables free.
    pub fn from_query(query: &Atom) -> Self {
        let adornment = query.terms.iter().map(Term::is_constant).collect();
        AdornedPred::new(query.pred, adornment)
    }

    pub fn bound_count(&self) -> usize {
        self.adornment.iter().filter(|&&b| b).count()
    }
}

impl fmt::Display for AdornedPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.pred.name)?;
        for &b in &self.adornment {
            write!(f, "{}", if b { 'b' } else { 'f' })?;
        }
        write!(f, "]")
    }
}

/// A body atom with the adornment induced by its position in the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdornedAtom {
    pub pred: AdornedPred,
    pub atom: Atom,
}

impl AdornedAtom {
    /// The terms at this atom's bound positions, in order.
    pub fn bound_args(&self) -> Vec<Term> {
        self.atom
            .terms
            .iter()
            .zip(self.pred.adornment.iter())
            .filter(|(_, &bound)| bound)
            .map(|(t, _)| *t)
            .collect()
    }
}

/// A rule with an adorned head and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdornedRule {
    pub head: AdornedAtom,
    pub body: Vec<AdornedAtom>,
}

/// Adorn a rule for one head adornment, walking the body left to right.
/// Only positive bodies reach this point; the magic-set engine rejects
/// negation and explicit (dis)unification at `init`.
pub fn adorn_rule(head_adornment: &[bool], rule: &Clause) -> AdornedRule {
    let mut bound: HashSet<Symbol> = HashSet::new();
    for (term, &is_bound) in rule.head.terms.iter().zip(head_adornment.iter()) {
        if is_bound {
            if let Term::Variable(v) = term {
                bound.insert(*v);
            }
        }
    }

    let mut body = Vec::new();
    for premise in &rule.body {
        let atom = match premise {
            Premise::Atom(atom) => atom,
            _ => unreachable!("magic-set rewriting requires positive rule bodies"),
        };
        let adornment: Vec<bool> = atom
            .terms
            .iter()
            .map(|t| match t {
                Term::Constant(_) => true,
                Term::Variable(v) => bound.contains(v),
            })
            .collect();
        body.push(AdornedAtom {
            pred: AdornedPred::new(atom.pred, adornment),
            atom: atom.clone(),
        });
        bound.extend(atom.variables());
    }

    AdornedRule {
        head: AdornedAtom {
            pred: AdornedPred::new(rule.head.pred, head_adornment.to_vec()),
            atom: rule.head.clone(),
        },
        body,
    }
}
