//! Unification over variable/constant terms
//!
//! First-order unification specialized to a function-symbol-free term
//! language: a variable may bind to any term, constants unify only with
//! equal constants. No occurs check is needed because terms cannot nest.
//!
//! # Example
//!
//! ```ignore
//! // Unify edge(X, b) with edge(a, Y)
//! // Result: X=a, Y=b
//! let ok = unify_atoms(&pattern1, &pattern2, &mut subst);
//! ```

use datalog_ast::{Atom, Symbol, Term};
use std::collections::HashMap;

/// A substitution maps variables to terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    bindings: HashMap<Symbol, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution {
            bindings: HashMap::new(),
        }
    }

    /// Bind a variable to a term
    pub fn bind(&mut self, var: Symbol, term: Term) {
        self.bindings.insert(var, term);
    }

    /// Get the binding for a variable
    pub fn get(&self, var: &Symbol) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over bindings
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Term)> {
        self.bindings.iter()
    }

    /// Resolve a term, following binding chains transitively.
    pub fn apply(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => match self.bindings.get(v) {
                Some(bound) => self.apply(bound),
                None => *term,
            },
            Term::Constant(_) => *term,
        }
    }

    /// Apply the substitution to every term of an atom.
    pub fn apply_atom(&self, atom: &Atom) -> Atom {
        Atom::from_parts(atom.pred, atom.terms.iter().map(|t| self.apply(t)).collect())
    }
}

/// Unify two terms under an existing partial binding, extending it in place.
/// Returns `false` and leaves the substitution unspecified on conflict;
/// callers that need backtracking clone before calling.
pub fn unify(t1: &Term, t2: &Term, subst: &mut Substitution) -> bool {
    let r1 = subst.apply(t1);
    let r2 = subst.apply(t2);

    match (r1, r2) {
        (Term::Constant(a), Term::Constant(b)) => a == b,
        (Term::Variable(a), Term::Variable(b)) if a == b => true,
        (Term::Variable(v), other) | (other, Term::Variable(v)) => {
            subst.bind(v, other);
            true
        }
    }
}

/// Unify two atoms position by position.
pub fn unify_atoms(a1: &Atom, a2: &Atom, subst: &mut Substitution) -> bool {
    if a1.pred != a2.pred {
        return false;
    }
    a1.terms
        .iter()
        .zip(a2.terms.iter())
        .all(|(t1, t2)| unify(t1, t2, subst))
}

/// `t1 != t2` holds only when both sides resolve to distinct constants.
/// A non-ground side means the disunification cannot be decided; the
/// enclosing clause evaluation treats that as failure.
pub fn disunify(t1: &Term, t2: &Term, subst: &Substitution) -> bool {
    match (subst.apply(t1), subst.apply(t2)) {
        (Term::Constant(a), Term::Constant(b)) => a != b,
        _ => false,
    }
}
