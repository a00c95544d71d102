//! AST definitions: interned symbols, terms, atoms, premises, clauses.

use internment::Intern;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Interned string for efficient storage and comparison
pub type Symbol = Intern<String>;

/// Counter backing [`Term::fresh_anonymous`]; every `_` in source text
/// becomes a distinct variable.
static ANON_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An interned predicate symbol: name plus arity.
///
/// Two predicate symbols are equal iff both name and arity agree, so `p/1`
/// and `p/2` are unrelated predicates at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredSym {
    pub name: Symbol,
    pub arity: usize,
}

impl PredSym {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        PredSym {
            name: Intern::new(name.into()),
            arity,
        }
    }
}

impl fmt::Display for PredSym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// A term is a variable or a constant; the language has no function symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    /// Variable: leading uppercase or underscore (X, Y, _0)
    Variable(Symbol),
    /// Constant: interned identifier (a, b, john)
    Constant(Symbol),
}

impl Term {
    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(Intern::new(name.into()))
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(Intern::new(name.into()))
    }

    /// A fresh anonymous variable, distinct from every variable created so
    /// far. The parser expands each `_` in source text through this.
    pub fn fresh_anonymous() -> Self {
        let n = ANON_COUNTER.fetch_add(1, Ordering::Relaxed);
        Term::Variable(Intern::new(format!("_{}", n)))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Constant(_))
    }

    /// Anonymous variables carry a leading underscore.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Term::Variable(v) if v.as_ref().starts_with('_'))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{}", v),
            Term::Constant(c) => write!(f, "{}", c),
        }
    }
}

/// A predicate applied to terms: `edge(a, B)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub pred: PredSym,
    pub terms: Vec<Term>,
}

impl Atom {
    /// Create an atom, deriving the predicate's arity from the term count.
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        let pred = PredSym::new(predicate, terms.len());
        Atom { pred, terms }
    }

    /// Create an atom for an existing predicate symbol.
    pub fn from_parts(pred: PredSym, terms: Vec<Term>) -> Self {
        debug_assert_eq!(pred.arity, terms.len());
        Atom { pred, terms }
    }

    /// An atom is ground when all of its terms are constants.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_constant)
    }

    /// The variables of this atom, in argument order (with repeats).
    pub fn variables(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.terms.iter().filter_map(|t| match t {
            Term::Variable(v) => Some(*v),
            Term::Constant(_) => None,
        })
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pred.name)?;
        if !self.terms.is_empty() {
            write!(f, "(")?;
            for (i, t) in self.terms.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", t)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// One element of a clause body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Premise {
    /// Positive atom: `edge(X, Y)`
    Atom(Atom),
    /// Negated atom: `not edge(X, Y)`
    Negated(Atom),
    /// Explicit unification: `X = Y`
    Unification(Term, Term),
    /// Explicit disunification: `X != Y`
    Disunification(Term, Term),
}

impl Premise {
    /// The underlying atom, for the two atom-shaped premises.
    pub fn atom(&self) -> Option<&Atom> {
        match self {
            Premise::Atom(a) | Premise::Negated(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Premise::Atom(_))
    }

    /// The variables of this premise, in source order (with repeats).
    pub fn variables(&self) -> Vec<Symbol> {
        fn term_var(t: &Term) -> Option<Symbol> {
            match t {
                Term::Variable(v) => Some(*v),
                Term::Constant(_) => None,
            }
        }
        match self {
            Premise::Atom(a) | Premise::Negated(a) => a.variables().collect(),
            Premise::Unification(l, r) | Premise::Disunification(l, r) => {
                term_var(l).into_iter().chain(term_var(r)).collect()
            }
        }
    }
}

impl fmt::Display for Premise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Premise::Atom(a) => write!(f, "{}", a),
            Premise::Negated(a) => write!(f, "not {}", a),
            Premise::Unification(l, r) => write!(f, "{} = {}", l, r),
            Premise::Disunification(l, r) => write!(f, "{} != {}", l, r),
        }
    }
}

/// A Horn clause: `head :- body.`; a fact when the body is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    pub head: Atom,
    pub body: Vec<Premise>,
}

impl Clause {
    pub fn fact(head: Atom) -> Self {
        Clause { head, body: Vec::new() }
    }

    pub fn rule(head: Atom, body: Vec<Premise>) -> Self {
        Clause { head, body }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            for (i, p) in self.body.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
        }
        write!(f, ".")
    }
}

/// Top-level statements in a Datalog program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A fact or rule: `edge(a, b).` / `tc(X, Y) :- edge(X, Y).`
    Clause(Clause),
    /// A query: `tc(X, Y)?`
    Query(Atom),
}

/// A Datalog program: clauses plus the queries embedded in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program { statements: Vec::new() }
    }

    pub fn add_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Get all clauses (facts and rules) from the program
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Clause(c) => Some(c),
            _ => None,
        })
    }

    /// Get all queries from the program
    pub fn queries(&self) -> impl Iterator<Item = &Atom> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Query(q) => Some(q),
            _ => None,
        })
    }
}
