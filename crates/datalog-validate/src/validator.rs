//! Clause-set validation
//!
//! Checks the invariants the evaluators rely on and produces the EDB/IDB
//! partition plus the stratification. Explicit unification and
//! disunification are opt-in; the magic-set engine validates without them.

use crate::stratification::{stratify, Stratification};
use datalog_ast::{Atom, Clause, PredSym, Premise, Symbol, Term};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Predicate names starting with this prefix are reserved for generated
/// relations (magic-set mangling) and rejected in source programs.
pub const RESERVED_PREFIX: char = '%';

/// Errors raised while validating a clause set or a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A variable that the body can never bind (head variable outside the
    /// body, or a negation/disunification over an unbound variable).
    UnsafeVariable { clause: String, variable: Symbol },
    /// The dependency graph has a cycle through negation.
    Unstratified { predicates: Vec<PredSym> },
    /// A unification with an anonymous side can never constrain anything.
    UselessUnification { clause: String },
    /// A query names a predicate the program never mentions.
    UnknownPredicate { pred: PredSym },
    /// One predicate name used at two different arities.
    ArityMismatch {
        name: Symbol,
        expected: usize,
        found: usize,
    },
    /// A feature the current engine configuration does not accept.
    DisallowedFeature {
        clause: String,
        feature: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnsafeVariable { clause, variable } => {
                write!(
                    f,
                    "unsafe variable {} in '{}': it can never be bound",
                    variable, clause
                )
            }
            ValidationError::Unstratified { predicates } => {
                let names: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
                write!(
                    f,
                    "program is not stratifiable: cycle through negation involving {}",
                    names.join(", ")
                )
            }
            ValidationError::UselessUnification { clause } => {
                write!(
                    f,
                    "useless (dis)unification with anonymous variable in '{}'",
                    clause
                )
            }
            ValidationError::UnknownPredicate { pred } => {
                write!(f, "unknown predicate {}", pred)
            }
            ValidationError::ArityMismatch {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "predicate {} used with arity {} but previously with arity {}",
                    name, found, expected
                )
            }
            ValidationError::DisallowedFeature { clause, feature } => {
                write!(f, "{} is not allowed here (in '{}')", feature, clause)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validated program: rules, initial facts, the EDB/IDB partition and the
/// stratification. Immutable once built.
#[derive(Debug, Clone)]
pub struct ValidProgram {
    rules: Vec<Clause>,
    initial_facts: Vec<Atom>,
    edb: HashSet<PredSym>,
    idb: HashSet<PredSym>,
    stratification: Stratification,
}

impl ValidProgram {
    /// Rules (clauses with a non-empty body).
    pub fn rules(&self) -> &[Clause] {
        &self.rules
    }

    /// Ground heads of body-less clauses: EDB facts plus explicit IDB facts.
    pub fn initial_facts(&self) -> &[Atom] {
        &self.initial_facts
    }

    pub fn edb_predicates(&self) -> &HashSet<PredSym> {
        &self.edb
    }

    pub fn idb_predicates(&self) -> &HashSet<PredSym> {
        &self.idb
    }

    pub fn is_edb(&self, pred: PredSym) -> bool {
        self.edb.contains(&pred)
    }

    pub fn is_idb(&self, pred: PredSym) -> bool {
        self.idb.contains(&pred)
    }

    pub fn stratum_of(&self, pred: PredSym) -> usize {
        self.stratification.stratum_of(pred)
    }

    pub fn num_strata(&self) -> usize {
        self.stratification.num_strata
    }

    /// Check a query atom against the program's predicate vocabulary.
    pub fn validate_query(&self, query: &Atom) -> Result<(), ValidationError> {
        if self.edb.contains(&query.pred) || self.idb.contains(&query.pred) {
            return Ok(());
        }
        if let Some(known) = self
            .edb
            .iter()
            .chain(self.idb.iter())
            .find(|p| p.name == query.pred.name)
        {
            return Err(ValidationError::ArityMismatch {
                name: query.pred.name,
                expected: known.arity,
                found: query.pred.arity,
            });
        }
        Err(ValidationError::UnknownPredicate { pred: query.pred })
    }
}

/// Validator with feature toggles, builder style.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatalogValidator {
    allow_unification: bool,
    allow_disunification: bool,
    allow_reserved_names: bool,
}

impl DatalogValidator {
    pub fn new() -> Self {
        DatalogValidator::default()
    }

    /// Accept `X = Y` premises in rule bodies.
    pub fn with_unification(mut self) -> Self {
        self.allow_unification = true;
        self
    }

    /// Accept `X != Y` premises in rule bodies.
    pub fn with_disunification(mut self) -> Self {
        self.allow_disunification = true;
        self
    }

    /// Accept predicate names under the reserved `%` prefix. Only the
    /// magic-set rewriter validates its own generated programs with this.
    pub fn with_reserved_names(mut self) -> Self {
        self.allow_reserved_names = true;
        self
    }

    pub fn validate(&self, clauses: &[Clause]) -> Result<ValidProgram, ValidationError> {
        self.check_arities(clauses)?;
        if !self.allow_reserved_names {
            self.check_reserved_names(clauses)?;
        }

        for clause in clauses {
            self.check_clause(clause)?;
        }

        // Partition: IDB predicates head at least one rule; everything else
        // (fact-only predicates, predicates only mentioned in bodies) is EDB.
        let mut idb = HashSet::new();
        for clause in clauses {
            if !clause.is_fact() {
                idb.insert(clause.head.pred);
            }
        }
        let mut edb = HashSet::new();
        let mut note = |pred: PredSym| {
            if !idb.contains(&pred) {
                edb.insert(pred);
            }
        };
        for clause in clauses {
            note(clause.head.pred);
            for premise in &clause.body {
                if let Some(atom) = premise.atom() {
                    note(atom.pred);
                }
            }
        }

        let mut rules = Vec::new();
        let mut initial_facts = Vec::new();
        for clause in clauses {
            if clause.is_fact() {
                initial_facts.push(clause.head.clone());
            } else {
                rules.push(clause.clone());
            }
        }

        let stratification = stratify(&rules)?;

        Ok(ValidProgram {
            rules,
            initial_facts,
            edb,
            idb,
            stratification,
        })
    }

    fn check_arities(&self, clauses: &[Clause]) -> Result<(), ValidationError> {
        let mut arities: HashMap<Symbol, usize> = HashMap::new();
        let mut check = |pred: PredSym| match arities.get(&pred.name).copied() {
            Some(expected) if expected != pred.arity => Err(ValidationError::ArityMismatch {
                name: pred.name,
                expected,
                found: pred.arity,
            }),
            _ => {
                arities.insert(pred.name, pred.arity);
                Ok(())
            }
        };
        for clause in clauses {
            check(clause.head.pred)?;
            for premise in &clause.body {
                if let Some(atom) = premise.atom() {
                    check(atom.pred)?;
                }
            }
        }
        Ok(())
    }

    fn check_reserved_names(&self, clauses: &[Clause]) -> Result<(), ValidationError> {
        let reserved = |pred: PredSym| pred.name.as_ref().starts_with(RESERVED_PREFIX);
        for clause in clauses {
            let mut preds = vec![clause.head.pred];
            preds.extend(clause.body.iter().filter_map(|p| p.atom()).map(|a| a.pred));
            if preds.into_iter().any(reserved) {
                return Err(ValidationError::DisallowedFeature {
                    clause: clause.to_string(),
                    feature: "predicate name with the reserved '%' prefix",
                });
            }
        }
        Ok(())
    }

    fn check_clause(&self, clause: &Clause) -> Result<(), ValidationError> {
        // Anonymous variables never occur twice, so one in the head could
        // never be bound by the body.
        for term in &clause.head.terms {
            if term.is_anonymous() {
                return Err(ValidationError::UnsafeVariable {
                    clause: clause.to_string(),
                    variable: match term {
                        Term::Variable(v) => *v,
                        Term::Constant(_) => unreachable!("constants are never anonymous"),
                    },
                });
            }
        }

        for premise in &clause.body {
            match premise {
                Premise::Unification(l, r) => {
                    if !self.allow_unification {
                        return Err(ValidationError::DisallowedFeature {
                            clause: clause.to_string(),
                            feature: "explicit unification",
                        });
                    }
                    if l.is_anonymous() || r.is_anonymous() {
                        return Err(ValidationError::UselessUnification {
                            clause: clause.to_string(),
                        });
                    }
                }
                Premise::Disunification(_, _) if !self.allow_disunification => {
                    return Err(ValidationError::DisallowedFeature {
                        clause: clause.to_string(),
                        feature: "explicit disunification",
                    });
                }
                _ => {}
            }
        }

        self.check_boundedness(clause)
    }

    /// Fixpoint over the body: positive atoms bind their variables, a
    /// unification binds its free side once the other side is a constant or
    /// already bound. Head variables and the variables of negations and
    /// disunifications must all end up bound.
    fn check_boundedness(&self, clause: &Clause) -> Result<(), ValidationError> {
        let mut bound: HashSet<Symbol> = HashSet::new();
        for premise in &clause.body {
            if let Premise::Atom(atom) = premise {
                bound.extend(atom.variables());
            }
        }

        let is_resolved = |t: &Term, bound: &HashSet<Symbol>| match t {
            Term::Constant(_) => true,
            Term::Variable(v) => bound.contains(v),
        };

        let mut changed = true;
        while changed {
            changed = false;
            for premise in &clause.body {
                if let Premise::Unification(l, r) = premise {
                    if is_resolved(l, &bound) || is_resolved(r, &bound) {
                        for term in [l, r] {
                            if let Term::Variable(v) = term {
                                changed |= bound.insert(*v);
                            }
                        }
                    }
                }
            }
        }

        let unsafe_var = |vars: Vec<Symbol>| vars.into_iter().find(|v| !bound.contains(v));

        if let Some(variable) = unsafe_var(clause.head.variables().collect()) {
            return Err(ValidationError::UnsafeVariable {
                clause: clause.to_string(),
                variable,
            });
        }
        for premise in &clause.body {
            let must_bind = match premise {
                Premise::Negated(_) | Premise::Disunification(_, _) => premise.variables(),
                _ => continue,
            };
            if let Some(variable) = unsafe_var(must_bind) {
                return Err(ValidationError::UnsafeVariable {
                    clause: clause.to_string(),
                    variable,
                });
            }
        }
        Ok(())
    }
}
