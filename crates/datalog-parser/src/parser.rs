//! Statement parser over the token stream.

use chumsky::prelude::*;
use chumsky::stream::Stream;
use std::fmt;

use crate::token::{lexer, LexError, Span, Token};
use datalog_ast::{Atom, Clause, Premise, Program, Statement, Term};

type ParserError = Simple<Token>;

#[derive(Debug, Clone)]
pub enum ParseError {
    Lex(LexError),
    Parse(ParserError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "lex error at {:?}: {}", e.span(), e),
            ParseError::Parse(e) => write!(f, "parse error at {:?}: {}", e.span(), e),
        }
    }
}

impl std::error::Error for ParseError {}

fn term() -> impl Parser<Token, Term, Error = ParserError> + Clone {
    select! {
        Token::Variable(name) => {
            if name == "_" {
                Term::fresh_anonymous()
            } else {
                Term::variable(name)
            }
        },
        Token::Ident(name) => Term::constant(name),
    }
    .labelled("term")
}

fn atom() -> impl Parser<Token, Atom, Error = ParserError> + Clone {
    select! { Token::Ident(name) => name }
        .then(
            term()
                .separated_by(just(Token::Comma))
                .at_least(1)
                .delimited_by(just(Token::LParen), just(Token::RParen))
                .or_not(),
        )
        .map(|(name, terms)| Atom::new(name, terms.unwrap_or_default()))
        .labelled("atom")
}

fn premise() -> impl Parser<Token, Premise, Error = ParserError> + Clone {
    let negated = just(Token::Not).ignore_then(atom()).map(Premise::Negated);

    let comparison = term()
        .then(choice((
            just(Token::Eq).to(false),
            just(Token::Neq).to(true),
        )))
        .then(term())
        .map(|((left, negated), right)| {
            if negated {
                Premise::Disunification(left, right)
            } else {
                Premise::Unification(left, right)
            }
        });

    choice((negated, comparison, atom().map(Premise::Atom))).labelled("premise")
}

fn statement() -> impl Parser<Token, Statement, Error = ParserError> + Clone {
    let rule = atom()
        .then_ignore(just(Token::RuleSep))
        .then(premise().separated_by(just(Token::Comma)).at_least(1))
        .then_ignore(just(Token::Dot))
        .map(|(head, body)| Statement::Clause(Clause::rule(head, body)));

    let fact = atom()
        .then_ignore(just(Token::Dot))
        .map(|head| Statement::Clause(Clause::fact(head)));

    let query = atom()
        .then_ignore(just(Token::Question))
        .map(Statement::Query);

    choice((rule, fact, query)).labelled("statement")
}

fn program() -> impl Parser<Token, Program, Error = ParserError> + Clone {
    statement()
        .repeated()
        .map(|statements| Program { statements })
        .then_ignore(end())
        .labelled("program")
}

fn parse_with<T>(
    parser: impl Parser<Token, T, Error = ParserError>,
    input: &str,
) -> Result<T, Vec<ParseError>> {
    let tokens = lexer()
        .parse(input)
        .map_err(|errors| errors.into_iter().map(ParseError::Lex).collect::<Vec<_>>())?;
    let len = input.chars().count();
    let eoi: Span = len..len + 1;
    parser
        .parse(Stream::from_iter(eoi, tokens.into_iter()))
        .map_err(|errors| errors.into_iter().map(ParseError::Parse).collect())
}

/// Parse a Datalog program from text
pub fn parse_program(input: &str) -> Result<Program, Vec<ParseError>> {
    parse_with(program(), input)
}

/// Parse a single query atom, with or without the trailing `?`.
pub fn parse_query(input: &str) -> Result<Atom, Vec<ParseError>> {
    let query = atom()
        .then_ignore(just(Token::Question).or_not())
        .then_ignore(end());
    parse_with(query, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Term {
        Term::variable(name)
    }

    fn cst(name: &str) -> Term {
        Term::constant(name)
    }

    #[test]
    fn test_parse_fact() {
        let program = parse_program("edge(a, b).").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Clause(Clause::fact(Atom::new(
                "edge",
                vec![cst("a"), cst("b")]
            )))]
        );
    }

    #[test]
    fn test_parse_zero_arity_fact() {
        let program = parse_program("done.").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Clause(Clause::fact(Atom::new("done", vec![])))]
        );
    }

    #[test]
    fn test_parse_rule() {
        let program = parse_program("tc(X, Y) :- edge(X, Z), tc(Z, Y).").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Clause(Clause::rule(
                Atom::new("tc", vec![var("X"), var("Y")]),
                vec![
                    Premise::Atom(Atom::new("edge", vec![var("X"), var("Z")])),
                    Premise::Atom(Atom::new("tc", vec![var("Z"), var("Y")])),
                ],
            ))]
        );
    }

    #[test]
    fn test_parse_unification_and_disunification() {
        let program = parse_program("cycle(X) :- X = Y, tc(X, Y). noncycle(X, Y) :- X != Y, tc(X, Y).")
            .unwrap();
        let clauses: Vec<_> = program.clauses().collect();
        assert_eq!(
            clauses[0].body[0],
            Premise::Unification(var("X"), var("Y"))
        );
        assert_eq!(
            clauses[1].body[0],
            Premise::Disunification(var("X"), var("Y"))
        );
    }

    #[test]
    fn test_parse_constant_unification() {
        let program = parse_program("beginsAtC(X, Y) :- tc(X, Y), c = X.").unwrap();
        let clause = program.clauses().next().unwrap();
        assert_eq!(clause.body[1], Premise::Unification(cst("c"), var("X")));
    }

    #[test]
    fn test_parse_negation() {
        let program = parse_program("open(X) :- node(X), not blocked(X).").unwrap();
        let clause = program.clauses().next().unwrap();
        assert_eq!(
            clause.body[1],
            Premise::Negated(Atom::new("blocked", vec![var("X")]))
        );
    }

    #[test]
    fn test_parse_query() {
        let program = parse_program("tc(X, Y)?").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Query(Atom::new("tc", vec![var("X"), var("Y")]))]
        );
    }

    #[test]
    fn test_parse_zero_arity_query() {
        let program = parse_program("p?").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Query(Atom::new("p", vec![]))]
        );
    }

    #[test]
    fn test_parse_query_helper() {
        assert_eq!(
            parse_query("cycle(X)?").unwrap(),
            Atom::new("cycle", vec![var("X")])
        );
        assert_eq!(
            parse_query("edge(a, Y)").unwrap(),
            Atom::new("edge", vec![cst("a"), var("Y")])
        );
    }

    #[test]
    fn test_anonymous_variables_are_distinct() {
        let program = parse_program("p(X) :- q(X, _), r(X, _).").unwrap();
        let clause = program.clauses().next().unwrap();
        let anon: Vec<_> = clause
            .body
            .iter()
            .flat_map(|p| p.atom().unwrap().terms.iter())
            .filter(|t| t.is_anonymous())
            .collect();
        assert_eq!(anon.len(), 2);
        assert_ne!(anon[0], anon[1]);
    }

    #[test]
    fn test_parse_program_with_comments() {
        let source = "
            % transitive closure
            tc(X, Y) :- edge(X, Y).   % base case
            edge(a, b).
            tc(X, Y)?
        ";
        let program = parse_program(source).unwrap();
        assert_eq!(program.clauses().count(), 2);
        assert_eq!(program.queries().count(), 1);
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(parse_program("tc(X, Y) :- .").is_err());
        assert!(parse_program("tc(X, Y)").is_err());
        assert!(parse_program("tc(X,, Y).").is_err());
    }

    #[test]
    fn test_mixed_case_identifiers() {
        let program = parse_program("beginsAtC(c, d).").unwrap();
        let clause = program.clauses().next().unwrap();
        // Leading lowercase: predicate/constant, despite inner capitals.
        assert_eq!(clause.head.pred.name.as_ref(), "beginsAtC");
    }
}
