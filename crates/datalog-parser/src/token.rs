use chumsky::prelude::*;
use std::fmt;
use std::ops::Range;

pub type Span = Range<usize>;
pub type SpannedToken = (Token, Span);
pub type LexError = Simple<char>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Ident(String),
    Variable(String),
    Not,
    RuleSep,
    Eq,
    Neq,
    LParen,
    RParen,
    Comma,
    Dot,
    Question,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(text) => write!(f, "{}", text),
            Token::Variable(text) => write!(f, "{}", text),
            Token::Not => write!(f, "not"),
            Token::RuleSep => write!(f, ":-"),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "!="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Question => write!(f, "?"),
        }
    }
}

fn identifier() -> impl Parser<char, Token, Error = LexError> + Clone {
    text::ident()
        .map(|ident: String| match ident.as_str() {
            "not" => Token::Not,
            _ => {
                let first = ident.chars().next().unwrap();
                if first.is_uppercase() || first == '_' {
                    Token::Variable(ident)
                } else {
                    Token::Ident(ident)
                }
            }
        })
        .labelled("identifier")
}

fn line_comment() -> impl Parser<char, (), Error = LexError> + Clone {
    just('%')
        .then(filter(|c| *c != '\n').repeated())
        .ignored()
        .labelled("comment")
}

fn spacing() -> impl Parser<char, (), Error = LexError> + Clone {
    line_comment()
        .or(text::whitespace().at_least(1).ignored())
        .repeated()
        .ignored()
}

pub fn lexer() -> impl Parser<char, Vec<SpannedToken>, Error = LexError> + Clone {
    let punct = choice((
        just(":-").to(Token::RuleSep),
        just("!=").to(Token::Neq),
        just('=').to(Token::Eq),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('.').to(Token::Dot),
        just('?').to(Token::Question),
    ));

    let token = choice((identifier(), punct))
        .map_with_span(|token, span| (token, span))
        .padded_by(spacing());

    token.repeated().padded_by(spacing()).then_ignore(end())
}
