use core::fmt;

use itertools::Itertools;
use logos::Logos;

use crate::error::LispError;


/// Words that can never be bound by `define` or used as parameters
pub const RESERVED: [&str; 7] = ["define", "if", "mod", "and", "or", "not", "fun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
#[logos(skip r"\s+")]
pub enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[regex(r"[^\s()]+", |lex| lex.slice())]
    Atom(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Integer(i64),
    Boolean(bool),
    Identifier(String),
}

// Sexps are the basic building blocks of a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    Atom(Literal),
    List(Vec<Self>)
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Boolean(true) => write!(f, "#t"),
            Self::Boolean(false) => write!(f, "#f"),
            Self::Identifier(identifier) => write!(f, "{}", identifier),
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(literal) => literal.fmt(f),
            Self::List(list) => write!(f, "({})", list.iter().join(" ")),
        }
    }
}

type ParseResult<O> = Result<O, LispError>;


pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    // Every character outside the skip set is matched by one of the patterns,
    // so the lexer has no error case to report
    Token::lexer(input)
        .filter_map(Result::ok)
        .collect()
}

fn is_integer_literal(atom: &str) -> bool {
    let digits = atom.strip_prefix('-').unwrap_or(atom);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

fn parse_atom(atom: &str) -> ParseResult<Literal> {
    match atom {
        "#t" => Ok(Literal::Boolean(true)),
        "#f" => Ok(Literal::Boolean(false)),
        atom if is_integer_literal(atom) => atom.parse()
            .map(Literal::Integer)
            .map_err(|_| LispError::syntax(format!("integer literal {} is out of range", atom))),
        atom => Ok(Literal::Identifier(atom.to_owned())),
    }
}

fn parse_list<'a, 'b>(mut tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp)> {
    // The opening parenthesis has already been consumed. Items are read until the
    // next token closes the list
    let mut items = vec![];

    loop {
        match tokens.first() {
            None => return Err(LispError::syntax("unexpected end of input")),
            Some(Token::RightParen) => return Ok((&tokens[1..], Sexp::List(items))),
            Some(_) => {
                let (rest, sexp) = parse_sexp(tokens)?;
                items.push(sexp);
                tokens = rest;
            }
        }
    }
}

fn parse_sexp<'a, 'b>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp)> {
    match tokens.split_first() {
        None => Err(LispError::syntax("unexpected end of input")),
        Some((Token::LeftParen, rest)) => parse_list(rest),
        Some((Token::RightParen, _)) => Err(LispError::syntax("unexpected ')'")),
        Some((Token::Atom(atom), rest)) => Ok((rest, Sexp::Atom(parse_atom(atom)?))),
    }
}

/// Reads exactly one expression from the input
pub fn parse(input: &str) -> ParseResult<Sexp> {
    let tokens = tokenize(input);

    let (tokens, sexp) = parse_sexp(&tokens)?;
    if let Some(token) = tokens.first() {
        return Err(LispError::syntax(format!("unexpected trailing input starting at {:?}", token)));
    }

    Ok(sexp)
}

/// Reads every top-level expression of a program, in order
pub fn parse_program(input: &str) -> ParseResult<Vec<Sexp>> {
    let tokens = tokenize(input);
    let mut remaining = tokens.as_slice();
    let mut program = vec![];

    while !remaining.is_empty() {
        let (rest, sexp) = parse_sexp(remaining)?;
        program.push(sexp);
        remaining = rest;
    }

    Ok(program)
}

/// Checks that a name may be bound: lowercase letters, digits and hyphens,
/// starting with a letter, and not a reserved word
pub fn check_identifier(name: &str) -> ParseResult<()> {
    if RESERVED.contains(&name) {
        return Err(LispError::syntax(format!("{} is a reserved word", name)));
    }

    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some('a'..='z'))
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'));

    if !valid {
        return Err(LispError::syntax(format!("{} is not a valid identifier", name)));
    }
    Ok(())
}
