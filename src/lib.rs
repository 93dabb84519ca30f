
mod builtin;
mod config;
mod context;
mod environment;
mod error;
mod interpreter;
mod parser;
mod value;

#[cfg(test)]
mod test_utils;

pub use builtin::{primitives, Operation, Primitive, TypeConstraint};
pub use config::{Config, Source};
pub use context::{run, Interpreter};
pub use environment::{FrameId, Frames};
pub use error::LispError;
pub use interpreter::EvaluationResult;
pub use parser::{check_identifier, parse, parse_program, tokenize, Literal, Sexp, Token, RESERVED};
pub use value::{Arity, Closure, Value, ValueKind};
