use core::fmt;
use std::rc::Rc;

use crate::{builtin::Primitive, environment::FrameId, parser::Sexp};


/// Number of arguments a callable accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exactly(expected) => count == expected,
            Self::AtLeast(minimum) => count >= minimum,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(expected) => write!(f, "{}", expected),
            Self::AtLeast(minimum) => write!(f, "at least {}", minimum),
        }
    }
}

/// Runtime type of a value, as reported in type errors. Closures and
/// primitives are both reported as functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Boolean,
    Function,
    Unit,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Function => "function",
            Self::Unit => "unit",
        })
    }
}

/// A user-defined function. The captured frame already holds the bindings made
/// by the function's internal defines
#[derive(Debug, Clone)]
pub struct Closure {
    pub(crate) parameters: Rc<[String]>,
    pub(crate) body: Rc<Sexp>,
    pub(crate) frame: FrameId,
}

impl Closure {
    pub fn arity(&self) -> Arity {
        Arity::Exactly(self.parameters.len())
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

// Value type that can be produced by expressions. `Unit` is the result of
// forms evaluated only for their effect, such as `define` and the printers
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Closure(Closure),
    Primitive(&'static Primitive),
    Unit,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Closure(_) | Self::Primitive(_) => ValueKind::Function,
            Self::Unit => ValueKind::Unit,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Closure(_) | Self::Primitive(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(&a.body, &b.body) && a.frame == b.frame,
            (Self::Primitive(a), Self::Primitive(b)) => a.name == b.name,
            (Self::Unit, Self::Unit) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Boolean(true) => write!(f, "#t"),
            Self::Boolean(false) => write!(f, "#f"),
            Self::Closure(closure) => write!(f, "#<function/{}>", closure.parameters.len()),
            Self::Primitive(primitive) => write!(f, "#<primitive {}>", primitive.name),
            Self::Unit => Ok(()),
        }
    }
}
