use thiserror::Error;

use crate::value::Arity;


#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LispError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name error: undefined name '{0}'")]
    Name(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("arity error: {callee} expected {expected} arguments, got {got}")]
    Arity {
        callee: String,
        expected: Arity,
        got: usize,
    },

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("output error: {0}")]
    Output(String),
}

impl LispError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Stable name of the error category, as reported to hosts and used by the test fixtures
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SyntaxError",
            Self::Name(_) => "NameError",
            Self::Type(_) => "TypeError",
            Self::Arity { .. } => "ArityError",
            Self::Arithmetic(_) => "ArithmeticError",
            Self::Output(_) => "OutputError",
        }
    }
}

impl From<std::io::Error> for LispError {
    fn from(error: std::io::Error) -> Self {
        Self::Output(error.to_string())
    }
}
