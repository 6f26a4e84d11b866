//! Error types for rule compilation and evaluation

use thiserror::Error;

use crate::types::Type;

/// Raised while compiling a rule. Always surfaced at configuration time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("Expression is empty")]
    Empty,

    #[error("Expression is too long ({0} tokens, max {max})", max = crate::parser::MAX_TOKENS)]
    TooLong(usize),

    #[error("Expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("Unknown identifier '{0}' (rules may only reference 'track')")]
    UnknownIdentifier(String),

    #[error("Unknown field '{field}' on {ty}")]
    UnknownField { ty: Type, field: String },

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{function}' takes {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Type error: {0}")]
    Type(String),

    #[error("Rule must produce a bool, but produces {0}")]
    NotBoolean(Type),
}

/// Raised while evaluating a compiled rule against one track view.
/// The rule is treated as not matching.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Integer overflow in {0}")]
    Overflow(&'static str),

    #[error("Cannot convert {0} to int")]
    InvalidConversion(f64),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}
