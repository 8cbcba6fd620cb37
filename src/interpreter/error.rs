use thiserror::Error;

use crate::builtins::BuiltinError;
use crate::infix::InfixError;

/// Typed errors produced during evaluation. Every one is fatal to the
/// run; the driver decides what the process does with it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error("Assignment to fixed variable '{name}'")]
    AssignmentToFixed { name: String },
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    FunctionArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Unknown builtin '@{name}'")]
    UnknownBuiltin { name: String },
    #[error("Stray operator '{symbol}'")]
    StrayOperator { symbol: String },
    #[error("Variable '{name}' is not a number in an arithmetic expression, got {type_name}")]
    NonNumericOperand { name: String, type_name: &'static str },
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] InfixError),
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
    #[error("Function '{name}' has an invalid parameter of kind {kind}")]
    InvalidParameter { name: String, kind: &'static str },
    #[error("Internal error: unexpected {kind} node in call to '{name}'")]
    MalformedCall { name: String, kind: &'static str },
}
