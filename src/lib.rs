//! Interpreter for sable, a tiny lazily-evaluated scripting language.

pub mod ast;
pub mod builtins;
pub mod infix;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod preprocess;
pub mod token;
