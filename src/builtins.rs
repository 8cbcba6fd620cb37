use thiserror::Error;

use crate::interpreter::Value;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuiltinError {
    #[error("Builtin '@{name}' expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Builtin '@{name}' expected a {expected} argument, got {got}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        got: &'static str,
    },
}

/// Host-provided primitives, dispatched by name from `@name(...)` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Println,
    Len,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "println" => Some(Self::Println),
            "len" => Some(Self::Len),
            _ => None,
        }
    }

    /// Invokes the builtin on already-evaluated argument values. Print
    /// output goes to the interpreter's line buffer.
    pub fn call(self, args: &[Value], output: &mut Vec<String>) -> Result<Value, BuiltinError> {
        match self {
            Self::Println => {
                let line = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                output.push(line);
                Ok(Value::Nothing)
            }
            Self::Len => {
                let [arg] = args else {
                    return Err(BuiltinError::ArityMismatch {
                        name: "len",
                        expected: 1,
                        found: args.len(),
                    });
                };
                match arg {
                    Value::Str(text) => Ok(Value::Number(text.chars().count() as f64)),
                    other => Err(BuiltinError::InvalidArgument {
                        name: "len",
                        expected: "string",
                        got: other.type_name(),
                    }),
                }
            }
        }
    }
}
