use thiserror::Error;

/// Syntax errors, with the source position the lexer was at.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("parse error at {line}:{col}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub col: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            message: message.into(),
            line,
            col,
        }
    }
}

/// Compile-time failures. Any of these aborts the unit; the previously
/// published module version, if any, stays in place.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("unresolved identifier `{name}` in handler `{handler}`")]
    UnresolvedIdentifier { name: String, handler: String },

    #[error("unresolved function `{name}` in handler `{handler}`")]
    UnresolvedFunction { name: String, handler: String },

    #[error("assignment to undeclared name `{name}` in handler `{handler}`")]
    AssignUndeclared { name: String, handler: String },

    #[error("expression statement in handler `{handler}` is not a call")]
    StatementNotCall { handler: String },

    #[error("function literal in handler `{handler}`: closures are not supported")]
    ClosureUnsupported { handler: String },
}
