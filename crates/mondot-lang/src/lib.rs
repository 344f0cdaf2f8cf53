//! The MonDot script language front end.
//!
//! Source text goes through three stages: the [`Lexer`] produces
//! tokens, the [`Parser`] builds the unit/handler AST, and
//! [`compile_unit`] lowers each unit to a [`mondot_core::Bytecode`]
//! module in a single pass. Any failure aborts the whole unit - no
//! partial module ever leaves this crate.

mod ast;
mod compiler;
mod error;
mod lexer;
mod parser;

pub use ast::{Expr, Handler, Program, Stmt, Unit};
pub use compiler::compile_unit;
pub use error::{CompileError, ParseError};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse_program, Parser};
