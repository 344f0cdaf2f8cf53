//! Core data model for the MonDot scripting runtime.
//!
//! This crate is the dependency-free leaf of the workspace: it defines
//! the runtime [`Value`], the bytecode representation ([`OpCode`],
//! [`Instruction`], [`Function`], [`Bytecode`]) and the compile-time
//! [`HostManifest`]. The compiler produces `Bytecode`, the virtual
//! machine consumes it, and the module manager republishes it - none
//! of them need anything else from each other.

mod bytecode;
mod manifest;
mod value;

pub use bytecode::{Bytecode, Function, Instruction, OpCode, CALL_DYNAMIC, CALL_HOST};
pub use manifest::HostManifest;
pub use value::{Rule, Value};
