use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::value::Value;

/// Dispatch mode of a `Call` instruction: the callee is a registered
/// host function named by the instruction's `name` operand.
pub const CALL_HOST: i32 = -1;
/// Dispatch mode of a `Call` instruction: the callee sits on the stack
/// above the arguments, as a number holding a function index.
pub const CALL_DYNAMIC: i32 = -2;

/// Operation codes for the stack machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpCode {
    /// Push `consts[a]`.
    PushConst,
    /// Push `locals[a]`.
    PushLocal,
    /// Pop the top of stack into `locals[a]`.
    StoreLocal,
    /// Pop `a` values, never descending below the frame floor.
    Pop,
    /// Invoke with arity `a`; `b` selects the dispatch mode
    /// ([`CALL_HOST`], [`CALL_DYNAMIC`], or a static function index).
    Call,
    /// Unconditional jump to instruction index `a`.
    Jmp,
    /// Pop the top of stack; jump to `a` when it is not truthy.
    JmpIfFalse,
    /// Return the top of stack (or nil when the frame is empty).
    Ret,
}

/// One instruction: opcode plus two integer operands and an optional
/// name, used only by host-dispatched calls.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    pub a: i32,
    pub b: i32,
    pub name: Option<Arc<str>>,
}

impl Instruction {
    pub fn new(op: OpCode, a: i32, b: i32) -> Self {
        Self {
            op,
            a,
            b,
            name: None,
        }
    }

    /// A host call with the given arity and target name.
    pub fn host_call(arity: usize, name: &str) -> Self {
        Self {
            op: OpCode::Call,
            a: arity as i32,
            b: CALL_HOST,
            name: Some(Arc::from(name)),
        }
    }

    /// Whether this instruction transfers control through its `a`
    /// operand.
    pub fn is_jump(&self) -> bool {
        matches!(self.op, OpCode::Jmp | OpCode::JmpIfFalse)
    }

    /// Whether the `a` operand indexes the frame's local slots.
    pub fn touches_local(&self) -> bool {
        matches!(self.op, OpCode::PushLocal | OpCode::StoreLocal)
    }

    /// Whether the `a` operand indexes the constant pool.
    pub fn touches_const(&self) -> bool {
        matches!(self.op, OpCode::PushConst)
    }
}

/// A compiled handler body.
#[derive(Clone, Debug, Default)]
pub struct Function {
    /// Constant pool, indexed by `PushConst`.
    pub consts: Vec<Value>,
    /// Slot names, in allocation order. Slot 0 is the reserved scratch
    /// temporary; declared parameters occupy slots `1..=params`.
    pub locals: Vec<String>,
    /// Number of declared parameters.
    pub params: usize,
    /// Instruction stream. The compiler guarantees a trailing `Ret`.
    pub code: Vec<Instruction>,
}

impl Function {
    /// Append a value to the constant pool, returning its index.
    pub fn add_const(&mut self, v: Value) -> usize {
        self.consts.push(v);
        self.consts.len() - 1
    }
}

/// A compiled unit: a named set of functions plus the mapping from
/// handler name to function index. Immutable after compilation; a new
/// version of a module is a new `Bytecode` object.
#[derive(Clone, Debug, Default)]
pub struct Bytecode {
    pub name: String,
    pub functions: Vec<Function>,
    pub handler_index: HashMap<String, usize>,
}

impl Bytecode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            handler_index: HashMap::new(),
        }
    }

    /// Function index of a handler, if the unit declares it.
    pub fn handler(&self, name: &str) -> Option<usize> {
        self.handler_index.get(name).copied()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handler_index.contains_key(name)
    }

    pub fn function(&self, idx: usize) -> Option<&Function> {
        self.functions.get(idx)
    }

    /// Human-readable listing of every function, one instruction per
    /// line. Emitted at debug level after compilation.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let mut handlers: Vec<(&String, &usize)> = self.handler_index.iter().collect();
        handlers.sort_by_key(|(_, idx)| **idx);
        for (hname, &idx) in handlers {
            let func = &self.functions[idx];
            let _ = writeln!(
                out,
                "{}::{} ({} params, {} locals, {} consts)",
                self.name,
                hname,
                func.params,
                func.locals.len(),
                func.consts.len()
            );
            for (i, ins) in func.code.iter().enumerate() {
                match &ins.name {
                    Some(name) => {
                        let _ = writeln!(out, "  {:4}  {:?} {} {} {}", i, ins.op, ins.a, ins.b, name);
                    }
                    None => {
                        let _ = writeln!(out, "  {:4}  {:?} {} {}", i, ins.op, ins.a, ins.b);
                    }
                };
            }
        }
        out
    }
}
