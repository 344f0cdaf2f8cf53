//! Single-pass lowering from the handler AST to stack-machine bytecode.
//!
//! Each handler compiles independently against a local symbol
//! environment (name → slot index). Slot 0 is a reserved scratch
//! temporary; declared parameters occupy the next consecutive slots.
//! Forward jumps are emitted with a placeholder operand and patched
//! once the landing index is known; backward jumps are emitted final.

use std::collections::HashMap;

use mondot_core::{
    Bytecode, Function, HostManifest, Instruction, OpCode, Value, CALL_DYNAMIC,
};

use crate::ast::{Expr, Handler, Stmt, Unit};
use crate::error::CompileError;

/// Name of the reserved scratch slot.
const SCRATCH_SLOT: &str = "_tmp";

/// Lower one unit into a bytecode module. The function list mirrors
/// the handler list in order; any failure aborts the whole unit.
pub fn compile_unit(unit: &Unit, manifest: &HostManifest) -> Result<Bytecode, CompileError> {
    let mut bytecode = Bytecode::new(&unit.name);
    for handler in &unit.handlers {
        let func = FunctionCompiler::new(&handler.name, manifest).compile(handler)?;
        let idx = bytecode.functions.len();
        bytecode.functions.push(func);
        bytecode.handler_index.insert(handler.name.clone(), idx);
    }
    Ok(bytecode)
}

struct FunctionCompiler<'a> {
    handler: &'a str,
    manifest: &'a HostManifest,
    func: Function,
    env: HashMap<String, usize>,
}

impl<'a> FunctionCompiler<'a> {
    fn new(handler: &'a str, manifest: &'a HostManifest) -> Self {
        Self {
            handler,
            manifest,
            func: Function::default(),
            env: HashMap::new(),
        }
    }

    fn compile(mut self, handler: &Handler) -> Result<Function, CompileError> {
        self.add_local(SCRATCH_SLOT);
        for param in &handler.params {
            self.add_local(param);
        }
        self.func.params = handler.params.len();

        self.block(&handler.body)?;

        // Falling off the end returns nil.
        self.emit(Instruction::new(OpCode::Ret, 0, 0));
        Ok(self.func)
    }

    /// Allocate a slot for `name`, reusing an existing slot on
    /// re-declaration.
    fn add_local(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.env.get(name) {
            return slot;
        }
        let slot = self.func.locals.len();
        self.func.locals.push(name.to_string());
        self.env.insert(name.to_string(), slot);
        slot
    }

    fn local(&self, name: &str) -> Option<usize> {
        self.env.get(name).copied()
    }

    fn emit(&mut self, ins: Instruction) -> usize {
        self.func.code.push(ins);
        self.func.code.len() - 1
    }

    fn here(&self) -> usize {
        self.func.code.len()
    }

    /// Back-patch the jump at `pos` to land on `target`.
    fn patch(&mut self, pos: usize, target: usize) {
        self.func.code[pos].a = target as i32;
    }

    fn push_const(&mut self, v: Value) {
        let idx = self.func.add_const(v);
        self.emit(Instruction::new(OpCode::PushConst, idx as i32, 0));
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Local { name, init } => {
                match init {
                    Some(expr) => self.expr(expr)?,
                    None => self.push_const(Value::Nil),
                }
                let slot = self.add_local(name);
                self.emit(Instruction::new(OpCode::StoreLocal, slot as i32, 0));
            }
            Stmt::Assign { name, expr } => {
                self.expr(expr)?;
                let slot = self.local(name).ok_or_else(|| CompileError::AssignUndeclared {
                    name: name.clone(),
                    handler: self.handler.to_string(),
                })?;
                self.emit(Instruction::new(OpCode::StoreLocal, slot as i32, 0));
            }
            Stmt::Expr(expr) => {
                if !matches!(expr, Expr::Call { .. }) {
                    return Err(CompileError::StatementNotCall {
                        handler: self.handler.to_string(),
                    });
                }
                self.expr(expr)?;
                self.emit(Instruction::new(OpCode::Pop, 1, 0));
            }
            Stmt::If {
                cond,
                then_body,
                elseifs,
                else_body,
            } => self.if_stmt(cond, then_body, elseifs, else_body)?,
            Stmt::While { cond, body } => {
                let head = self.here();
                self.expr(cond)?;
                let exit = self.emit(Instruction::new(OpCode::JmpIfFalse, 0, 0));
                self.block(body)?;
                self.emit(Instruction::new(OpCode::Jmp, head as i32, 0));
                let after = self.here();
                self.patch(exit, after);
            }
            Stmt::Foreach { var, iter, body } => self.foreach_stmt(var, iter, body)?,
            Stmt::Return(expr) => {
                self.expr(expr)?;
                self.emit(Instruction::new(OpCode::Ret, 0, 0));
            }
        }
        Ok(())
    }

    fn if_stmt(
        &mut self,
        cond: &Expr,
        then_body: &[Stmt],
        elseifs: &[(Expr, Vec<Stmt>)],
        else_body: &[Stmt],
    ) -> Result<(), CompileError> {
        // Jumps to the merge point, patched once the chain is lowered.
        let mut exits = Vec::new();

        self.expr(cond)?;
        let mut next_branch = self.emit(Instruction::new(OpCode::JmpIfFalse, 0, 0));
        self.block(then_body)?;
        exits.push(self.emit(Instruction::new(OpCode::Jmp, 0, 0)));

        for (econd, ebody) in elseifs {
            let here = self.here();
            self.patch(next_branch, here);
            self.expr(econd)?;
            next_branch = self.emit(Instruction::new(OpCode::JmpIfFalse, 0, 0));
            self.block(ebody)?;
            exits.push(self.emit(Instruction::new(OpCode::Jmp, 0, 0)));
        }

        let here = self.here();
        self.patch(next_branch, here);
        self.block(else_body)?;

        let merge = self.here();
        for pos in exits {
            self.patch(pos, merge);
        }
        Ok(())
    }

    /// Desugar `foreach var in iter` to a counted traversal over the
    /// host primitives: the iterable lands in the hidden `__seq`
    /// local, the cursor in `__idx`, the loop condition is
    /// `lt(__idx, strlen(__seq))` and the body head binds
    /// `str_char_at(__seq, __idx)` to the loop variable.
    fn foreach_stmt(&mut self, var: &str, iter: &Expr, body: &[Stmt]) -> Result<(), CompileError> {
        self.expr(iter)?;
        let seq = self.add_local("__seq");
        self.emit(Instruction::new(OpCode::StoreLocal, seq as i32, 0));

        let idx = self.add_local("__idx");
        self.push_const(Value::Number(0.0));
        self.emit(Instruction::new(OpCode::StoreLocal, idx as i32, 0));

        let head = self.here();
        self.emit(Instruction::new(OpCode::PushLocal, idx as i32, 0));
        self.emit(Instruction::new(OpCode::PushLocal, seq as i32, 0));
        self.emit(Instruction::host_call(1, "strlen"));
        self.emit(Instruction::host_call(2, "lt"));
        let exit = self.emit(Instruction::new(OpCode::JmpIfFalse, 0, 0));

        self.emit(Instruction::new(OpCode::PushLocal, seq as i32, 0));
        self.emit(Instruction::new(OpCode::PushLocal, idx as i32, 0));
        self.emit(Instruction::host_call(2, "str_char_at"));
        let loop_var = self.add_local(var);
        self.emit(Instruction::new(OpCode::StoreLocal, loop_var as i32, 0));

        self.block(body)?;

        self.emit(Instruction::new(OpCode::PushLocal, idx as i32, 0));
        self.push_const(Value::Number(1.0));
        self.emit(Instruction::host_call(2, "add"));
        self.emit(Instruction::new(OpCode::StoreLocal, idx as i32, 0));
        self.emit(Instruction::new(OpCode::Jmp, head as i32, 0));

        let after = self.here();
        self.patch(exit, after);
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Number(n) => self.push_const(Value::Number(*n)),
            Expr::Str(s) => self.push_const(Value::string(s)),
            Expr::Bool(b) => self.push_const(Value::Bool(*b)),
            Expr::Nil => self.push_const(Value::Nil),
            Expr::Ident(name) => {
                let slot = self.local(name).ok_or_else(|| {
                    CompileError::UnresolvedIdentifier {
                        name: name.clone(),
                        handler: self.handler.to_string(),
                    }
                })?;
                self.emit(Instruction::new(OpCode::PushLocal, slot as i32, 0));
            }
            Expr::Call { name, args } => {
                for arg in args {
                    self.expr(arg)?;
                }
                if let Some(slot) = self.local(name) {
                    // The callee is a value held in a local: push it
                    // above the arguments and dispatch dynamically.
                    self.emit(Instruction::new(OpCode::PushLocal, slot as i32, 0));
                    self.emit(Instruction::new(
                        OpCode::Call,
                        args.len() as i32,
                        CALL_DYNAMIC,
                    ));
                } else if self.manifest.has(name) {
                    self.emit(Instruction::host_call(args.len(), name));
                } else {
                    return Err(CompileError::UnresolvedFunction {
                        name: name.clone(),
                        handler: self.handler.to_string(),
                    });
                }
            }
            Expr::Func { .. } => {
                return Err(CompileError::ClosureUnsupported {
                    handler: self.handler.to_string(),
                })
            }
        }
        Ok(())
    }
}
