use log::{debug, warn};
use smallvec::SmallVec;

use mondot_core::{OpCode, Value, CALL_DYNAMIC, CALL_HOST};

use crate::dispatch::HostDispatch;
use crate::frame::Frame;
use crate::module::{ActiveCallGuard, Module};

/// Arguments are drained into a scratch buffer before dispatch; this
/// keeps typical arities off the heap.
type ArgBuf = SmallVec<[Value; 8]>;

/// The bytecode interpreter.
///
/// One `Vm` executes on one thread at a time: a frame runs on the
/// thread that entered it, without yielding, until it returns. The
/// evaluation stack is shared across nested frames; each frame clamps
/// its pops at the stack height recorded on entry.
pub struct Vm {
    stack: Vec<Value>,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(1024),
        }
    }

    /// Current evaluation stack depth (used by tests and diagnostics).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Invoke a named handler. A missing handler is not an error: the
    /// lifecycle driver probes optional handlers freely.
    pub fn run_handler<H: HostDispatch + ?Sized>(
        &mut self,
        host: &H,
        module: &Module,
        handler: &str,
        args: &[Value],
    ) -> Value {
        match module.bytecode().handler(handler) {
            Some(idx) => self.call_function(host, module, idx, args),
            None => {
                debug!("handler `{}` not found in module `{}`", handler, module.name());
                Value::Nil
            }
        }
    }

    /// Execute function `idx` of `module` against a fresh frame.
    ///
    /// The module's active-call counter is held incremented for the
    /// whole frame lifetime, including nested calls and every exit
    /// path.
    pub fn call_function<H: HostDispatch + ?Sized>(
        &mut self,
        host: &H,
        module: &Module,
        idx: usize,
        args: &[Value],
    ) -> Value {
        let Some(func) = module.bytecode().function(idx) else {
            warn!(
                "call into `{}`: function index {} out of range",
                module.name(),
                idx
            );
            return Value::Nil;
        };

        let _guard = ActiveCallGuard::enter(module);
        let mut frame = Frame::new(func, args, self.stack.len());
        let floor = frame.floor();

        let mut ip = 0usize;
        while ip < func.code.len() {
            let ins = &func.code[ip];
            match ins.op {
                OpCode::PushConst => match func.consts.get(ins.a as usize) {
                    Some(v) => self.stack.push(v.clone()),
                    None => {
                        warn!("push_const: index {} out of range", ins.a);
                        self.stack.push(Value::Nil);
                    }
                },
                OpCode::PushLocal => match frame.local(ins.a as usize) {
                    Some(v) => self.stack.push(v.clone()),
                    None => {
                        warn!("push_local: slot {} out of range", ins.a);
                        self.stack.push(Value::Nil);
                    }
                },
                OpCode::StoreLocal => {
                    if self.stack.len() <= floor {
                        warn!("store_local: stack underflow");
                    } else {
                        let v = self.stack.pop().unwrap_or_default();
                        if !frame.set_local(ins.a as usize, v) {
                            warn!("store_local: slot {} out of range", ins.a);
                        }
                    }
                }
                OpCode::Pop => {
                    if ins.a > 0 {
                        let target = self.stack.len().saturating_sub(ins.a as usize).max(floor);
                        self.stack.truncate(target);
                    }
                }
                OpCode::Call => {
                    self.op_call(host, module, ins.a, ins.b, ins.name.as_deref(), floor);
                }
                OpCode::Jmp => {
                    let target = ins.a as usize;
                    if ins.a < 0 || target > func.code.len() {
                        warn!("jmp: target {} out of range", ins.a);
                        break;
                    }
                    ip = target;
                    continue;
                }
                OpCode::JmpIfFalse => {
                    if self.stack.len() <= floor {
                        warn!("jmp_if_false: stack underflow");
                    } else {
                        let cond = self.stack.pop().unwrap_or_default();
                        if !cond.is_truthy() {
                            let target = ins.a as usize;
                            if ins.a < 0 || target > func.code.len() {
                                warn!("jmp_if_false: target {} out of range", ins.a);
                                break;
                            }
                            ip = target;
                            continue;
                        }
                    }
                }
                OpCode::Ret => {
                    let ret = if self.stack.len() > floor {
                        self.stack.pop().unwrap_or_default()
                    } else {
                        Value::Nil
                    };
                    self.stack.truncate(floor);
                    return ret;
                }
            }
            ip += 1;
        }

        // Fell past the last instruction; well-formed bytecode cannot
        // get here because of the synthesized trailing return.
        self.stack.truncate(floor);
        Value::Nil
    }

    /// `call A B` - drain `A` arguments (plus the callee for dynamic
    /// dispatch), invoke the target, and push exactly one result.
    fn op_call<H: HostDispatch + ?Sized>(
        &mut self,
        host: &H,
        module: &Module,
        arity: i32,
        mode: i32,
        name: Option<&str>,
        floor: usize,
    ) {
        let arity = arity.max(0) as usize;
        let takes_callee = mode == CALL_DYNAMIC;
        let needed = arity + usize::from(takes_callee);
        if self.stack.len() < floor + needed {
            warn!("call: stack underflow (need {} operands)", needed);
            self.stack.push(Value::Nil);
            return;
        }

        let callee = takes_callee.then(|| self.stack.pop().unwrap_or_default());
        let at = self.stack.len() - arity;
        let args: ArgBuf = self.stack.drain(at..).collect();

        let ret = if takes_callee {
            match callee.unwrap_or_default() {
                Value::Number(n) if n >= 0.0 => {
                    self.call_function(host, module, n as usize, &args)
                }
                other => {
                    warn!(
                        "dynamic call: callee is {} rather than a function index",
                        other.tag()
                    );
                    Value::Nil
                }
            }
        } else if mode >= 0 {
            self.call_function(host, module, mode as usize, &args)
        } else if mode == CALL_HOST {
            let name = name.unwrap_or("");
            if host.has(name) {
                host.invoke(name, &args)
            } else {
                warn!("call: unknown host function `{}`", name);
                Value::Nil
            }
        } else {
            warn!("call: unsupported dispatch mode {}", mode);
            Value::Nil
        };
        self.stack.push(ret);
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
