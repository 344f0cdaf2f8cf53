use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use mondot_core::Bytecode;

/// A published module version: compiled bytecode plus the execution
/// bookkeeping that the hot-swap protocol relies on.
///
/// The bytecode itself is immutable after construction; a new version
/// of a module is a new `Module` object. `active_calls` counts the
/// frames currently executing against this version, and a displaced
/// version is only reclaimed once that count reads zero.
#[derive(Debug)]
pub struct Module {
    bytecode: Bytecode,
    active_calls: AtomicU32,
    init_done: AtomicBool,
}

impl Module {
    pub fn new(bytecode: Bytecode) -> Self {
        Self {
            bytecode,
            active_calls: AtomicU32::new(0),
            init_done: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.bytecode.name
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.bytecode.has_handler(name)
    }

    /// Number of frames currently executing against this version.
    pub fn active_calls(&self) -> u32 {
        self.active_calls.load(Ordering::Acquire)
    }

    /// Mark the one-shot init as done; returns true exactly once per
    /// module lifetime.
    pub fn begin_init(&self) -> bool {
        !self.init_done.swap(true, Ordering::AcqRel)
    }

    pub fn init_done(&self) -> bool {
        self.init_done.load(Ordering::Acquire)
    }
}

/// Scope guard pairing the increment and decrement of a module's
/// active-call counter around a frame's lifetime, on every exit path.
pub struct ActiveCallGuard<'a> {
    module: &'a Module,
}

impl<'a> ActiveCallGuard<'a> {
    pub fn enter(module: &'a Module) -> Self {
        module.active_calls.fetch_add(1, Ordering::AcqRel);
        Self { module }
    }
}

impl Drop for ActiveCallGuard<'_> {
    fn drop(&mut self) {
        self.module.active_calls.fetch_sub(1, Ordering::AcqRel);
    }
}
