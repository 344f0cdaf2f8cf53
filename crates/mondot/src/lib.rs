//! MonDot: a small embedded scripting runtime with hot-swapping
//! modules.
//!
//! The [`Engine`] wires the pieces together: a [`HostBridge`] with the
//! builtin library registered, the [`ModuleManager`] registry, and the
//! lifecycle [`Driver`]. Embedders register extra native functions on
//! the bridge, feed script source through [`Engine::load_str`] or the
//! directory watcher, and invoke handlers.
//!
//! ```no_run
//! use mondot::Engine;
//!
//! let engine = Engine::new();
//! engine
//!     .load_str("unit Greeter { on Hello -> () io.print(\"hi\"); end }")
//!     .unwrap();
//! engine.call("Greeter", "Hello", &[]);
//! ```

use std::path::Path;
use std::sync::Arc;

pub use mondot_core::{Bytecode, Function, HostManifest, Instruction, OpCode, Value};
pub use mondot_host::HostBridge;
pub use mondot_lang::{compile_unit, parse_program, CompileError, ParseError};
pub use mondot_runtime::{
    handlers, BenchResult, ConfigError, Driver, LoadError, ModuleManager, ScanConfig, TestReport,
    Watcher,
};
pub use mondot_vm::{HostDispatch, Module, Vm};

/// The assembled runtime: host bridge, module registry and lifecycle
/// driver.
pub struct Engine {
    driver: Arc<Driver<HostBridge>>,
}

impl Engine {
    /// An engine with the standard builtin library registered.
    pub fn new() -> Self {
        let bridge = Arc::new(HostBridge::new());
        mondot_host::register_all(&bridge);
        Self::with_bridge(bridge)
    }

    /// An engine over a caller-assembled bridge (e.g. with extra
    /// native functions, or none at all).
    pub fn with_bridge(bridge: Arc<HostBridge>) -> Self {
        let manager = Arc::new(ModuleManager::new());
        Self {
            driver: Arc::new(Driver::new(bridge, manager)),
        }
    }

    pub fn bridge(&self) -> &Arc<HostBridge> {
        self.driver.host()
    }

    pub fn manager(&self) -> &Arc<ModuleManager> {
        self.driver.manager()
    }

    pub fn driver(&self) -> &Arc<Driver<HostBridge>> {
        &self.driver
    }

    /// Compile source text and publish every unit it declares,
    /// driving lifecycle handlers. Returns the published module
    /// names. The manifest is snapshotted at call time, so natives
    /// registered later are invisible to earlier compilations.
    pub fn load_str(&self, source: &str) -> Result<Vec<String>, EngineError> {
        let program = parse_program(source)?;
        let manifest = self.bridge().manifest();
        let mut names = Vec::new();
        for unit in &program.units {
            let bytecode = compile_unit(unit, &manifest)?;
            log::debug!("compiled unit `{}`:\n{}", unit.name, bytecode.disassemble());
            names.push(bytecode.name.clone());
            self.driver.publish(Arc::new(Module::new(bytecode)));
        }
        Ok(names)
    }

    /// Invoke a handler on the current version of a module. Nil when
    /// the module is not published (missing handlers are nil too, per
    /// the VM's lenient contract).
    pub fn call(&self, module: &str, handler: &str, args: &[Value]) -> Value {
        self.driver
            .run_handler(module, handler, args)
            .unwrap_or(Value::Nil)
    }

    /// Build a watcher over a scripts directory, reading the optional
    /// `mondot.toml` beside the scripts.
    pub fn watcher(&self, scripts_dir: &Path) -> Result<Watcher<HostBridge>, EngineError> {
        let config = ScanConfig::load(scripts_dir)?;
        let watcher = Watcher::new(
            Arc::clone(&self.driver),
            self.bridge().manifest(),
            scripts_dir,
            config,
        )?;
        Ok(watcher)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Failures surfaced by the engine facade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Load(#[from] mondot_runtime::LoadError),
    #[error(transparent)]
    Config(#[from] mondot_runtime::ConfigError),
}
