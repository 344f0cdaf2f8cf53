use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};
use mondot_core::Value;
use mondot_vm::{HostDispatch, Module, Vm};

use crate::handlers;
use crate::manager::ModuleManager;

/// Tally of a `--test` run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl TestReport {
    /// Process exit code: 0 when everything passed, 2 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.failed == 0 {
            0
        } else {
            2
        }
    }
}

/// One `--benchmark` measurement.
#[derive(Clone, Debug)]
pub struct BenchResult {
    pub module: String,
    pub elapsed_ms: f64,
}

/// Drives lifecycle handlers and run modes against the registry.
///
/// Within a single publication the handler order is fixed: `Init`
/// (once per module) → `SuperInit` (once per process) → `Reload` (on
/// non-initial publications). Order among unrelated modules is
/// unspecified.
pub struct Driver<H> {
    host: Arc<H>,
    manager: Arc<ModuleManager>,
    super_init_done: AtomicBool,
}

impl<H: HostDispatch> Driver<H> {
    pub fn new(host: Arc<H>, manager: Arc<ModuleManager>) -> Self {
        Self {
            host,
            manager,
            super_init_done: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn manager(&self) -> &Arc<ModuleManager> {
        &self.manager
    }

    /// Publish a module version and fire its lifecycle handlers.
    ///
    /// The module is visible in the registry before any handler runs,
    /// so handlers observing their own module through `get` see the
    /// version they belong to.
    pub fn publish(&self, module: Arc<Module>) {
        let replaced = self.manager.publish(Arc::clone(&module));
        let mut vm = Vm::new();

        if module.has_handler(handlers::INIT) && module.begin_init() {
            info!("running Init for module `{}`", module.name());
            vm.run_handler(self.host.as_ref(), &module, handlers::INIT, &[]);
        }

        if module.has_handler(handlers::SUPER_INIT)
            && !self.super_init_done.swap(true, Ordering::AcqRel)
        {
            info!("running SuperInit from module `{}`", module.name());
            vm.run_handler(self.host.as_ref(), &module, handlers::SUPER_INIT, &[]);
        }

        if replaced && module.has_handler(handlers::RELOAD) {
            info!("running Reload for module `{}`", module.name());
            vm.run_handler(self.host.as_ref(), &module, handlers::RELOAD, &[]);
        }
    }

    /// Invoke a handler on the currently-published version of a
    /// module. `None` when no module of that name is published.
    pub fn run_handler(&self, module: &str, handler: &str, args: &[Value]) -> Option<Value> {
        let module = self.manager.get(module)?;
        let mut vm = Vm::new();
        Some(vm.run_handler(self.host.as_ref(), &module, handler, args))
    }

    /// Run `UTest` on every published module that declares it and
    /// tally truthy/falsy returns.
    pub fn run_tests(&self) -> TestReport {
        let mut report = TestReport::default();
        let mut vm = Vm::new();
        for module in self.manager.snapshot() {
            if !module.has_handler(handlers::UTEST) {
                continue;
            }
            report.total += 1;
            let ret = vm.run_handler(self.host.as_ref(), &module, handlers::UTEST, &[]);
            if ret.is_truthy() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
                error!(
                    "UTest failed: module={} expected=true got={}",
                    module.name(),
                    ret
                );
            }
        }
        report
    }

    /// Run `UBenchmark` on every published module that declares it,
    /// with monotonic timing bracketed around each call.
    pub fn run_benchmarks(&self) -> Vec<BenchResult> {
        let mut results = Vec::new();
        let mut vm = Vm::new();
        for module in self.manager.snapshot() {
            if !module.has_handler(handlers::UBENCHMARK) {
                continue;
            }
            let started = Instant::now();
            vm.run_handler(self.host.as_ref(), &module, handlers::UBENCHMARK, &[]);
            results.push(BenchResult {
                module: module.name().to_string(),
                elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
            });
        }
        results
    }

    /// Run `Finalize` on every published module that declares it;
    /// true when any module requested a stop.
    pub fn finalize_all(&self) -> bool {
        let mut stop = false;
        let mut vm = Vm::new();
        for module in self.manager.snapshot() {
            if !module.has_handler(handlers::FINALIZE) {
                continue;
            }
            let ret = vm.run_handler(self.host.as_ref(), &module, handlers::FINALIZE, &[]);
            if ret.is_truthy() {
                info!("module `{}` requested stop from Finalize", module.name());
                stop = true;
            }
        }
        stop
    }
}
