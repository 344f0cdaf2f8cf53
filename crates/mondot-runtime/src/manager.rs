use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use mondot_vm::Module;

struct Registry {
    modules: HashMap<String, Arc<Module>>,
    pending_reclaim: Vec<Arc<Module>>,
}

/// Concurrent registry of published modules.
///
/// Publication is a single atomic transition under one mutex: readers
/// see either the old version or the new one, never a torn state. A
/// displaced version moves to the pending-reclaim list and stays
/// there until its active-call counter reads zero - a frame that
/// obtained the module before the swap keeps executing against that
/// snapshot.
pub struct ModuleManager {
    inner: Mutex<Registry>,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Registry {
                modules: HashMap::new(),
                pending_reclaim: Vec::new(),
            }),
        }
    }

    /// Install a module version, displacing any prior version of the
    /// same name onto the pending-reclaim list. Returns true when the
    /// publication replaced an existing version.
    pub fn publish(&self, module: Arc<Module>) -> bool {
        let mut inner = self.inner.lock().expect("module registry poisoned");
        let displaced = inner
            .modules
            .insert(module.name().to_string(), Arc::clone(&module));
        match displaced {
            Some(old) => {
                debug!("hot-swap `{}`: prior version pending reclaim", old.name());
                inner.pending_reclaim.push(old);
                true
            }
            None => false,
        }
    }

    /// The currently-published version, if any.
    pub fn get(&self, name: &str) -> Option<Arc<Module>> {
        self.inner
            .lock()
            .expect("module registry poisoned")
            .modules
            .get(name)
            .cloned()
    }

    /// All currently-published modules, for the run modes. Order is
    /// unspecified.
    pub fn snapshot(&self) -> Vec<Arc<Module>> {
        self.inner
            .lock()
            .expect("module registry poisoned")
            .modules
            .values()
            .cloned()
            .collect()
    }

    /// Cooperative reclamation sweep: drop every displaced version
    /// whose active-call counter reads zero, leave the rest for a
    /// later tick. Never blocks on in-flight executions. Returns the
    /// number of versions reclaimed.
    pub fn tick_reclaim(&self) -> usize {
        let mut inner = self.inner.lock().expect("module registry poisoned");
        let before = inner.pending_reclaim.len();
        inner.pending_reclaim.retain(|m| {
            let busy = m.active_calls() > 0;
            if !busy {
                debug!("reclaiming quiescent module `{}`", m.name());
            }
            busy
        });
        before - inner.pending_reclaim.len()
    }

    /// Displaced versions not yet reclaimed.
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .expect("module registry poisoned")
            .pending_reclaim
            .len()
    }

    pub fn module_count(&self) -> usize {
        self.inner
            .lock()
            .expect("module registry poisoned")
            .modules
            .len()
    }
}

impl Default for ModuleManager {
    fn default() -> Self {
        Self::new()
    }
}
