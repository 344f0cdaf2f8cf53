use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use mondot_core::{HostManifest, Rule, Value};
use mondot_vm::HostDispatch;

/// A native callable: a sequence of values in, one value out.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Name-indexed registry of native functions plus the issuer for
/// opaque rule handles.
///
/// Registration typically happens once at startup, invocation from
/// any execution thread; the read/write lock reflects that split.
/// Registering a name again replaces the callable.
pub struct HostBridge {
    functions: RwLock<HashMap<String, HostFn>>,
    next_rule_id: AtomicU32,
}

impl HostBridge {
    pub fn new() -> Self {
        Self {
            functions: RwLock::new(HashMap::new()),
            next_rule_id: AtomicU32::new(1),
        }
    }

    /// Add or replace a native callable under `name`.
    pub fn register<F>(&self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.functions
            .write()
            .expect("host registry poisoned")
            .insert(name.to_string(), Arc::new(f));
    }

    /// Snapshot of the registered names, for the compiler.
    pub fn manifest(&self) -> HostManifest {
        let functions = self.functions.read().expect("host registry poisoned");
        HostManifest::with_names(functions.keys().cloned())
    }

    /// Issue a fresh opaque handle. Ids are process-monotonic.
    pub fn new_rule(&self, kind: &str) -> Value {
        let id = self.next_rule_id.fetch_add(1, Ordering::Relaxed);
        Value::Rule(Arc::new(Rule::new(kind, id)))
    }

    /// Release a handle. Nothing consumes rules yet, so this only
    /// exists to complete the creation API.
    pub fn release_rule(&self, _rule: &Rule) {}
}

impl Default for HostBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDispatch for HostBridge {
    fn has(&self, name: &str) -> bool {
        self.functions
            .read()
            .expect("host registry poisoned")
            .contains_key(name)
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Value {
        let f = {
            let functions = self.functions.read().expect("host registry poisoned");
            functions.get(name).cloned()
        };
        match f {
            Some(f) => f(args),
            None => Value::Nil,
        }
    }
}
