//! End-to-end tests: source → compile → publish → invoke.
//!
//! These exercise the full pipeline through the public [`Engine`]
//! facade, with the standard builtin library registered.

use std::sync::{Arc, Mutex};

use mondot::{Engine, Value};

mod invariants;
mod lifecycle;
mod scenarios;

/// Load a source string into a fresh engine and invoke one handler.
pub fn eval_handler(src: &str, module: &str, handler: &str) -> Value {
    let engine = Engine::new();
    engine
        .load_str(src)
        .unwrap_or_else(|e| panic!("load failed for {:?}: {}", src, e));
    engine.call(module, handler, &[])
}

/// Assert a handler returns a number-valued result.
pub fn assert_returns_number(src: &str, module: &str, handler: &str, expected: f64) {
    let ret = eval_handler(src, module, handler);
    assert_eq!(
        ret,
        Value::Number(expected),
        "{}::{} returned {:?}",
        module,
        handler,
        ret
    );
}

/// An engine with an extra `mark` native that records the strings it
/// is called with, for observing handler execution order.
pub fn engine_with_recorder() -> (Engine, Arc<Mutex<Vec<String>>>) {
    let engine = Engine::new();
    let record: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&record);
    engine.bridge().register("mark", move |args| {
        if let Some(Value::String(s)) = args.first() {
            sink.lock().unwrap().push(s.to_string());
        }
        Value::Nil
    });
    (engine, record)
}

pub fn marks(record: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    record.lock().unwrap().clone()
}
