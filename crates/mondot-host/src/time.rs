//! Clock, sleep and randomness builtins.
//!
//! `sleep_ms` blocks the calling thread; that blocking propagates
//! directly to the VM frame that made the call, which is exactly the
//! suspension model the runtime documents.

use std::cell::Cell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mondot_core::Value;

use crate::bridge::HostBridge;

thread_local! {
    static RNG_STATE: Cell<u64> = Cell::new(0);
}

/// xorshift64*, seeded per thread from the clock on first use. Good
/// enough for scripts; not a source of cryptographic randomness.
fn next_random() -> f64 {
    RNG_STATE.with(|state| {
        let mut x = state.get();
        if x == 0 {
            x = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x9e3779b97f4a7c15)
                | 1;
        }
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        state.set(x);
        let bits = x.wrapping_mul(0x2545f4914f6cdd1d) >> 11;
        bits as f64 / (1u64 << 53) as f64
    })
}

pub fn register(bridge: &HostBridge) {
    bridge.register("sleep_ms", |args| {
        if let Some(Value::Number(ms)) = args.first() {
            if *ms > 0.0 {
                std::thread::sleep(Duration::from_millis(*ms as u64));
            }
        }
        Value::Nil
    });

    bridge.register("time_ms", |_args| {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(0.0);
        Value::Number(now)
    });

    bridge.register("rand", |_args| Value::Number(next_random()));
}
