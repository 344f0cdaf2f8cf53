//! Terminal output builtins.
//!
//! Stdout is serialized by one mutex so concurrent prints from
//! different execution threads do not interleave bytes.

use std::io::Write;
use std::sync::Mutex;

use mondot_core::Value;

use crate::bridge::HostBridge;

static STDOUT_LOCK: Mutex<()> = Mutex::new(());

fn format_args_joined(args: &[Value]) -> String {
    let mut out = String::with_capacity(args.len() * 16 + 16);
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out
}

fn write_locked(text: &str, flush: bool) {
    let _guard = STDOUT_LOCK.lock().expect("stdout lock poisoned");
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(text.as_bytes());
    if flush {
        let _ = handle.flush();
    }
}

pub fn register(bridge: &HostBridge) {
    // print and println behave identically: all arguments space
    // separated, newline, flush.
    for name in ["io.print", "io.println"] {
        bridge.register(name, |args| {
            let mut text = if args.is_empty() {
                "nil".to_string()
            } else {
                format_args_joined(args)
            };
            text.push('\n');
            write_locked(&text, true);
            Value::Nil
        });
    }

    // First argument only, no newline, no flush.
    bridge.register("io.write", |args| {
        if let Some(first) = args.first() {
            write_locked(&first.to_string(), false);
        }
        Value::Nil
    });

    bridge.register("io.writeln", |args| {
        let mut text = args.first().map(|v| v.to_string()).unwrap_or_default();
        text.push('\n');
        write_locked(&text, false);
        Value::Nil
    });

    bridge.register("io.flush", |_args| {
        write_locked("", true);
        Value::Nil
    });

    // Blocking line read from stdin; empty string at end of input.
    bridge.register("input", |_args| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(_) => {
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Value::string(line)
            }
            Err(_) => Value::string(""),
        }
    });
}
