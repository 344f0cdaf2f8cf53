//! File builtins. Failures never surface as errors: a missing or
//! unreadable file reads as the empty string, a failed write reports
//! a zero flag.

use mondot_core::Value;

use crate::bridge::HostBridge;

pub fn register(bridge: &HostBridge) {
    bridge.register("read_file", |args| match args.first() {
        Some(Value::String(path)) => match std::fs::read_to_string(&**path) {
            Ok(content) => Value::string(content),
            Err(_) => Value::string(""),
        },
        _ => Value::string(""),
    });

    bridge.register("write_file", |args| {
        if let (Some(Value::String(path)), Some(Value::String(content))) =
            (args.first(), args.get(1))
        {
            let ok = std::fs::write(&**path, content.as_bytes()).is_ok();
            return Value::Number(if ok { 1.0 } else { 0.0 });
        }
        Value::Number(0.0)
    });
}
