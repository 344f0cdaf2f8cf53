//! Numeric builtins: arithmetic, comparison, bit shifts.
//!
//! Comparison results are numbers (1/0), not booleans, matching what
//! the compiled loop conditions expect.

use mondot_core::Value;

use crate::bridge::HostBridge;

fn two_numbers(args: &[Value]) -> Option<(f64, f64)> {
    let a = args.first()?.as_number()?;
    let b = args.get(1)?.as_number()?;
    Some((a, b))
}

fn flag(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}

pub fn register(bridge: &HostBridge) {
    // add is the polymorphic workhorse: numbers add, strings
    // concatenate, mixed operands stringify and concatenate.
    bridge.register("add", |args| match (args.first(), args.get(1)) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => Value::Number(a + b),
        (Some(Value::String(a)), Some(Value::String(b))) => {
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Value::string(out)
        }
        (Some(a), Some(b)) => Value::string(format!("{}{}", a, b)),
        _ => Value::Number(0.0),
    });

    bridge.register("sub", |args| match two_numbers(args) {
        Some((a, b)) => Value::Number(a - b),
        None => Value::Number(0.0),
    });

    bridge.register("mul", |args| match two_numbers(args) {
        Some((a, b)) => Value::Number(a * b),
        None => Value::Number(0.0),
    });

    bridge.register("div", |args| match two_numbers(args) {
        Some((_, b)) if b == 0.0 => Value::Number(0.0),
        Some((a, b)) => Value::Number(a / b),
        None => Value::Number(0.0),
    });

    bridge.register("lt", |args| match two_numbers(args) {
        Some((a, b)) => flag(a < b),
        None => flag(false),
    });

    bridge.register("gt", |args| match two_numbers(args) {
        Some((a, b)) => flag(a > b),
        None => flag(false),
    });

    bridge.register("eq", |args| match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => flag(a == b),
        _ => flag(false),
    });

    bridge.register("neq", |args| match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => flag(a != b),
        _ => flag(false),
    });

    // Integer semantics by cast; shift counts outside 0..63 yield 0.
    bridge.register("shift", |args| match two_numbers(args) {
        Some((a, b)) if (0.0..63.0).contains(&b) => {
            Value::Number(((a as i64) << (b as i64)) as f64)
        }
        _ => Value::Number(0.0),
    });

    bridge.register("bitwise", |args| match two_numbers(args) {
        Some((a, b)) if (0.0..63.0).contains(&b) => {
            Value::Number(((a as i64) >> (b as i64)) as f64)
        }
        _ => Value::Number(0.0),
    });
}
