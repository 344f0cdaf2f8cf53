//! String builtins. Indices are byte offsets, matching the counted
//! traversal the compiler emits for `foreach`.

use mondot_core::Value;

use crate::bridge::HostBridge;

pub fn register(bridge: &HostBridge) {
    bridge.register("strlen", |args| match args.first() {
        Some(Value::String(s)) => Value::Number(s.len() as f64),
        _ => Value::Number(0.0),
    });

    // Single-character string at a byte index, empty out of range.
    bridge.register("str_char_at", |args| {
        if let (Some(Value::String(s)), Some(Value::Number(idx))) = (args.first(), args.get(1)) {
            let idx = *idx as i64;
            if idx >= 0 && (idx as usize) < s.len() {
                let b = s.as_bytes()[idx as usize];
                return Value::string((b as char).to_string());
            }
        }
        Value::string("")
    });

    // substr(s, start[, len]) - clamped to the string bounds.
    bridge.register("substr", |args| {
        if let (Some(Value::String(s)), Some(Value::Number(start))) = (args.first(), args.get(1)) {
            let start = (*start as i64).max(0) as usize;
            if start >= s.len() {
                return Value::string("");
            }
            let mut len = s.len() - start;
            if let Some(Value::Number(l)) = args.get(2) {
                if *l >= 0.0 {
                    len = len.min(*l as usize);
                }
            }
            return Value::string(&s[start..start + len]);
        }
        Value::string("")
    });

    // First byte index of a substring, or -1.
    bridge.register("index_of", |args| {
        if let (Some(Value::String(s)), Some(Value::String(needle))) = (args.first(), args.get(1))
        {
            return match s.find(&**needle) {
                Some(pos) => Value::Number(pos as f64),
                None => Value::Number(-1.0),
            };
        }
        Value::Number(-1.0)
    });

    bridge.register("to_string", |args| match args.first() {
        Some(v) => Value::string(v.to_string()),
        None => Value::string("nil"),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use mondot_vm::HostDispatch;

    fn bridge() -> HostBridge {
        let b = HostBridge::new();
        register(&b);
        b
    }

    #[test]
    fn strlen_counts_bytes() {
        let b = bridge();
        assert_eq!(
            b.invoke("strlen", &[Value::string("abc")]),
            Value::Number(3.0)
        );
        assert_eq!(b.invoke("strlen", &[Value::Number(3.0)]), Value::Number(0.0));
        assert_eq!(b.invoke("strlen", &[]), Value::Number(0.0));
    }

    #[test]
    fn char_at_bounds() {
        let b = bridge();
        let s = Value::string("abc");
        assert_eq!(
            b.invoke("str_char_at", &[s.clone(), Value::Number(0.0)]),
            Value::string("a")
        );
        assert_eq!(
            b.invoke("str_char_at", &[s.clone(), Value::Number(2.0)]),
            Value::string("c")
        );
        assert_eq!(
            b.invoke("str_char_at", &[s.clone(), Value::Number(3.0)]),
            Value::string("")
        );
        assert_eq!(
            b.invoke("str_char_at", &[s, Value::Number(-1.0)]),
            Value::string("")
        );
    }

    #[test]
    fn substr_clamps() {
        let b = bridge();
        let s = Value::string("hello world");
        assert_eq!(
            b.invoke("substr", &[s.clone(), Value::Number(6.0)]),
            Value::string("world")
        );
        assert_eq!(
            b.invoke(
                "substr",
                &[s.clone(), Value::Number(0.0), Value::Number(5.0)]
            ),
            Value::string("hello")
        );
        assert_eq!(
            b.invoke(
                "substr",
                &[s.clone(), Value::Number(6.0), Value::Number(99.0)]
            ),
            Value::string("world")
        );
        assert_eq!(
            b.invoke("substr", &[s, Value::Number(50.0)]),
            Value::string("")
        );
    }

    #[test]
    fn index_of_finds_first() {
        let b = bridge();
        assert_eq!(
            b.invoke(
                "index_of",
                &[Value::string("banana"), Value::string("na")]
            ),
            Value::Number(2.0)
        );
        assert_eq!(
            b.invoke("index_of", &[Value::string("abc"), Value::string("z")]),
            Value::Number(-1.0)
        );
    }

    #[test]
    fn to_string_all_variants() {
        let b = bridge();
        assert_eq!(
            b.invoke("to_string", &[Value::Number(2.5)]),
            Value::string("2.5")
        );
        assert_eq!(b.invoke("to_string", &[Value::Nil]), Value::string("nil"));
        assert_eq!(b.invoke("to_string", &[]), Value::string("nil"));
    }
}
