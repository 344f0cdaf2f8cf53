//! Property-style checks over compiled bytecode and the registry.

use std::sync::Arc;

use mondot::{compile_unit, parse_program, Bytecode, Engine, HostManifest, Module};

fn compile(src: &str) -> Bytecode {
    let program = parse_program(src).unwrap();
    let manifest = HostManifest::with_names(["add", "lt", "strlen", "str_char_at", "io.print"]);
    compile_unit(&program.units[0], &manifest).unwrap()
}

const BRANCHY_UNIT: &str = "unit Branchy {
    on Walk -> (n) local total = 0;
        if (lt(n, 0)) total = 1;
        elseif (lt(n, 10)) total = 2;
        else total = 3;
        end
        while (lt(total, 10)) total = add(total, 1); end
        foreach c in \"xyz\" total = add(total, 1); end
        return total;
    end
    on Other -> () io.print(\"side\"); end
}";

#[test]
fn all_jump_targets_are_in_range() {
    let bytecode = compile(BRANCHY_UNIT);
    for func in &bytecode.functions {
        for ins in &func.code {
            if ins.is_jump() {
                assert!(
                    (ins.a as usize) < func.code.len(),
                    "jump to {} in a {}-instruction function",
                    ins.a,
                    func.code.len()
                );
            }
        }
    }
}

#[test]
fn all_slot_and_const_operands_are_in_range() {
    let bytecode = compile(BRANCHY_UNIT);
    for func in &bytecode.functions {
        for ins in &func.code {
            if ins.touches_local() {
                assert!((ins.a as usize) < func.locals.len());
            }
            if ins.touches_const() {
                assert!((ins.a as usize) < func.consts.len());
            }
        }
    }
}

#[test]
fn handler_index_points_into_functions() {
    let bytecode = compile(BRANCHY_UNIT);
    for (name, &idx) in &bytecode.handler_index {
        assert!(
            idx < bytecode.functions.len(),
            "handler `{}` points past the function list",
            name
        );
    }
}

#[test]
fn recompilation_produces_identical_streams() {
    let a = compile(BRANCHY_UNIT);
    let b = compile(BRANCHY_UNIT);
    assert_eq!(a.functions.len(), b.functions.len());
    for (fa, fb) in a.functions.iter().zip(&b.functions) {
        assert_eq!(fa.code, fb.code);
        assert_eq!(fa.consts, fb.consts);
        assert_eq!(fa.locals, fb.locals);
    }
}

#[test]
fn publish_then_get_is_linearizable() {
    let engine = Engine::new();
    let bytecode = compile(BRANCHY_UNIT);
    let module = Arc::new(Module::new(bytecode));
    engine.manager().publish(Arc::clone(&module));
    let seen = engine.manager().get("Branchy").unwrap();
    assert!(Arc::ptr_eq(&module, &seen));
}

#[test]
fn active_call_sum_is_zero_at_rest() {
    let engine = Engine::new();
    engine
        .load_str("unit A { on T -> () return 1; end } unit B { on T -> () return 2; end }")
        .unwrap();
    engine.call("A", "T", &[]);
    engine.call("B", "T", &[]);
    let total: u32 = engine
        .manager()
        .snapshot()
        .iter()
        .map(|m| m.active_calls())
        .sum();
    assert_eq!(total, 0);
}
