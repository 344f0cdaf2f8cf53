//! The core behavioral scenarios against the standard host library.

use mondot::{CompileError, Engine, EngineError, Value};

use super::{assert_returns_number, eval_handler};

#[test]
fn locals_and_host_arithmetic() {
    assert_returns_number(
        "unit U { on T -> () local x = 2; local y = add(x, 3); return y; end }",
        "U",
        "T",
        5.0,
    );
}

#[test]
fn while_loop_sums() {
    assert_returns_number(
        "unit U { on T -> () local s = 0; local i = 0;
            while (lt(i, 5)) s = add(s, i); i = add(i, 1); end
            return s; end }",
        "U",
        "T",
        10.0,
    );
}

#[test]
fn foreach_counts_string_characters() {
    assert_returns_number(
        "unit U { on T -> () local n = 0;
            foreach c in \"abc\" n = add(n, 1); end return n; end }",
        "U",
        "T",
        3.0,
    );
}

#[test]
fn foreach_visits_characters_in_order() {
    assert_returns_number(
        // Collect each character's contribution: "abc" has byte values
        // that str_char_at exposes one at a time; build "abc" back up
        // and compare.
        "unit U { on T -> () local out = \"\";
            foreach c in \"abc\" out = add(out, c); end
            return eq(out, \"abc\"); end }",
        "U",
        "T",
        1.0,
    );
}

#[test]
fn foreach_over_empty_string_skips_body() {
    assert_returns_number(
        "unit U { on T -> () local n = 0;
            foreach c in \"\" n = add(n, 1); end return n; end }",
        "U",
        "T",
        0.0,
    );
}

#[test]
fn if_elseif_else_selects_one_branch() {
    let src = "unit U { on Pick -> (n) local out = 0;
        if (eq(n, 1)) out = 10;
        elseif (eq(n, 2)) out = 20;
        elseif (eq(n, 3)) out = 30;
        else out = 99;
        end
        return out; end }";
    let engine = Engine::new();
    engine.load_str(src).unwrap();
    for (arg, expected) in [(1.0, 10.0), (2.0, 20.0), (3.0, 30.0), (7.0, 99.0)] {
        let ret = engine.call("U", "Pick", &[Value::Number(arg)]);
        assert_eq!(ret, Value::Number(expected), "Pick({})", arg);
    }
}

#[test]
fn handler_parameters_receive_arguments() {
    let engine = Engine::new();
    engine
        .load_str("unit U { on Sum -> (a, b) return add(a, b); end }")
        .unwrap();
    let ret = engine.call("U", "Sum", &[Value::Number(4.0), Value::Number(2.5)]);
    assert_eq!(ret, Value::Number(6.5));
}

#[test]
fn missing_arguments_are_nil() {
    let engine = Engine::new();
    engine
        .load_str("unit U { on Probe -> (a) return eq(a, nil); end }")
        .unwrap();
    assert_eq!(engine.call("U", "Probe", &[]), Value::Number(1.0));
}

#[test]
fn string_builtins_compose() {
    assert_returns_number(
        "unit U { on T -> () local s = \"hello world\";
            local w = substr(s, 6);
            return eq(index_of(s, w), 6); end }",
        "U",
        "T",
        1.0,
    );
}

#[test]
fn nested_handler_logic_with_booleans() {
    assert_returns_number(
        "unit U { on T -> () local flag = true;
            if (flag) return 1; end
            return 0; end }",
        "U",
        "T",
        1.0,
    );
}

#[test]
fn handler_without_return_yields_nil() {
    let ret = eval_handler("unit U { on T -> () local x = 1; end }", "U", "T");
    assert_eq!(ret, Value::Nil);
}

#[test]
fn calling_missing_module_yields_nil() {
    let engine = Engine::new();
    assert_eq!(engine.call("Ghost", "T", &[]), Value::Nil);
}

#[test]
fn unresolved_identifier_aborts_unit() {
    let engine = Engine::new();
    let err = engine
        .load_str("unit U { on T -> () return nonexistent; end }")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Compile(CompileError::UnresolvedIdentifier { ref name, .. })
            if name == "nonexistent"
    ));
    // No partial module was published.
    assert!(engine.manager().get("U").is_none());
}

#[test]
fn unresolved_function_aborts_unit() {
    let engine = Engine::new();
    let err = engine
        .load_str("unit U { on T -> () local x = blorp(1); return x; end }")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Compile(CompileError::UnresolvedFunction { .. })
    ));
    assert!(engine.manager().get("U").is_none());
}

#[test]
fn multiple_units_publish_independently() {
    let engine = Engine::new();
    let names = engine
        .load_str("unit A { on T -> () return 1; end } unit B { on T -> () return 2; end }")
        .unwrap();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(engine.call("A", "T", &[]), Value::Number(1.0));
    assert_eq!(engine.call("B", "T", &[]), Value::Number(2.0));
}

#[test]
fn host_functions_registered_after_load_are_invisible_to_it() {
    let engine = Engine::new();
    let err = engine
        .load_str("unit U { on T -> () return custom(); end }")
        .unwrap_err();
    assert!(matches!(err, EngineError::Compile(_)));

    engine.bridge().register("custom", |_| Value::Number(7.0));
    engine
        .load_str("unit U { on T -> () return custom(); end }")
        .unwrap();
    assert_eq!(engine.call("U", "T", &[]), Value::Number(7.0));
}
