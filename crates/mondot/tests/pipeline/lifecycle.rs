//! Publication lifecycle and hot-swap behavior.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mondot::Value;

use super::{engine_with_recorder, marks};

const LIFECYCLE_UNIT: &str = r#"unit Mod {
    on Init -> () mark("init"); end
    on Reload -> () mark("reload"); end
    on Tick -> () return 1; end
}"#;

#[test]
fn init_runs_exactly_once_per_publication_lifetime() {
    let (engine, record) = engine_with_recorder();
    engine.load_str(LIFECYCLE_UNIT).unwrap();
    assert_eq!(marks(&record), vec!["init"]);

    // Calling handlers does not re-run Init.
    engine.call("Mod", "Tick", &[]);
    assert_eq!(marks(&record), vec!["init"]);
}

#[test]
fn republication_runs_reload_not_old_init() {
    let (engine, record) = engine_with_recorder();
    engine.load_str(LIFECYCLE_UNIT).unwrap();

    // Byte-differing update under the same module name.
    let updated = LIFECYCLE_UNIT.replace("return 1;", "return 2;");
    engine.load_str(&updated).unwrap();

    // The replacement is a new module object: its own Init runs once,
    // then Reload because the publication displaced a prior version.
    assert_eq!(marks(&record), vec!["init", "init", "reload"]);
    assert_eq!(engine.call("Mod", "Tick", &[]), Value::Number(2.0));
}

#[test]
fn byte_identical_republication_still_reloads() {
    let (engine, record) = engine_with_recorder();
    engine.load_str(LIFECYCLE_UNIT).unwrap();
    engine.load_str(LIFECYCLE_UNIT).unwrap();
    assert_eq!(marks(&record), vec!["init", "init", "reload"]);
    // Behavior is unchanged either way.
    assert_eq!(engine.call("Mod", "Tick", &[]), Value::Number(1.0));
}

#[test]
fn superinit_runs_once_per_engine() {
    let (engine, record) = engine_with_recorder();
    engine
        .load_str("unit A { on SuperInit -> () mark(\"super-a\"); end }")
        .unwrap();
    engine
        .load_str("unit B { on SuperInit -> () mark(\"super-b\"); end }")
        .unwrap();
    engine
        .load_str("unit A { on SuperInit -> () mark(\"super-a2\"); end }")
        .unwrap();
    assert_eq!(marks(&record), vec!["super-a"]);
}

#[test]
fn lifecycle_order_within_one_publication() {
    let (engine, record) = engine_with_recorder();
    let src = r#"unit Ordered {
        on Reload -> () mark("reload"); end
        on SuperInit -> () mark("super"); end
        on Init -> () mark("init"); end
    }"#;
    engine.load_str(src).unwrap();
    assert_eq!(marks(&record), vec!["init", "super"]);
    engine.load_str(src).unwrap();
    assert_eq!(marks(&record), vec!["init", "super", "init", "reload"]);
}

#[test]
fn displaced_module_survives_until_handler_returns() {
    let (engine, _) = engine_with_recorder();
    engine
        .load_str("unit Slow { on Long -> () sleep_ms(600); return 1; end }")
        .unwrap();
    let old = engine.manager().get("Slow").unwrap();

    // Thread A: enter a long-running handler on the old version.
    let driver = Arc::clone(engine.driver());
    let worker = thread::spawn(move || driver.run_handler("Slow", "Long", &[]));

    // Give A time to enter the frame.
    thread::sleep(Duration::from_millis(150));
    assert_eq!(old.active_calls(), 1, "handler should be in flight");

    // Thread B (this one): republish and try to reclaim.
    engine
        .load_str("unit Slow { on Long -> () return 2; end }")
        .unwrap();
    assert_eq!(engine.manager().pending_count(), 1);
    assert_eq!(engine.manager().tick_reclaim(), 0);
    assert_eq!(engine.manager().pending_count(), 1);

    // New callers already see the new version.
    assert_eq!(engine.call("Slow", "Long", &[]), Value::Number(2.0));

    // Once A returns, the displaced version is quiescent and goes.
    let ret = worker.join().unwrap();
    assert_eq!(ret, Some(Value::Number(1.0)));
    assert_eq!(old.active_calls(), 0);
    assert_eq!(engine.manager().tick_reclaim(), 1);
    assert_eq!(engine.manager().pending_count(), 0);
}

#[test]
fn run_tests_tallies_and_sets_exit_code() {
    let (engine, _) = engine_with_recorder();
    engine
        .load_str(
            "unit Good { on UTest -> () return eq(add(2, 3), 5); end }
             unit Bad  { on UTest -> () return eq(add(2, 3), 6); end }",
        )
        .unwrap();
    let report = engine.driver().run_tests();
    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.exit_code(), 2);
}

#[test]
fn run_benchmarks_times_declared_handlers() {
    let (engine, _) = engine_with_recorder();
    engine
        .load_str("unit Bench { on UBenchmark -> () sleep_ms(10); end }")
        .unwrap();
    let results = engine.driver().run_benchmarks();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].module, "Bench");
    assert!(results[0].elapsed_ms >= 10.0);
}

#[test]
fn finalize_reports_stop_requests() {
    let (engine, _) = engine_with_recorder();
    engine
        .load_str("unit Quiet { on Finalize -> () return false; end }")
        .unwrap();
    assert!(!engine.driver().finalize_all());

    engine
        .load_str("unit Loud { on Finalize -> () return true; end }")
        .unwrap();
    assert!(engine.driver().finalize_all());
}
