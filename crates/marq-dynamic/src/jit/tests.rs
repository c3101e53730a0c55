use std::sync::{Arc, Barrier};

use marq_core::value::{Instance, Value};
use marq_test::{widget_type, LineParser, WIDGET_MARKUP};

use super::JitCompiler;
use crate::error::JitError;

fn compiler() -> JitCompiler {
    marq_test::init_tracing();
    JitCompiler::new(Arc::new(LineParser))
}

#[test]
fn compiled_markup_populates_all_member_kinds() {
    let compiler = compiler();
    let target = widget_type();
    let populate = compiler
        .compile_text(&target, "demo/demo.Widget.marq", WIDGET_MARKUP)
        .unwrap();

    // `Result<PopulateFn, _>` must be unwrappable in tests.
    assert!(format!("{populate:?}").starts_with("PopulateFn"));

    let mut instance = Instance::new("demo.Widget");
    populate.populate(&mut instance);

    assert_eq!(
        instance.get("margin"),
        Some(&Value::Box4([2.0, 4.0, 2.0, 4.0]))
    );
    assert_eq!(instance.get("size"), Some(&Value::Vec2([1.5, 2.5])));
    assert_eq!(
        instance.get("tint"),
        Some(&Value::Color([1.0, 0.0, 0.0, 1.0]))
    );
    assert_eq!(
        instance.get("title"),
        Some(&Value::Text("hello".to_owned()))
    );
    assert_eq!(instance.get("opacity"), None);
}

#[test]
fn name_property_registers_in_the_call_scope() {
    let compiler = compiler();
    let target = widget_type();
    let populate = compiler
        .compile_text(&target, "demo/demo.Widget.marq", "name = header")
        .unwrap();

    let mut instance = Instance::new("demo.Widget");
    let ctx = populate.populate(&mut instance);
    assert_eq!(ctx.names.find("header"), Some("demo.Widget"));
}

#[test]
fn parse_fault_surfaces_as_compile_error_with_hint() {
    let compiler = compiler();
    let err = compiler
        .compile_text(&widget_type(), "demo/Bad.marq", "no separator here")
        .unwrap_err();
    match err {
        JitError::Compile { hint, .. } => {
            assert_eq!(hint.as_deref(), Some("markup does not parse"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_member_surfaces_as_compile_error() {
    let compiler = compiler();
    let err = compiler
        .compile_text(&widget_type(), "demo/Bad.marq", "bogus = 1")
        .unwrap_err();
    assert!(matches!(err, JitError::Compile { .. }));
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn concurrent_first_use_builds_one_dynamic_module() {
    let compiler = Arc::new(compiler());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let compiler = Arc::clone(&compiler);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                let populate = compiler
                    .compile_text(&widget_type(), "demo/demo.Widget.marq", WIDGET_MARKUP)
                    .unwrap();
                let mut instance = Instance::new("demo.Widget");
                populate.populate(&mut instance);
                assert_eq!(instance.get("size"), Some(&Value::Vec2([1.5, 2.5])));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(compiler.modules_built(), 1);
}
