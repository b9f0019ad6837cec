mod common;

use common::harness;
use sprig_core::ast::Value;
use sprig_core::error::{format_error, SprigError};
use sprig_core::options::EvalOptions;
use sprig_core::Runtime;

#[test]
fn errors_abort_but_earlier_effects_stay() {
    let h = harness();
    let err = h.eval_err("(def before 1) (emit 'a) (missing) (def after 2)");
    assert!(matches!(err, SprigError::UnboundSymbol(_)));
    assert_eq!(h.emitted(), vec![Value::symbol("a")]);
    assert_eq!(h.runtime.lookup_var("before"), Some(Value::Int(1)));
    assert_eq!(h.runtime.lookup_var("after"), None);
}

#[test]
fn native_errors_surface_verbatim() {
    let h = harness();
    let err = h.eval_err("(/ 1 0)");
    assert!(matches!(err, SprigError::Native(_)));
    assert_eq!(err.message(), "division by zero");
}

#[test]
fn stack_names_each_callee_innermost_first() {
    let h = harness();
    h.eval("(defn level-2 [] (first 5))");
    h.eval("(defn level-1 [] (level-2))");
    let err = h.eval_err("(level-1)");
    let frames: Vec<&str> = err.stack().iter().map(|f| f.function.as_str()).collect();
    assert_eq!(frames, vec!["first", "level-2", "level-1"]);
    let lines = format_error(&err);
    assert!(lines[0].contains("first expects a list or vector"));
    assert!(lines.iter().any(|l| l.contains("at level-1")));
}

#[test]
fn errors_carry_the_top_level_form_position() {
    let rt = Runtime::new(EvalOptions::default().with_source_name("inline.sprig"));
    let err = rt.eval_source("(def ok 1)\n\n  (oops)").expect_err("unbound");
    let span = err.span().expect("span");
    assert_eq!((span.line, span.col), (3, 3));
    assert_eq!(err.file(), Some("inline.sprig"));
    assert!(format_error(&err)[1].contains("inline.sprig:3:3"));
}

#[test]
fn call_depth_limit() {
    let h = harness();
    h.eval("(defn forever [n] (forever (inc n)))");
    let err = h.eval_err("(forever 0)");
    assert!(matches!(err, SprigError::DepthExceeded(_)));
    assert_eq!(h.eval("((fn [] 'still-usable))"), Value::symbol("still-usable"));
}

#[test]
fn macro_recursion_counts_toward_depth() {
    let h = harness();
    h.eval("(defmacro explode [] (list 'explode-helper))");
    h.eval("(defn explode-helper [] (explode))");
    let err = h.eval_err("(explode)");
    assert!(matches!(err, SprigError::DepthExceeded(_)));
}

#[test]
fn parse_errors_stop_at_the_bad_form() {
    let h = harness();
    let err = h.eval_err("(emit 1) (emit");
    assert!(err.is_incomplete());
    assert_eq!(h.emitted(), vec![Value::Int(1)]);
    let err = h.eval_err("(emit 2))");
    assert!(matches!(err, SprigError::Parse(_)));
    assert!(!err.is_incomplete());
}
