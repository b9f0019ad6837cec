use sprig_core::ast::Value;
use sprig_core::error::SprigError;
use sprig_core::options::EvalOptions;
use sprig_core::Runtime;
use sprig_lang::repl::{ReplOutcome, ReplSession};

fn session() -> ReplSession {
    ReplSession::new(Runtime::new(EvalOptions::default().with_max_depth(40)))
}

fn value(outcome: ReplOutcome) -> Value {
    match outcome {
        ReplOutcome::Value(v) => v,
        other => panic!("expected a value, got {:?}", other),
    }
}

fn error(outcome: ReplOutcome) -> SprigError {
    match outcome {
        ReplOutcome::Error(err) => err,
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn evaluates_lines_in_one_context() {
    let mut s = session();
    assert!(matches!(value(s.handle_line("(def x 41)")), Value::Int(41)));
    assert_eq!(value(s.handle_line("(inc x)")), Value::Int(42));
    assert!(matches!(s.handle_line("   "), ReplOutcome::Empty));
}

#[test]
fn unfinished_forms_continue_on_the_next_line() {
    let mut s = session();
    assert_eq!(s.prompt(), "sprig> ");
    assert!(matches!(s.handle_line("(defn add [a b]"), ReplOutcome::Incomplete));
    assert!(s.is_continuing());
    assert_eq!(s.prompt(), "  ...> ");
    assert!(matches!(s.handle_line(""), ReplOutcome::Incomplete));
    assert!(matches!(value(s.handle_line("  (+ a b))")), Value::Func(_)));
    assert!(!s.is_continuing());
    assert_eq!(value(s.handle_line("(add 2 3)")), Value::Int(5));
}

#[test]
fn complete_forms_wait_for_an_unfinished_one() {
    let mut s = session();
    s.handle_line("(def n 0)");
    assert!(matches!(
        s.handle_line("(def n (inc n)) (list n"),
        ReplOutcome::Incomplete
    ));
    assert_eq!(s.runtime().lookup_var("n"), Some(Value::Int(0)));
    assert_eq!(
        value(s.handle_line("n)")),
        Value::list(vec![Value::Int(1), Value::Int(1)])
    );
}

#[test]
fn errors_leave_the_session_usable() {
    let mut s = session();
    let err = error(s.handle_line("(missing 1)"));
    assert!(matches!(err, SprigError::UnboundSymbol(_)));
    let err = error(s.handle_line("(+ 1 2))"));
    assert!(matches!(err, SprigError::Parse(_)));
    assert!(!s.is_continuing());
    assert_eq!(value(s.handle_line("(+ 1 2)")), Value::Int(3));
}

#[test]
fn discarding_pending_input() {
    let mut s = session();
    assert!(matches!(s.handle_line("(list 1"), ReplOutcome::Incomplete));
    s.discard_pending();
    assert!(!s.is_continuing());
    assert_eq!(value(s.handle_line("2")), Value::Int(2));
}

#[test]
fn meta_commands() {
    let mut s = session();
    assert!(matches!(s.handle_line(":q"), ReplOutcome::Exit));
    assert!(matches!(s.handle_line(" :QUIT "), ReplOutcome::Exit));
    s.handle_line("(def answer 42)");
    match s.handle_line(":vars") {
        ReplOutcome::Lines(lines) => assert!(lines.contains(&"answer = 42".to_string())),
        other => panic!("expected lines, got {:?}", other),
    }
    assert!(matches!(s.handle_line(":help"), ReplOutcome::Lines(_)));
}

#[test]
fn meta_commands_inside_a_form_are_plain_input() {
    let mut s = session();
    assert!(matches!(s.handle_line("(list"), ReplOutcome::Incomplete));
    assert!(matches!(s.handle_line(":q"), ReplOutcome::Incomplete));
    let err = error(s.handle_line(")"));
    assert!(matches!(err, SprigError::UnboundSymbol(_)));
}
