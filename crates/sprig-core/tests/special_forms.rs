mod common;

use common::{datum, harness};
use sprig_core::ast::Value;
use sprig_core::error::SprigError;

fn assert_malformed(src: &str) {
    let h = harness();
    let err = h.eval_err(src);
    assert!(
        matches!(err, SprigError::MalformedSpecialForm(_)),
        "{} should be malformed, got {}",
        src,
        err
    );
}

#[test]
fn if_evaluates_exactly_one_branch() {
    let h = harness();
    assert_eq!(h.eval("(if true (emit 'then) (emit 'else))"), Value::symbol("then"));
    assert_eq!(h.eval("(if nil (emit 'then) (emit 'else))"), Value::symbol("else"));
    assert_eq!(h.emitted(), vec![Value::symbol("then"), Value::symbol("else")]);
}

#[test]
fn if_truthiness_and_missing_else() {
    let h = harness();
    assert_eq!(h.eval("(if 0 'yes 'no)"), Value::symbol("yes"));
    assert_eq!(h.eval("(if () 'yes 'no)"), Value::symbol("yes"));
    assert_eq!(h.eval("(if \"\" 'yes 'no)"), Value::symbol("yes"));
    assert_eq!(h.eval("(if false 'yes)"), Value::Nil);
}

#[test]
fn do_sequences_forms() {
    let h = harness();
    assert_eq!(h.eval("(do)"), Value::Nil);
    assert_eq!(h.eval("(do (emit 1) (emit 2) 3)"), Value::Int(3));
    assert_eq!(h.emitted(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn quote_returns_forms_unevaluated() {
    let h = harness();
    assert_eq!(h.eval("'(a b [c])"), datum("(a b [c])"));
    assert_eq!(h.eval("(quote x)"), Value::symbol("x"));
    assert_eq!(h.eval("''x"), datum("(quote x)"));
}

#[test]
fn special_form_names_cannot_be_shadowed_as_operators() {
    let h = harness();
    assert_eq!(h.eval("(let [if (fn [& xs] 'shadowed)] (if true 1 2))"), Value::Int(1));
    assert_eq!(h.eval("(let [quote 5] quote)"), Value::Int(5));
}

#[test]
fn eval_uses_the_top_level_environment() {
    let h = harness();
    h.eval("(def x 'global)");
    assert_eq!(h.eval("(eval '(+ 1 2))"), Value::Int(3));
    assert_eq!(h.eval("(let [x 'local] (eval 'x))"), Value::symbol("global"));
    assert_eq!(h.eval("(let [form '(list 1 2)] (eval form))"), datum("(1 2)"));
}

#[test]
fn empty_list_and_vectors() {
    let h = harness();
    assert_eq!(h.eval("()"), Value::list(Vec::new()));
    assert_eq!(h.eval("[(emit 1) (emit 2)]"), datum("[1 2]"));
    assert_eq!(h.emitted(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn malformed_if() {
    assert_malformed("(if)");
    assert_malformed("(if true)");
    assert_malformed("(if true 1 2 3)");
}

#[test]
fn malformed_let() {
    assert_malformed("(let)");
    assert_malformed("(let x 1)");
    assert_malformed("(let [a] a)");
    assert_malformed("(let [1 2] 1)");
}

#[test]
fn malformed_fn_and_defs() {
    assert_malformed("(fn)");
    assert_malformed("(fn name)");
    assert_malformed("(fn [a &] a)");
    assert_malformed("(fn [a & b c] a)");
    assert_malformed("(fn ([a] a) 1)");
    assert_malformed("(defn)");
    assert_malformed("(defn 1 [] 1)");
    assert_malformed("(defmacro m)");
    assert_malformed("(quote)");
    assert_malformed("(quote a b)");
    assert_malformed("(eval)");
}

#[test]
fn non_invocable_operator() {
    let h = harness();
    for src in ["(1 2)", "(\"f\")", "(nil)", "('sym 1)", "([1] 0)"] {
        let err = h.eval_err(src);
        assert!(matches!(err, SprigError::NotInvocable(_)), "{}: {}", src, err);
    }
}

#[test]
fn unbound_symbol() {
    let h = harness();
    let err = h.eval_err("no-such-thing");
    assert!(matches!(err, SprigError::UnboundSymbol(_)));
    assert_eq!(err.message(), "no-such-thing");
}
