#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sprig_core::ast::{FnArity, Value};
use sprig_core::def_builtin;
use sprig_core::error::SprigError;
use sprig_core::options::EvalOptions;
use sprig_core::reader::Reader;
use sprig_core::Runtime;

/// Keeps recursion well inside the default test thread stack.
pub const TEST_MAX_DEPTH: usize = 40;

pub struct Harness {
    pub runtime: Runtime,
    emitted: Arc<Mutex<Vec<Value>>>,
}

/// A runtime on its own registry with an `emit` built-in that records its
/// argument and returns it, for observing evaluation order.
pub fn harness() -> Harness {
    let runtime = Runtime::new(EvalOptions {
        max_depth: Some(TEST_MAX_DEPTH),
        no_builtins: false,
        source_name: None,
    });
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let sink = emitted.clone();
    def_builtin!(runtime.vars(), "emit", FnArity::exact(1), |args| {
        sink.lock().unwrap().push(args[0].clone());
        Ok(args[0].clone())
    });
    Harness { runtime, emitted }
}

impl Harness {
    pub fn eval(&self, src: &str) -> Value {
        self.runtime
            .eval_source(src)
            .unwrap_or_else(|e| panic!("eval failed for {}: {}", src, e))
    }

    pub fn eval_err(&self, src: &str) -> SprigError {
        match self.runtime.eval_source(src) {
            Ok(value) => panic!("expected error for {}, got {}", src, value),
            Err(err) => err,
        }
    }

    pub fn emitted(&self) -> Vec<Value> {
        self.emitted.lock().unwrap().clone()
    }
}

/// The datum `src` reads as, unevaluated.
pub fn datum(src: &str) -> Value {
    let mut forms = Reader::new(src)
        .read_all()
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", src, e));
    assert_eq!(forms.len(), 1, "expected one form in {}", src);
    forms.remove(0).to_value()
}

pub fn ints(ns: &[i64]) -> Value {
    Value::list(ns.iter().map(|n| Value::Int(*n)))
}
