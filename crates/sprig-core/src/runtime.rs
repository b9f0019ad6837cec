use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::ast::Value;
use crate::error::SprigError;
use crate::eval::Evaluator;
use crate::options::EvalOptions;
use crate::reader::{Reader, ReaderOptions};
use crate::vars::{Var, VarRegistry};

/// Owns an evaluator and the registry it writes to. Top-level forms are
/// read and evaluated one at a time, so a `def` or `defmacro` applies to
/// every form after it.
pub struct Runtime {
    evaluator: Evaluator,
}

impl Runtime {
    /// A runtime with its own registry.
    pub fn new(options: EvalOptions) -> Self {
        Self::with_registry(Arc::new(VarRegistry::new()), options)
    }

    /// A runtime on the process-wide registry.
    pub fn shared(options: EvalOptions) -> Self {
        Self::with_registry(VarRegistry::global(), options)
    }

    pub fn with_registry(vars: Arc<VarRegistry>, options: EvalOptions) -> Self {
        Self {
            evaluator: Evaluator::with_options(vars, options),
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn vars(&self) -> &Arc<VarRegistry> {
        self.evaluator.vars()
    }

    pub fn eval_source(&self, src: &str) -> Result<Value, SprigError> {
        let source_name = self.evaluator.options().source_name.clone();
        self.eval_named(src, source_name)
    }

    pub fn eval_file(&self, path: &Path) -> Result<Value, SprigError> {
        let content = fs::read_to_string(path).map_err(|err| {
            SprigError::native(format!("failed to read {}: {}", path.display(), err))
        })?;
        debug!(path = %path.display(), "eval_file");
        self.eval_named(&content, Some(path.display().to_string()))
    }

    fn eval_named(&self, src: &str, source_name: Option<String>) -> Result<Value, SprigError> {
        let mut reader = Reader::new_with_options(
            src,
            ReaderOptions {
                source_name: source_name.clone(),
            },
        );
        let env = self.evaluator.global_env();
        let mut result = Value::Nil;
        while let Some(form) = reader.read_next()? {
            let span = form.span;
            result = self
                .evaluator
                .eval(&form.to_value(), &env)
                .map_err(|err| err.with_span(span).with_file(source_name.clone()))?;
        }
        Ok(result)
    }

    pub fn define_var(&self, name: &str, value: Value) -> Arc<Var> {
        self.vars().define_var(name, value)
    }

    pub fn lookup_var(&self, name: &str) -> Option<Value> {
        self.vars().lookup_var(name)
    }

    pub fn var_names(&self) -> Vec<String> {
        self.vars().names()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(EvalOptions::default())
    }
}
