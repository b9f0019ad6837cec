pub mod arity;
pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod macros;
pub mod options;
pub mod reader;
pub mod runtime;
pub mod special_forms;
pub mod vars;

use std::path::Path;

use error::SprigError;
use options::EvalOptions;
pub use runtime::Runtime;

/// Evaluates `src` in a fresh runtime and returns the value of the last form.
pub fn eval_source(src: &str, options: Option<EvalOptions>) -> Result<ast::Value, SprigError> {
    Runtime::new(options.unwrap_or_default()).eval_source(src)
}

pub fn eval_file(path: &Path, options: Option<EvalOptions>) -> Result<ast::Value, SprigError> {
    Runtime::new(options.unwrap_or_default()).eval_file(path)
}
