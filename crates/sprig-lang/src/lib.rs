pub mod cli;
pub mod repl;

use std::path::Path;

use sprig_core::ast::Value;
use sprig_core::error::SprigError;
use sprig_core::Runtime;

pub use cli::{parse_args, CliArgs, Command};

/// Runs the file or `-e` code named by `cli`, returning the last value.
/// `Ok(None)` means there was nothing to run.
pub fn run_input(runtime: &Runtime, cli: &CliArgs) -> Result<Option<Value>, SprigError> {
    if let Some(code) = &cli.code {
        return runtime.eval_source(code).map(Some);
    }
    if let Some(file) = &cli.file {
        return run_file(runtime, file).map(Some);
    }
    Ok(None)
}

fn run_file(runtime: &Runtime, path: &Path) -> Result<Value, SprigError> {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    runtime.eval_file(&absolute)
}
