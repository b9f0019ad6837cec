use std::path::PathBuf;

use sprig_core::options::EvalOptions;

pub const USAGE: &str = "Usage: sprig [--repl] [-e CODE] [--max-depth N] [--no-builtins] [file]";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub repl: bool,
    pub code: Option<String>,
    pub max_depth: Option<usize>,
    pub no_builtins: bool,
    pub file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
    Version,
}

impl CliArgs {
    /// True when nothing is given to run, or `--repl` asks to stay
    /// interactive after it.
    pub fn wants_repl(&self) -> bool {
        self.repl || (self.code.is_none() && self.file.is_none())
    }

    /// Environment defaults with the command line flags layered on top.
    pub fn eval_options(&self) -> EvalOptions {
        let mut opts = EvalOptions::default();
        if let Some(depth) = self.max_depth {
            opts.max_depth = Some(depth);
        }
        if self.no_builtins {
            opts.no_builtins = true;
        }
        opts
    }
}

pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--repl" => parsed.repl = true,
            "--no-builtins" => parsed.no_builtins = true,
            "-e" => {
                let code = args.next().ok_or("-e requires CODE")?;
                parsed.code = Some(code);
            }
            "--max-depth" => {
                let raw = args.next().ok_or("--max-depth requires a value")?;
                parsed.max_depth = Some(parse_max_depth(&raw)?);
            }
            "--version" => return Ok(Command::Version),
            "-h" | "--help" => return Ok(Command::Help),
            s if s.starts_with('-') && s.len() > 1 => {
                return Err(format!("unknown option: {}", s));
            }
            _ => {
                if parsed.file.is_some() {
                    return Err(format!("unexpected argument: {}", arg));
                }
                parsed.file = Some(PathBuf::from(arg));
            }
        }
    }
    if parsed.code.is_some() && parsed.file.is_some() {
        return Err("-e and a file cannot be combined".to_string());
    }
    Ok(Command::Run(parsed))
}

fn parse_max_depth(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("--max-depth must be a positive integer: {}", raw)),
    }
}
