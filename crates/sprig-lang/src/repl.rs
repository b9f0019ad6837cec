use std::path::PathBuf;

use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::debug;

use sprig_core::ast::Value;
use sprig_core::error::{format_error, SprigError, ERROR_TAG};
use sprig_core::reader::Reader;
use sprig_core::Runtime;

const PROMPT: &str = "sprig> ";
const CONTINUATION_PROMPT: &str = "  ...> ";

#[derive(Debug)]
pub enum ReplOutcome {
    /// Blank line, nothing to report.
    Empty,
    /// The buffered input stops mid-form; keep reading.
    Incomplete,
    Value(Value),
    Error(SprigError),
    Lines(Vec<String>),
    Exit,
}

/// Line handling for the interactive loop, kept apart from the editor so it
/// can be driven directly.
pub struct ReplSession {
    runtime: Runtime,
    pending: String,
}

impl ReplSession {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime,
            pending: String::new(),
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn is_continuing(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    pub fn prompt(&self) -> &'static str {
        if self.is_continuing() {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        }
    }

    pub fn handle_line(&mut self, line: &str) -> ReplOutcome {
        let trimmed = line.trim();
        if !self.is_continuing() {
            if trimmed.is_empty() {
                return ReplOutcome::Empty;
            }
            if let Some(outcome) = self.handle_meta(trimmed) {
                return outcome;
            }
        }
        if !self.pending.is_empty() {
            self.pending.push('\n');
        }
        self.pending.push_str(line);

        // Nothing runs until the whole buffer reads cleanly, so a form
        // before an unfinished one is not evaluated twice.
        match Reader::new(&self.pending).read_all() {
            Err(err) if err.is_incomplete() => return ReplOutcome::Incomplete,
            Err(err) => {
                self.pending.clear();
                return ReplOutcome::Error(err);
            }
            Ok(_) => {}
        }
        let src = std::mem::take(&mut self.pending);
        match self.runtime.eval_source(&src) {
            Ok(value) => ReplOutcome::Value(value),
            Err(err) => ReplOutcome::Error(err),
        }
    }

    fn handle_meta(&self, line: &str) -> Option<ReplOutcome> {
        if command_matches(line, &["q", "quit"]) {
            return Some(ReplOutcome::Exit);
        }
        if command_matches(line, &["vars"]) {
            let lines = self
                .runtime
                .var_names()
                .into_iter()
                .map(|name| match self.runtime.lookup_var(&name) {
                    Some(value) => format!("{} = {}", name, value),
                    None => name,
                })
                .collect();
            return Some(ReplOutcome::Lines(lines));
        }
        if command_matches(line, &["h", "help"]) {
            return Some(ReplOutcome::Lines(vec![
                ":q/:quit to exit, :vars to list defined vars".to_string(),
            ]));
        }
        None
    }
}

fn command_matches(line: &str, names: &[&str]) -> bool {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return false;
    };
    if parts.next().is_some() {
        return false;
    }
    let Some(cmd) = cmd.strip_prefix(':') else {
        return false;
    };
    let cmd = cmd.to_ascii_lowercase();
    names.iter().any(|name| cmd == *name)
}

pub fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        let mut p = PathBuf::from(home);
        p.push(".sprig_history");
        p
    })
}

pub fn print_formatted_error(err: &SprigError) {
    for line in format_error(err) {
        eprintln!("{}", line);
    }
}

pub fn interactive_repl(runtime: Runtime) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{} repl: {}", ERROR_TAG, e);
            return;
        }
    };
    let hist_path = history_path();
    if let Some(ref path) = hist_path {
        let _ = rl.load_history(path);
    }
    println!("sprig REPL. :q to quit, :vars to list vars.");
    let mut session = ReplSession::new(runtime);
    loop {
        match rl.readline(session.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                    if let Some(ref path) = hist_path {
                        let _ = rl.append_history(path);
                    }
                }
                match session.handle_line(&line) {
                    ReplOutcome::Empty | ReplOutcome::Incomplete => {}
                    ReplOutcome::Value(value) => println!("=> {}", value),
                    ReplOutcome::Error(err) => print_formatted_error(&err),
                    ReplOutcome::Lines(lines) => {
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                    ReplOutcome::Exit => break,
                }
            }
            Err(ReadlineError::Interrupted) if session.is_continuing() => {
                debug!("discarding unfinished input");
                session.discard_pending();
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} repl: {}", ERROR_TAG, e);
                break;
            }
        }
    }
}
