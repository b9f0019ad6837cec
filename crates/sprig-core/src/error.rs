use std::fmt;

use crate::ast::Span;
use thiserror::Error;

pub const ERROR_TAG: &str = "\x1b[31m[ERROR]\x1b[0m";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    pub span: Option<Span>,
    pub stack: Vec<StackFrame>,
    pub file: Option<String>,
}

impl ErrorContext {
    fn set_span(&mut self, span: Span) {
        if self.span.is_none() {
            self.span = Some(span);
        }
    }

    fn set_file(&mut self, file: Option<String>) {
        if self.file.is_none() {
            self.file = file;
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeErrorData {
    pub message: String,
    pub context: ErrorContext,
}

impl RuntimeErrorData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }
}

impl fmt::Display for RuntimeErrorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Clone, Debug)]
pub struct ParseErrorData {
    pub message: String,
    /// Set when the input ended inside an open list, vector or string.
    pub incomplete: bool,
    pub context: ErrorContext,
}

impl ParseErrorData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            incomplete: false,
            context: ErrorContext::default(),
        }
    }
}

impl fmt::Display for ParseErrorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Error, Debug, Clone)]
pub enum SprigError {
    #[error("Unable to resolve symbol: {0}")]
    UnboundSymbol(RuntimeErrorData),

    #[error("Arity mismatch: {0}")]
    ArityMismatch(RuntimeErrorData),

    #[error("Not invocable: {0}")]
    NotInvocable(RuntimeErrorData),

    #[error("Malformed special form: {0}")]
    MalformedSpecialForm(RuntimeErrorData),

    #[error("{0}")]
    Native(RuntimeErrorData),

    #[error("Parse error: {0}")]
    Parse(ParseErrorData),

    #[error("Call depth exceeded: {0}")]
    DepthExceeded(RuntimeErrorData),
}

impl SprigError {
    pub fn unbound_symbol(name: impl Into<String>) -> Self {
        SprigError::UnboundSymbol(RuntimeErrorData::new(name))
    }

    pub fn arity(message: impl Into<String>) -> Self {
        SprigError::ArityMismatch(RuntimeErrorData::new(message))
    }

    pub fn not_invocable(message: impl Into<String>) -> Self {
        SprigError::NotInvocable(RuntimeErrorData::new(message))
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        SprigError::MalformedSpecialForm(RuntimeErrorData::new(message))
    }

    pub fn native(message: impl Into<String>) -> Self {
        SprigError::Native(RuntimeErrorData::new(message))
    }

    pub fn parse(message: impl Into<String>) -> Self {
        SprigError::Parse(ParseErrorData::new(message))
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        let mut data = ParseErrorData::new(message);
        data.incomplete = true;
        SprigError::Parse(data)
    }

    pub fn depth_exceeded(limit: usize) -> Self {
        SprigError::DepthExceeded(RuntimeErrorData::new(format!(
            "more than {} nested calls",
            limit
        )))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.context_mut().set_span(span);
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.context_mut().set_file(file);
        self
    }

    /// Records that the error passed out of the named callee.
    pub fn push_frame(mut self, function: impl Into<String>, span: Option<Span>) -> Self {
        self.context_mut().stack.push(StackFrame {
            function: function.into(),
            span,
        });
        self
    }

    pub fn span(&self) -> Option<Span> {
        self.context_ref().span
    }

    pub fn file(&self) -> Option<&str> {
        self.context_ref().file.as_deref()
    }

    /// Innermost callee first.
    pub fn stack(&self) -> &[StackFrame] {
        self.context_ref().stack.as_slice()
    }

    pub fn message(&self) -> &str {
        match self {
            SprigError::Parse(data) => &data.message,
            SprigError::UnboundSymbol(data)
            | SprigError::ArityMismatch(data)
            | SprigError::NotInvocable(data)
            | SprigError::MalformedSpecialForm(data)
            | SprigError::Native(data)
            | SprigError::DepthExceeded(data) => &data.message,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, SprigError::Parse(data) if data.incomplete)
    }

    fn context_ref(&self) -> &ErrorContext {
        match self {
            SprigError::UnboundSymbol(data)
            | SprigError::ArityMismatch(data)
            | SprigError::NotInvocable(data)
            | SprigError::MalformedSpecialForm(data)
            | SprigError::Native(data)
            | SprigError::DepthExceeded(data) => &data.context,
            SprigError::Parse(data) => &data.context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            SprigError::UnboundSymbol(data)
            | SprigError::ArityMismatch(data)
            | SprigError::NotInvocable(data)
            | SprigError::MalformedSpecialForm(data)
            | SprigError::Native(data)
            | SprigError::DepthExceeded(data) => &mut data.context,
            SprigError::Parse(data) => &mut data.context,
        }
    }
}

pub fn format_error(err: &SprigError) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{} {}", ERROR_TAG, err));
    if let Some(location) = format_error_location(err.file(), err.span()) {
        lines.push(format!("  at {}", location));
    }
    for frame in err.stack() {
        match format_error_location(err.file(), frame.span) {
            Some(location) => lines.push(format!("  at {} ({})", frame.function, location)),
            None => lines.push(format!("  at {}", frame.function)),
        }
    }
    lines
}

fn format_error_location(file: Option<&str>, span: Option<Span>) -> Option<String> {
    let file_name = file.unwrap_or("unknown");
    match span {
        Some(span) => Some(format!("{}:{}:{}", file_name, span.line, span.col)),
        None => file.map(|name| name.to_string()),
    }
}

impl From<String> for SprigError {
    fn from(s: String) -> Self {
        SprigError::native(s)
    }
}

impl From<&str> for SprigError {
    fn from(s: &str) -> Self {
        SprigError::native(s.to_string())
    }
}
