use std::fmt;
use std::sync::Arc;

use crate::arity::ArityTable;
use crate::env::EnvRef;
use crate::error::SprigError;
pub use im::Vector;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub index: usize,
}

/// A datum as produced by the reader, before it is lowered to a [`Value`].
#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
}

impl Form {
    pub fn new(kind: FormKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn to_value(&self) -> Value {
        match &self.kind {
            FormKind::Symbol(name) => Value::Symbol(name.clone()),
            FormKind::Int(n) => Value::Int(*n),
            FormKind::Float(n) => Value::Float(*n),
            FormKind::String(s) => Value::String(s.clone()),
            FormKind::Bool(b) => Value::Bool(*b),
            FormKind::Nil => Value::Nil,
            FormKind::List(items) => Value::List(items.iter().map(Form::to_value).collect()),
            FormKind::Vector(items) => Value::Vector(items.iter().map(Form::to_value).collect()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormKind {
    Symbol(String),
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Nil,
    List(Vec<Form>),
    Vector(Vec<Form>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FnArity {
    min: usize,
    max: Option<usize>,
}

impl FnArity {
    pub fn new(min: usize, max: Option<usize>) -> Self {
        if let Some(max_val) = max {
            assert!(min <= max_val, "min arity cannot exceed max arity");
        }
        Self { min, max }
    }

    pub fn exact(count: usize) -> Self {
        Self::new(count, Some(count))
    }

    pub fn at_least(min: usize) -> Self {
        Self::new(min, None)
    }

    pub fn range(min: usize, max: usize) -> Self {
        Self::new(min, Some(max))
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn accepts(&self, provided: usize) -> bool {
        provided >= self.min && self.max.map_or(true, |max| provided <= max)
    }
}

impl fmt::Display for FnArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}+", self.min),
        }
    }
}

type NativeBody = dyn Fn(&[Value]) -> Result<Value, SprigError> + Send + Sync;

pub struct NativeFn {
    func: Box<NativeBody>,
    arity: FnArity,
    debug_name: Option<Arc<str>>,
}

impl NativeFn {
    pub fn new(
        arity: FnArity,
        func: impl Fn(&[Value]) -> Result<Value, SprigError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            func: Box::new(func),
            arity,
            debug_name: None,
        }
    }

    pub fn with_name(
        arity: FnArity,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, SprigError> + Send + Sync + 'static,
    ) -> Self {
        let mut nf = Self::new(arity, func);
        nf.debug_name = Some(name.into().into());
        nf
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, SprigError> {
        (self.func)(args)
    }

    pub fn arity(&self) -> FnArity {
        self.arity
    }

    pub fn debug_name(&self) -> Option<&str> {
        self.debug_name.as_deref()
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.debug_name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A user-defined function or macro: its arity bodies plus the frame chain
/// captured where the `fn`/`defmacro` form was evaluated.
pub struct Lambda {
    pub name: Option<String>,
    pub arities: ArityTable,
    pub env: EnvRef,
}

impl Lambda {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<lambda>")
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name)
            .field("arities", &self.arities)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Nil,
    Symbol(String),
    List(Vector<Value>),
    Vector(Vector<Value>),
    Func(Arc<Lambda>),
    Macro(Arc<Lambda>),
    BuiltIn(Arc<NativeFn>),
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn vector(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Vector(items.into_iter().collect())
    }

    pub fn native_fn_with_name(
        name: impl Into<String>,
        arity: FnArity,
        func: impl Fn(&[Value]) -> Result<Value, SprigError> + Send + Sync + 'static,
    ) -> Self {
        Value::BuiltIn(Arc::new(NativeFn::with_name(arity, name, func)))
    }

    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Elements of a list or vector.
    pub fn as_seq(&self) -> Option<&Vector<Value>> {
        match self {
            Value::List(items) | Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Func(_) | Value::BuiltIn(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "str",
            Value::Nil => "nil",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Func(_) | Value::BuiltIn(_) => "function",
            Value::Macro(_) => "macro",
        }
    }

    /// Text used by `str` and `print`: strings unquoted, everything else
    /// as printed by `Display`.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (
                Value::List(a) | Value::Vector(a),
                Value::List(b) | Value::Vector(b),
            ) => a == b,
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(a, b),
            (Value::Macro(a), Value::Macro(b)) => Arc::ptr_eq(a, b),
            (Value::BuiltIn(a), Value::BuiltIn(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", format_float(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => write!(f, "nil"),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(" "))
            }
            Value::Vector(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
            Value::Func(lambda) => match &lambda.name {
                Some(name) => write!(f, "#<fn {}>", name),
                None => write!(f, "#<lambda>"),
            },
            Value::Macro(lambda) => match &lambda.name {
                Some(name) => write!(f, "#<macro {}>", name),
                None => write!(f, "#<macro>"),
            },
            Value::BuiltIn(func) => match func.debug_name() {
                Some(name) => write!(f, "#<fn {}>", name),
                None => write!(f, "#<native-fn>"),
            },
        }
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}
