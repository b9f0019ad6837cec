use crate::ast::Value;
use crate::error::SprigError;
use crate::vars::VarRegistry;

#[macro_export]
macro_rules! def_builtin {
    ($vars:expr, $name:expr, $arity:expr, |$args:ident| $body:block) => {
        $vars.define_var(
            $name,
            $crate::ast::Value::native_fn_with_name($name, $arity, move |$args: &[$crate::ast::Value]| -> Result<$crate::ast::Value, $crate::error::SprigError> {
                $body
            }),
        );
    };
    ($vars:expr, $name:expr, $arity:expr, |$args:ident| $body:expr) => {
        $vars.define_var(
            $name,
            $crate::ast::Value::native_fn_with_name($name, $arity, move |$args: &[$crate::ast::Value]| -> Result<$crate::ast::Value, $crate::error::SprigError> {
                $body
            }),
        );
    };
}

pub use def_builtin;

mod core;
mod math;

/// Defines the bootstrap built-ins as Vars in `vars`.
pub fn install_core(vars: &VarRegistry) {
    math::install(vars);
    core::install(vars);
}

pub fn err<T>(msg: impl Into<String>) -> Result<T, SprigError> {
    Err(SprigError::native(msg))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(n) => Value::Int(n),
            Num::Float(n) => Value::Float(n),
        }
    }
}

pub(crate) fn as_number(op: &str, idx: usize, value: &Value) -> Result<Num, SprigError> {
    match value {
        Value::Int(n) => Ok(Num::Int(*n)),
        Value::Float(n) => Ok(Num::Float(*n)),
        other => err(format!(
            "{} expects number (arg {}), got {}",
            op,
            idx + 1,
            other.type_name()
        )),
    }
}

pub(crate) fn as_index(op: &str, value: &Value) -> Result<usize, SprigError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        other => err(format!("{} expects non-negative int index, got {}", op, other)),
    }
}
