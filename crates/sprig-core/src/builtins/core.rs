use std::io::{self, Write};

use crate::ast::{FnArity, Value, Vector};
use crate::builtins::{as_index, err};
use crate::error::SprigError;
use crate::macros::next_gensym;
use crate::vars::VarRegistry;

pub(crate) fn install(vars: &VarRegistry) {
    def_builtin!(vars, "not", FnArity::exact(1), |args| {
        Ok(Value::Bool(!args[0].truthy()))
    });

    // --- Sequences ---
    def_builtin!(vars, "list", FnArity::at_least(0), |args| {
        Ok(Value::list(args.iter().cloned()))
    });
    def_builtin!(vars, "vector", FnArity::at_least(0), |args| {
        Ok(Value::vector(args.iter().cloned()))
    });
    def_builtin!(vars, "cons", FnArity::exact(2), |args| {
        let mut items = seq_items("cons", &args[1])?;
        items.push_front(args[0].clone());
        Ok(Value::List(items))
    });
    def_builtin!(vars, "first", FnArity::exact(1), |args| {
        let items = seq_items("first", &args[0])?;
        Ok(items.front().cloned().unwrap_or(Value::Nil))
    });
    def_builtin!(vars, "rest", FnArity::exact(1), |args| {
        let items = seq_items("rest", &args[0])?;
        Ok(Value::List(items.skip(items.len().min(1))))
    });
    def_builtin!(vars, "count", FnArity::exact(1), |args| {
        let len = match &args[0] {
            Value::String(s) => s.chars().count(),
            other => seq_items("count", other)?.len(),
        };
        Ok(Value::Int(len as i64))
    });
    def_builtin!(vars, "concat", FnArity::at_least(0), |args| {
        let mut out = Vector::new();
        for arg in args {
            out.append(seq_items("concat", arg)?);
        }
        Ok(Value::List(out))
    });
    def_builtin!(vars, "nth", FnArity::range(2, 3), |args| {
        let items = seq_items("nth", &args[0])?;
        let idx = as_index("nth", &args[1])?;
        match (items.get(idx), args.get(2)) {
            (Some(item), _) => Ok(item.clone()),
            (None, Some(default)) => Ok(default.clone()),
            (None, None) => err(format!("nth index {} out of bounds for length {}", idx, items.len())),
        }
    });

    // --- Predicates ---
    def_builtin!(vars, "nil?", FnArity::exact(1), |args| {
        Ok(Value::Bool(matches!(args[0], Value::Nil)))
    });
    def_builtin!(vars, "list?", FnArity::exact(1), |args| {
        Ok(Value::Bool(matches!(args[0], Value::List(_))))
    });
    def_builtin!(vars, "symbol?", FnArity::exact(1), |args| {
        Ok(Value::Bool(matches!(args[0], Value::Symbol(_))))
    });
    def_builtin!(vars, "fn?", FnArity::exact(1), |args| {
        Ok(Value::Bool(args[0].is_callable()))
    });

    // --- Strings and symbols ---
    def_builtin!(vars, "str", FnArity::at_least(0), |args| {
        let text: String = args
            .iter()
            .filter(|arg| !matches!(arg, Value::Nil))
            .map(Value::to_plain_string)
            .collect();
        Ok(Value::String(text))
    });
    def_builtin!(vars, "symbol", FnArity::exact(1), |args| {
        match &args[0] {
            Value::String(name) | Value::Symbol(name) => Ok(Value::Symbol(name.clone())),
            other => err(format!("symbol expects string, got {}", other.type_name())),
        }
    });
    def_builtin!(vars, "gensym", FnArity::range(0, 1), |args| {
        let prefix = match args.first() {
            None => "G".to_string(),
            Some(Value::String(p)) | Some(Value::Symbol(p)) => p.clone(),
            Some(other) => return err(format!("gensym expects string prefix, got {}", other.type_name())),
        };
        Ok(Value::Symbol(next_gensym(&prefix)))
    });

    // --- Output ---
    def_builtin!(vars, "print", FnArity::at_least(0), |args| {
        write_stdout(&join_plain(args), false)
    });
    def_builtin!(vars, "println", FnArity::at_least(0), |args| {
        write_stdout(&join_plain(args), true)
    });
}

fn seq_items(op: &str, value: &Value) -> Result<Vector<Value>, SprigError> {
    match value {
        Value::List(items) | Value::Vector(items) => Ok(items.clone()),
        Value::Nil => Ok(Vector::new()),
        other => err(format!("{} expects a list or vector, got {}", op, other.type_name())),
    }
}

fn join_plain(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_plain_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_stdout(text: &str, newline: bool) -> Result<Value, SprigError> {
    let mut out = io::stdout().lock();
    let written = if newline {
        writeln!(out, "{}", text)
    } else {
        write!(out, "{}", text).and_then(|_| out.flush())
    };
    written.map_err(|e| SprigError::native(format!("write failed: {}", e)))?;
    Ok(Value::Nil)
}
