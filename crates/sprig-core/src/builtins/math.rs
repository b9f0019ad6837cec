use crate::ast::{FnArity, Value};
use crate::builtins::{as_number, err, Num};
use crate::error::SprigError;
use crate::vars::VarRegistry;

pub(crate) fn install(vars: &VarRegistry) {
    // --- Arithmetic ---
    def_builtin!(vars, "+", FnArity::at_least(0), |args| {
        fold("+", args, Num::Int(0), i64::checked_add, |a, b| a + b)
    });
    def_builtin!(vars, "*", FnArity::at_least(0), |args| {
        fold("*", args, Num::Int(1), i64::checked_mul, |a, b| a * b)
    });
    def_builtin!(vars, "-", FnArity::at_least(1), |args| {
        if args.len() == 1 {
            return match as_number("-", 0, &args[0])? {
                Num::Int(n) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| SprigError::native("integer overflow in -")),
                Num::Float(n) => Ok(Value::Float(-n)),
            };
        }
        let first = as_number("-", 0, &args[0])?;
        fold("-", &args[1..], first, i64::checked_sub, |a, b| a - b)
    });
    def_builtin!(vars, "/", FnArity::at_least(1), |args| {
        let (first, rest) = match args {
            [x] => (Num::Int(1), std::slice::from_ref(x)),
            [x, rest @ ..] => (as_number("/", 0, x)?, rest),
            [] => return err("/ expects at least one number"),
        };
        let mut acc = first;
        for (idx, val) in rest.iter().enumerate() {
            let divisor = as_number("/", idx + 1, val)?;
            acc = divide(acc, divisor)?;
        }
        Ok(acc.into_value())
    });
    def_builtin!(vars, "inc", FnArity::exact(1), |args| {
        fold("inc", &args[..1], Num::Int(1), i64::checked_add, |a, b| a + b)
    });
    def_builtin!(vars, "dec", FnArity::exact(1), |args| {
        let n = as_number("dec", 0, &args[0])?;
        fold("dec", &[Value::Int(1)], n, i64::checked_sub, |a, b| a - b)
    });

    // --- Comparison ---
    def_builtin!(vars, "=", FnArity::at_least(1), |args| {
        let first = &args[0];
        Ok(Value::Bool(args[1..].iter().all(|other| other == first)))
    });
    def_builtin!(vars, "<", FnArity::at_least(1), |args| {
        cmp_chain("<", args, |a, b| a < b)
    });
    def_builtin!(vars, ">", FnArity::at_least(1), |args| {
        cmp_chain(">", args, |a, b| a > b)
    });
    def_builtin!(vars, "<=", FnArity::at_least(1), |args| {
        cmp_chain("<=", args, |a, b| a <= b)
    });
    def_builtin!(vars, ">=", FnArity::at_least(1), |args| {
        cmp_chain(">=", args, |a, b| a >= b)
    });
}

/// Integer arithmetic while every operand is an int; float as soon as one
/// is not.
fn fold(
    op: &str,
    args: &[Value],
    init: Num,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, SprigError> {
    let mut acc = init;
    for (idx, val) in args.iter().enumerate() {
        let n = as_number(op, idx, val)?;
        acc = match (acc, n) {
            (Num::Int(a), Num::Int(b)) => match int_op(a, b) {
                Some(result) => Num::Int(result),
                None => return err(format!("integer overflow in {}", op)),
            },
            (a, b) => Num::Float(float_op(a.as_f64(), b.as_f64())),
        };
    }
    Ok(acc.into_value())
}

/// Ints divide exactly when they can and fall back to float otherwise.
fn divide(acc: Num, divisor: Num) -> Result<Num, SprigError> {
    match (acc, divisor) {
        (_, Num::Int(0)) => err("division by zero"),
        (Num::Int(a), Num::Int(b)) => match (a.checked_rem(b), a.checked_div(b)) {
            (Some(0), Some(q)) => Ok(Num::Int(q)),
            (Some(_), _) => Ok(Num::Float(a as f64 / b as f64)),
            _ => err("integer overflow in /"),
        },
        (a, b) => Ok(Num::Float(a.as_f64() / b.as_f64())),
    }
}

fn cmp_chain(op: &str, args: &[Value], cmp: impl Fn(f64, f64) -> bool) -> Result<Value, SprigError> {
    let nums = args
        .iter()
        .enumerate()
        .map(|(idx, val)| as_number(op, idx, val))
        .collect::<Result<Vec<_>, _>>()?;
    let ordered = nums.windows(2).all(|pair| match (pair[0], pair[1]) {
        (Num::Int(a), Num::Int(b)) => cmp_i64(op, a, b),
        (a, b) => cmp(a.as_f64(), b.as_f64()),
    });
    Ok(Value::Bool(ordered))
}

fn cmp_i64(op: &str, a: i64, b: i64) -> bool {
    match op {
        "<" => a < b,
        ">" => a > b,
        "<=" => a <= b,
        _ => a >= b,
    }
}
