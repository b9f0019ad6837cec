use std::sync::Arc;

use tracing::debug;

use crate::arity::{ArityBody, ArityTable};
use crate::ast::{Lambda, Value};
use crate::env::{new_ref, Env, EnvRef};
use crate::error::SprigError;
use crate::eval::Evaluator;

/// Operators evaluated by rule instead of by application. Checked by name
/// before the head of a list is evaluated, so they cannot be shadowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    Def,
    Defn,
    Fn,
    Let,
    If,
    Do,
    Defmacro,
    Quote,
    SyntaxQuote,
    Unquote,
    UnquoteSplicing,
    MacroexpandOne,
    Macroexpand,
    Eval,
}

impl SpecialForm {
    pub const ALL: [SpecialForm; 14] = [
        SpecialForm::Def,
        SpecialForm::Defn,
        SpecialForm::Fn,
        SpecialForm::Let,
        SpecialForm::If,
        SpecialForm::Do,
        SpecialForm::Defmacro,
        SpecialForm::Quote,
        SpecialForm::SyntaxQuote,
        SpecialForm::Unquote,
        SpecialForm::UnquoteSplicing,
        SpecialForm::MacroexpandOne,
        SpecialForm::Macroexpand,
        SpecialForm::Eval,
    ];

    pub fn from_symbol(name: &str) -> Option<Self> {
        let form = match name {
            "def" => SpecialForm::Def,
            "defn" => SpecialForm::Defn,
            "fn" => SpecialForm::Fn,
            "let" => SpecialForm::Let,
            "if" => SpecialForm::If,
            "do" => SpecialForm::Do,
            "defmacro" => SpecialForm::Defmacro,
            "quote" => SpecialForm::Quote,
            "syntax-quote" => SpecialForm::SyntaxQuote,
            "unquote" => SpecialForm::Unquote,
            "unquote-splicing" => SpecialForm::UnquoteSplicing,
            "macroexpand-1" => SpecialForm::MacroexpandOne,
            "macroexpand" => SpecialForm::Macroexpand,
            "eval" => SpecialForm::Eval,
            _ => return None,
        };
        Some(form)
    }

    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::Def => "def",
            SpecialForm::Defn => "defn",
            SpecialForm::Fn => "fn",
            SpecialForm::Let => "let",
            SpecialForm::If => "if",
            SpecialForm::Do => "do",
            SpecialForm::Defmacro => "defmacro",
            SpecialForm::Quote => "quote",
            SpecialForm::SyntaxQuote => "syntax-quote",
            SpecialForm::Unquote => "unquote",
            SpecialForm::UnquoteSplicing => "unquote-splicing",
            SpecialForm::MacroexpandOne => "macroexpand-1",
            SpecialForm::Macroexpand => "macroexpand",
            SpecialForm::Eval => "eval",
        }
    }
}

fn malformed<T>(form: SpecialForm, detail: impl AsRef<str>) -> Result<T, SprigError> {
    Err(SprigError::malformed(format!(
        "({} ...): {}",
        form.name(),
        detail.as_ref()
    )))
}

fn expect_args(form: SpecialForm, args: &[Value], count: usize) -> Result<(), SprigError> {
    if args.len() != count {
        return malformed(
            form,
            format!("expected {} argument(s), got {}", count, args.len()),
        );
    }
    Ok(())
}

/// `[a b & more]` or `(a b & more)`: `&` must be followed by exactly one
/// symbol and nothing else.
pub fn parse_params(
    form: SpecialForm,
    params: &Value,
) -> Result<(Vec<String>, Option<String>), SprigError> {
    let Some(items) = params.as_seq() else {
        return malformed(form, format!("expected parameter vector, got {}", params));
    };
    let mut names = Vec::with_capacity(items.len());
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let Some(name) = item.as_symbol() else {
            return malformed(form, format!("parameter must be a symbol, got {}", item));
        };
        if name == "&" {
            let rest = match (iter.next(), iter.next()) {
                (Some(Value::Symbol(rest)), None) if rest != "&" => rest.clone(),
                _ => return malformed(form, "'&' must be followed by exactly one symbol"),
            };
            return Ok((names, Some(rest)));
        }
        names.push(name.to_string());
    }
    Ok((names, None))
}

fn parse_clause(form: SpecialForm, clause: &Value) -> Result<ArityBody, SprigError> {
    let Some(items) = clause.as_seq() else {
        return malformed(form, format!("expected ([params] body*), got {}", clause));
    };
    let Some(params) = items.front() else {
        return malformed(form, "empty arity clause");
    };
    let (params, rest) = parse_params(form, params)?;
    Ok(ArityBody {
        params,
        rest,
        body: items.iter().skip(1).cloned().collect(),
    })
}

/// A list whose first element is itself a vector or list starts an arity
/// clause; any other list is a parameter list.
fn is_arity_clause(value: &Value) -> bool {
    match value {
        Value::List(items) => matches!(items.front(), Some(Value::Vector(_) | Value::List(_))),
        _ => false,
    }
}

/// Parses `[params*] body*` or `([params*] body*)+`.
pub fn parse_arities(form: SpecialForm, items: &[Value]) -> Result<ArityTable, SprigError> {
    let Some(first) = items.first() else {
        return malformed(form, "missing parameter vector");
    };
    if is_arity_clause(first) {
        let bodies = items
            .iter()
            .map(|clause| parse_clause(form, clause))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ArityTable::new(bodies));
    }
    let (params, rest) = parse_params(form, first)?;
    Ok(ArityTable::new(vec![ArityBody {
        params,
        rest,
        body: items[1..].to_vec(),
    }]))
}

/// Splits `name doc-string? arities...` as used by `defn` and `defmacro`.
fn parse_named<'a>(form: SpecialForm, args: &'a [Value]) -> Result<(String, &'a [Value]), SprigError> {
    let Some((name, rest)) = args.split_first() else {
        return malformed(form, "missing name");
    };
    let Some(name) = name.as_symbol() else {
        return malformed(form, format!("name must be a symbol, got {}", name));
    };
    let rest = match rest.split_first() {
        Some((Value::String(_), after_doc)) if !after_doc.is_empty() => after_doc,
        _ => rest,
    };
    Ok((name.to_string(), rest))
}

impl Evaluator {
    pub(crate) fn eval_special(
        &self,
        form: SpecialForm,
        args: &[Value],
        env: &EnvRef,
    ) -> Result<Value, SprigError> {
        match form {
            SpecialForm::Def => self.eval_def(args, env),
            SpecialForm::Defn => self.eval_defn(args, env),
            SpecialForm::Fn => self.eval_fn(args, env),
            SpecialForm::Let => self.eval_let(args, env),
            SpecialForm::If => self.eval_if(args, env),
            SpecialForm::Do => self.eval_forms(args, env),
            SpecialForm::Defmacro => self.eval_defmacro(args, env),
            SpecialForm::Quote => {
                expect_args(form, args, 1)?;
                Ok(args[0].clone())
            }
            SpecialForm::SyntaxQuote => {
                expect_args(form, args, 1)?;
                self.syntax_quote(&args[0], env)
            }
            SpecialForm::Unquote | SpecialForm::UnquoteSplicing => {
                malformed(form, "used outside of syntax-quote")
            }
            SpecialForm::MacroexpandOne => {
                expect_args(form, args, 1)?;
                let target = self.eval(&args[0], env)?;
                self.macroexpand_1(&target, env)
            }
            SpecialForm::Macroexpand => {
                expect_args(form, args, 1)?;
                let target = self.eval(&args[0], env)?;
                self.macroexpand(&target, env)
            }
            SpecialForm::Eval => {
                expect_args(form, args, 1)?;
                let target = self.eval(&args[0], env)?;
                self.eval(&target, &self.global_env())
            }
        }
    }

    fn eval_def(&self, args: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        expect_args(SpecialForm::Def, args, 2)?;
        let Some(name) = args[0].as_symbol() else {
            return malformed(
                SpecialForm::Def,
                format!("name must be a symbol, got {}", args[0]),
            );
        };
        let value = self.eval(&args[1], env)?;
        self.vars().define_var(name, value.clone());
        debug!(var = name, kind = value.type_name(), "def");
        Ok(value)
    }

    fn eval_defn(&self, args: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        let (name, rest) = parse_named(SpecialForm::Defn, args)?;
        let arities = parse_arities(SpecialForm::Defn, rest)?;
        let value = Value::Func(Arc::new(Lambda {
            name: Some(name.clone()),
            arities,
            env: env.clone(),
        }));
        self.vars().define_var(&name, value.clone());
        debug!(var = %name, "defn");
        Ok(value)
    }

    fn eval_fn(&self, args: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        let (name, rest) = match args.split_first() {
            Some((Value::Symbol(name), rest)) => (Some(name.clone()), rest),
            _ => (None, args),
        };
        let arities = parse_arities(SpecialForm::Fn, rest)?;
        Ok(Value::Func(Arc::new(Lambda {
            name,
            arities,
            env: env.clone(),
        })))
    }

    fn eval_defmacro(&self, args: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        let (name, rest) = parse_named(SpecialForm::Defmacro, args)?;
        let arities = parse_arities(SpecialForm::Defmacro, rest)?;
        let value = Value::Macro(Arc::new(Lambda {
            name: Some(name.clone()),
            arities,
            env: env.clone(),
        }));
        self.vars().define_var(&name, value.clone());
        debug!(var = %name, "defmacro");
        Ok(value)
    }

    fn eval_let(&self, args: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        let Some((bindings, body)) = args.split_first() else {
            return malformed(SpecialForm::Let, "missing binding vector");
        };
        let Some(bindings) = bindings.as_seq() else {
            return malformed(
                SpecialForm::Let,
                format!("expected binding vector, got {}", bindings),
            );
        };
        if bindings.len() % 2 != 0 {
            return malformed(SpecialForm::Let, "odd number of forms in binding vector");
        }
        let mut frame = Env::new_child(env.clone());
        let mut current = new_ref(frame.clone());
        let mut iter = bindings.iter();
        while let (Some(name), Some(expr)) = (iter.next(), iter.next()) {
            let Some(name) = name.as_symbol() else {
                return malformed(
                    SpecialForm::Let,
                    format!("binding name must be a symbol, got {}", name),
                );
            };
            let value = self.eval(expr, &current)?;
            frame.set(name, value);
            // each binding sees the ones before it, never the ones after
            current = new_ref(frame.clone());
        }
        self.eval_forms(body, &current)
    }

    fn eval_if(&self, args: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        if !(2..=3).contains(&args.len()) {
            return malformed(
                SpecialForm::If,
                format!("expected test, then and optional else, got {} form(s)", args.len()),
            );
        }
        if self.eval(&args[0], env)?.truthy() {
            self.eval(&args[1], env)
        } else {
            match args.get(2) {
                Some(otherwise) => self.eval(otherwise, env),
                None => Ok(Value::Nil),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_source;

    fn read(src: &str) -> Value {
        read_source(src).unwrap().remove(0).to_value()
    }

    fn items(src: &str) -> Vec<Value> {
        read(src).as_seq().unwrap().iter().cloned().collect()
    }

    #[test]
    fn names_round_trip() {
        for form in SpecialForm::ALL {
            assert_eq!(SpecialForm::from_symbol(form.name()), Some(form));
        }
        assert_eq!(SpecialForm::from_symbol("defn-"), None);
    }

    #[test]
    fn params_with_rest() {
        let (params, rest) = parse_params(SpecialForm::Fn, &read("[a b & more]")).unwrap();
        assert_eq!(params, vec!["a", "b"]);
        assert_eq!(rest.as_deref(), Some("more"));
        let (params, rest) = parse_params(SpecialForm::Fn, &read("(x)")).unwrap();
        assert_eq!(params, vec!["x"]);
        assert!(rest.is_none());
    }

    #[test]
    fn bad_rest_params_are_malformed() {
        for src in ["[&]", "[a & b c]", "[a & & b]", "[a 1]"] {
            let err = parse_params(SpecialForm::Fn, &read(src)).unwrap_err();
            assert!(
                matches!(err, SprigError::MalformedSpecialForm(_)),
                "{} should be malformed",
                src
            );
        }
    }

    #[test]
    fn single_and_multi_arity_shapes() {
        let single = parse_arities(SpecialForm::Fn, &items("([a] a)")).unwrap();
        assert_eq!(single.len(), 1);
        let list_params = parse_arities(SpecialForm::Fn, &items("((a b) a)")).unwrap();
        assert_eq!(list_params.bodies()[0].params, vec!["a", "b"]);
        let empty_list_params = parse_arities(SpecialForm::Fn, &items("(() 1)")).unwrap();
        assert!(empty_list_params.bodies()[0].params.is_empty());
        let multi = parse_arities(SpecialForm::Fn, &items("(([] 0) ([a] 1) ([a & r] 2))")).unwrap();
        assert_eq!(multi.len(), 3);
        assert_eq!(multi.describe(), "0 or 1 or 1+");
    }

    #[test]
    fn doc_string_is_skipped_only_before_arities() {
        let args = items("(f \"docs\" [x] x)");
        let (name, rest) = parse_named(SpecialForm::Defn, &args).unwrap();
        assert_eq!(name, "f");
        assert_eq!(rest.len(), 2);
        let args = items("(f \"only\")");
        let (_, rest) = parse_named(SpecialForm::Defn, &args).unwrap();
        assert_eq!(rest.len(), 1);
    }
}
