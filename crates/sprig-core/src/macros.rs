use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::ast::{Lambda, Value, Vector};
use crate::env::EnvRef;
use crate::error::SprigError;
use crate::eval::Evaluator;
use crate::special_forms::SpecialForm;

static GENSYM_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A symbol name no reader-produced symbol can collide with in practice.
pub fn next_gensym(prefix: &str) -> String {
    let id = GENSYM_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}__{}", prefix, id)
}

fn is_auto_gensym(name: &str) -> bool {
    name.len() > 1 && name.ends_with('#')
}

fn head_is(items: &Vector<Value>, head: &str) -> bool {
    matches!(items.front(), Some(Value::Symbol(name)) if name == head)
}

/// The single operand of `(head x)`.
fn operand<'a>(items: &'a Vector<Value>, head: &str) -> Result<&'a Value, SprigError> {
    match (items.len(), items.get(1)) {
        (2, Some(target)) => Ok(target),
        _ => Err(SprigError::malformed(format!(
            "({} ...): expected 1 argument, got {}",
            head,
            items.len().saturating_sub(1)
        ))),
    }
}

impl Evaluator {
    /// Binds the unevaluated argument forms in a frame on the macro's
    /// captured environment and runs the body, yielding the expansion.
    /// The caller evaluates the expansion in its own environment.
    pub fn expand_macro(&self, lambda: &Arc<Lambda>, args: Vec<Value>) -> Result<Value, SprigError> {
        let label = lambda.label();
        let self_value = Value::Macro(lambda.clone());
        let expansion = self
            .invoke(lambda, args, Some(&self_value))
            .map_err(|err| err.push_frame(label, None))?;
        trace!(macro_name = label, expansion = %expansion, "expand");
        Ok(expansion)
    }

    /// The macro a form's head names in `env`, if any.
    fn macro_for(&self, form: &Value, env: &EnvRef) -> Option<(Arc<Lambda>, Vec<Value>)> {
        let Value::List(items) = form else {
            return None;
        };
        let name = items.front()?.as_symbol()?;
        if SpecialForm::from_symbol(name).is_some() {
            return None;
        }
        let resolved = env.get(name).or_else(|| self.vars().lookup_var(name))?;
        match resolved {
            Value::Macro(lambda) => Some((lambda, items.iter().skip(1).cloned().collect())),
            _ => None,
        }
    }

    pub fn macroexpand_1(&self, form: &Value, env: &EnvRef) -> Result<Value, SprigError> {
        match self.macro_for(form, env) {
            Some((lambda, args)) => self.expand_macro(&lambda, args),
            None => Ok(form.clone()),
        }
    }

    pub fn macroexpand(&self, form: &Value, env: &EnvRef) -> Result<Value, SprigError> {
        let mut current = form.clone();
        while let Some((lambda, args)) = self.macro_for(&current, env) {
            current = self.expand_macro(&lambda, args)?;
        }
        Ok(current)
    }

    /// Builds the data described by a syntax-quote template. `x#` symbols
    /// map to one fresh symbol per call.
    pub fn syntax_quote(&self, template: &Value, env: &EnvRef) -> Result<Value, SprigError> {
        let mut gensyms = HashMap::new();
        self.quasi(template, env, &mut gensyms)
    }

    fn quasi(
        &self,
        template: &Value,
        env: &EnvRef,
        gensyms: &mut HashMap<String, String>,
    ) -> Result<Value, SprigError> {
        match template {
            Value::Symbol(name) if is_auto_gensym(name) => {
                let generated = gensyms
                    .entry(name.clone())
                    .or_insert_with(|| next_gensym(&name[..name.len() - 1]));
                Ok(Value::Symbol(generated.clone()))
            }
            Value::List(items) => {
                if head_is(items, "unquote") {
                    return self.eval(operand(items, "unquote")?, env);
                }
                if head_is(items, "unquote-splicing") {
                    return Err(SprigError::malformed(
                        "(unquote-splicing ...): only allowed inside a list or vector",
                    ));
                }
                if head_is(items, "syntax-quote") {
                    return Ok(template.clone());
                }
                Ok(Value::List(self.quasi_items(items, env, gensyms)?))
            }
            Value::Vector(items) => Ok(Value::Vector(self.quasi_items(items, env, gensyms)?)),
            other => Ok(other.clone()),
        }
    }

    fn quasi_items(
        &self,
        items: &Vector<Value>,
        env: &EnvRef,
        gensyms: &mut HashMap<String, String>,
    ) -> Result<Vector<Value>, SprigError> {
        let mut out = Vector::new();
        for item in items {
            let target = match item {
                Value::List(inner) if head_is(inner, "unquote-splicing") => {
                    operand(inner, "unquote-splicing")?
                }
                _ => {
                    out.push_back(self.quasi(item, env, gensyms)?);
                    continue;
                }
            };
            match self.eval(target, env)? {
                Value::List(spliced) | Value::Vector(spliced) => out.append(spliced),
                Value::Nil => {}
                other => {
                    return Err(SprigError::malformed(format!(
                        "(unquote-splicing ...): expected a list or vector, got {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gensyms_are_unique() {
        let a = next_gensym("G");
        let b = next_gensym("G");
        assert_ne!(a, b);
        assert!(a.starts_with("G__"));
    }

    #[test]
    fn auto_gensym_detection() {
        assert!(is_auto_gensym("tmp#"));
        assert!(!is_auto_gensym("#"));
        assert!(!is_auto_gensym("tmp"));
    }
}
