use std::cell::Cell;
use std::sync::Arc;

use tracing::trace;

use crate::ast::{Lambda, Value, Vector};
use crate::env::{new_ref, resolve, Env, EnvRef};
use crate::error::SprigError;
use crate::options::EvalOptions;
use crate::special_forms::SpecialForm;
use crate::vars::VarRegistry;

/// Tracks nested function and macro applications; decremented on drop.
pub(crate) struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

pub struct Evaluator {
    vars: Arc<VarRegistry>,
    global: EnvRef,
    options: EvalOptions,
    depth: Cell<usize>,
}

impl Evaluator {
    pub fn new(vars: Arc<VarRegistry>) -> Self {
        Self::with_options(vars, EvalOptions::default())
    }

    pub fn with_options(vars: Arc<VarRegistry>, options: EvalOptions) -> Self {
        if !options.no_builtins {
            vars.ensure_core();
        }
        Self {
            vars,
            global: new_ref(Env::default()),
            options,
            depth: Cell::new(0),
        }
    }

    pub fn vars(&self) -> &Arc<VarRegistry> {
        &self.vars
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// The top-level environment: no lexical bindings, so every symbol
    /// resolves through the Var registry.
    pub fn global_env(&self) -> EnvRef {
        self.global.clone()
    }

    pub fn eval(&self, form: &Value, env: &EnvRef) -> Result<Value, SprigError> {
        match form {
            Value::Symbol(name) => resolve(name, env, &self.vars),
            Value::List(items) => self.eval_list(items, env),
            Value::Vector(items) => {
                let mut out = Vector::new();
                for item in items {
                    out.push_back(self.eval(item, env)?);
                }
                Ok(Value::Vector(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Evaluates forms in order and returns the last value, or nil when
    /// there are none.
    pub fn eval_forms(&self, forms: &[Value], env: &EnvRef) -> Result<Value, SprigError> {
        let mut result = Value::Nil;
        for form in forms {
            result = self.eval(form, env)?;
        }
        Ok(result)
    }

    fn eval_list(&self, items: &Vector<Value>, env: &EnvRef) -> Result<Value, SprigError> {
        let Some(head) = items.front() else {
            return Ok(Value::List(Vector::new()));
        };
        let rest: Vec<Value> = items.iter().skip(1).cloned().collect();
        if let Some(special) = head.as_symbol().and_then(SpecialForm::from_symbol) {
            return self.eval_special(special, &rest, env);
        }
        let callee = self.eval(head, env)?;
        match &callee {
            Value::Macro(lambda) => {
                let expansion = self.expand_macro(lambda, rest)?;
                self.eval(&expansion, env)
            }
            Value::Func(_) | Value::BuiltIn(_) => {
                let mut args = Vec::with_capacity(rest.len());
                for arg in &rest {
                    args.push(self.eval(arg, env)?);
                }
                self.apply(&callee, args)
            }
            other => Err(SprigError::not_invocable(format!(
                "{} ({}) in operator position of {}",
                other,
                other.type_name(),
                Value::List(items.clone())
            ))),
        }
    }

    /// Applies a function or built-in to already evaluated arguments.
    pub fn apply(&self, callee: &Value, args: Vec<Value>) -> Result<Value, SprigError> {
        match callee {
            Value::Func(lambda) => self.call_lambda(lambda, callee, args),
            Value::BuiltIn(native) => {
                let label = native.debug_name().unwrap_or("<native-fn>");
                if !native.arity().accepts(args.len()) {
                    return Err(SprigError::arity(format!(
                        "{} called with {} argument(s), accepts {}",
                        label,
                        args.len(),
                        native.arity()
                    )));
                }
                native.call(&args).map_err(|err| err.push_frame(label, None))
            }
            other => Err(SprigError::not_invocable(format!(
                "{} ({}) cannot be applied",
                other,
                other.type_name()
            ))),
        }
    }

    fn call_lambda(
        &self,
        lambda: &Arc<Lambda>,
        self_value: &Value,
        args: Vec<Value>,
    ) -> Result<Value, SprigError> {
        let label = lambda.label();
        self.invoke(lambda, args, Some(self_value))
            .map_err(|err| err.push_frame(label, None))
    }

    /// Shared by function calls and macro expansion: select the arity body,
    /// bind into a fresh frame on the captured environment, run the body.
    pub(crate) fn invoke(
        &self,
        lambda: &Lambda,
        args: Vec<Value>,
        self_value: Option<&Value>,
    ) -> Result<Value, SprigError> {
        let _guard = self.enter()?;
        let body = lambda.arities.select_or_err(lambda.label(), args.len())?;
        trace!(
            callee = lambda.label(),
            argc = args.len(),
            arity = %body,
            "apply"
        );
        let mut frame = Env::new_child(lambda.env.clone());
        if let (Some(name), Some(value)) = (&lambda.name, self_value) {
            frame.set(name, value.clone());
        }
        body.bind_args(&mut frame, args);
        self.eval_forms(&body.body, &new_ref(frame))
    }

    fn enter(&self) -> Result<DepthGuard<'_>, SprigError> {
        let next = self.depth.get() + 1;
        if let Some(limit) = self.options.max_depth {
            if next > limit {
                return Err(SprigError::depth_exceeded(limit));
            }
        }
        self.depth.set(next);
        Ok(DepthGuard { depth: &self.depth })
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}
