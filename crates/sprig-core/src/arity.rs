use std::fmt;

use crate::ast::{Value, Vector};
use crate::env::Env;
use crate::error::SprigError;

#[derive(Clone, Debug, PartialEq)]
pub struct ArityBody {
    pub params: Vec<String>,
    pub rest: Option<String>,
    pub body: Vec<Value>,
}

impl ArityBody {
    pub fn is_variadic(&self) -> bool {
        self.rest.is_some()
    }

    pub fn accepts(&self, argc: usize) -> bool {
        if self.is_variadic() {
            argc >= self.params.len()
        } else {
            argc == self.params.len()
        }
    }

    /// Binds positional arguments, then the rest parameter as a list of
    /// whatever remains. Caller must have checked `accepts`.
    pub fn bind_args(&self, frame: &mut Env, args: Vec<Value>) {
        let mut args = args.into_iter();
        for param in &self.params {
            if let Some(arg) = args.next() {
                frame.set(param, arg);
            }
        }
        if let Some(rest) = &self.rest {
            let remaining: Vector<Value> = args.collect();
            frame.set(rest, Value::List(remaining));
        }
    }
}

impl fmt::Display for ArityBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_variadic() {
            write!(f, "{}+", self.params.len())
        } else {
            write!(f, "{}", self.params.len())
        }
    }
}

/// Arity bodies in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArityTable {
    bodies: Vec<ArityBody>,
}

impl ArityTable {
    pub fn new(bodies: Vec<ArityBody>) -> Self {
        Self { bodies }
    }

    pub fn bodies(&self) -> &[ArityBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// An exact fixed-arity body wins; otherwise the first variadic body whose
    /// fixed prefix fits. Duplicated fixed arities resolve to the earliest.
    pub fn select(&self, argc: usize) -> Option<&ArityBody> {
        self.bodies
            .iter()
            .find(|body| !body.is_variadic() && body.params.len() == argc)
            .or_else(|| {
                self.bodies
                    .iter()
                    .find(|body| body.is_variadic() && argc >= body.params.len())
            })
    }

    pub fn select_or_err(&self, label: &str, argc: usize) -> Result<&ArityBody, SprigError> {
        self.select(argc).ok_or_else(|| {
            SprigError::arity(format!(
                "{} called with {} argument(s), accepts {}",
                label,
                argc,
                self.describe()
            ))
        })
    }

    pub fn describe(&self) -> String {
        let parts: Vec<String> = self.bodies.iter().map(|body| body.to_string()).collect();
        parts.join(" or ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(params: &[&str], rest: Option<&str>, tag: i64) -> ArityBody {
        ArityBody {
            params: params.iter().map(|p| p.to_string()).collect(),
            rest: rest.map(|r| r.to_string()),
            body: vec![Value::Int(tag)],
        }
    }

    #[test]
    fn exact_fixed_beats_earlier_variadic() {
        let table = ArityTable::new(vec![body(&["a"], Some("more"), 0), body(&["a", "b"], None, 1)]);
        assert_eq!(table.select(2).map(|b| b.body[0].clone()), Some(Value::Int(1)));
        assert_eq!(table.select(3).map(|b| b.body[0].clone()), Some(Value::Int(0)));
        assert_eq!(table.select(1).map(|b| b.body[0].clone()), Some(Value::Int(0)));
        assert!(table.select(0).is_none());
    }

    #[test]
    fn first_matching_variadic_wins() {
        let table = ArityTable::new(vec![body(&["a", "b"], Some("r"), 0), body(&[], Some("r"), 1)]);
        assert_eq!(table.select(5).map(|b| b.body[0].clone()), Some(Value::Int(0)));
        assert_eq!(table.select(1).map(|b| b.body[0].clone()), Some(Value::Int(1)));
    }

    #[test]
    fn duplicate_fixed_arity_picks_first() {
        let table = ArityTable::new(vec![body(&["x"], None, 0), body(&["y"], None, 1)]);
        assert_eq!(table.select(1).map(|b| b.body[0].clone()), Some(Value::Int(0)));
    }

    #[test]
    fn mismatch_reports_accepted_arities() {
        let table = ArityTable::new(vec![body(&[], None, 0), body(&["a", "b"], Some("r"), 1)]);
        let err = table.select_or_err("f", 1).unwrap_err();
        assert!(matches!(err, SprigError::ArityMismatch(_)));
        assert!(err.message().contains("0 or 2+"), "{}", err.message());
    }

    #[test]
    fn rest_is_empty_list_when_nothing_remains() {
        let b = body(&["a"], Some("more"), 0);
        let mut frame = Env::default();
        b.bind_args(&mut frame, vec![Value::Int(1)]);
        assert_eq!(frame.get("a"), Some(Value::Int(1)));
        assert_eq!(frame.get("more"), Some(Value::list(Vec::new())));

        let mut frame = Env::default();
        b.bind_args(&mut frame, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            frame.get("more"),
            Some(Value::list(vec![Value::Int(2), Value::Int(3)]))
        );
    }
}
