use std::sync::Arc;

use im::HashMap;

use crate::ast::Value;
use crate::error::SprigError;
use crate::vars::VarRegistry;

/// Frames are shared once wrapped in an `EnvRef` and never mutated after that.
pub type EnvRef = Arc<Env>;

#[derive(Clone, Debug, Default)]
pub struct Env {
    data: HashMap<String, Value>,
    outer: Option<EnvRef>,
}

impl Env {
    pub fn new_child(outer: EnvRef) -> Self {
        Self {
            data: HashMap::new(),
            outer: Some(outer),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Returns a copy of this frame with `key` bound, sharing the same parent.
    pub fn bind(&self, key: &str, value: Value) -> Env {
        Env {
            data: self.data.update(key.to_string(), value),
            outer: self.outer.clone(),
        }
    }

    pub fn contains_local(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn outer_ref(&self) -> Option<EnvRef> {
        self.outer.clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(v) = frame.data.get(key) {
                return Some(v.clone());
            }
            match frame.outer.as_deref() {
                Some(outer) => frame = outer,
                None => return None,
            }
        }
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self.outer.as_deref();
        while let Some(env) = frame {
            depth += 1;
            frame = env.outer.as_deref();
        }
        depth
    }

    /// Every visible binding, outermost frame first; shadowed entries appear
    /// before the bindings that shadow them.
    pub fn flatten(&self) -> Vec<(String, Value)> {
        let mut entries = self
            .outer
            .as_ref()
            .map(|o| o.flatten())
            .unwrap_or_default();
        entries.extend(self.data.iter().map(|(k, v)| (k.clone(), v.clone())));
        entries
    }
}

pub fn new_ref(env: Env) -> EnvRef {
    Arc::new(env)
}

/// Lexical frames innermost to outermost, then the Var registry.
pub fn resolve(symbol: &str, env: &Env, vars: &VarRegistry) -> Result<Value, SprigError> {
    if let Some(value) = env.get(symbol) {
        return Ok(value);
    }
    vars.lookup_var(symbol)
        .ok_or_else(|| SprigError::unbound_symbol(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frame_shadows_outer() {
        let mut root = Env::default();
        root.set("x", Value::Int(1));
        root.set("y", Value::Int(2));
        let mut child = Env::new_child(new_ref(root));
        child.set("x", Value::Int(10));
        assert_eq!(child.get("x"), Some(Value::Int(10)));
        assert_eq!(child.get("y"), Some(Value::Int(2)));
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn bind_leaves_original_frame_untouched() {
        let mut frame = Env::default();
        frame.set("a", Value::Int(1));
        let extended = frame.bind("b", Value::Int(2));
        assert!(!frame.contains_local("b"));
        assert!(extended.contains_local("a"));
        assert!(extended.contains_local("b"));
    }

    #[test]
    fn resolve_falls_through_to_vars() {
        let vars = VarRegistry::new();
        vars.define_var("g", Value::Int(7));
        let mut frame = Env::default();
        frame.set("l", Value::Int(1));
        assert_eq!(resolve("l", &frame, &vars).unwrap(), Value::Int(1));
        assert_eq!(resolve("g", &frame, &vars).unwrap(), Value::Int(7));
        frame.set("g", Value::Int(0));
        assert_eq!(resolve("g", &frame, &vars).unwrap(), Value::Int(0));
        assert!(matches!(
            resolve("missing", &frame, &vars),
            Err(SprigError::UnboundSymbol(_))
        ));
    }

    #[test]
    fn flatten_lists_outer_bindings_first() {
        let mut root = Env::default();
        root.set("x", Value::Int(1));
        let mut child = Env::new_child(new_ref(root));
        child.set("x", Value::Int(2));
        let entries = child.flatten();
        assert_eq!(entries.first().map(|(_, v)| v.clone()), Some(Value::Int(1)));
        assert_eq!(entries.last().map(|(_, v)| v.clone()), Some(Value::Int(2)));
    }
}
