use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ast::Value;
use crate::builtins;
use once_cell::sync::{Lazy, OnceCell};

static GLOBAL_VARS: Lazy<Arc<VarRegistry>> = Lazy::new(|| Arc::new(VarRegistry::new()));

/// A named mutable cell. Closures never hold the value, only the name, so a
/// later `def` is seen by every reader.
#[derive(Debug)]
pub struct Var {
    name: String,
    value: RwLock<Value>,
}

impl Var {
    fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            value: RwLock::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Value {
        self.value.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, value: Value) {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

#[derive(Debug, Default)]
pub struct VarRegistry {
    vars: RwLock<HashMap<String, Arc<Var>>>,
    core_installed: OnceCell<()>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<VarRegistry> {
        GLOBAL_VARS.clone()
    }

    /// Defines the core built-ins the first time it is called on this
    /// registry. Later calls leave every Var alone, including user
    /// redefinitions of built-in names.
    pub fn ensure_core(&self) {
        self.core_installed.get_or_init(|| builtins::install_core(self));
    }

    /// Creates the Var on first definition and overwrites it in place after
    /// that. The map write lock is held across both cases so concurrent
    /// definitions are totally ordered.
    pub fn define_var(&self, name: &str, value: Value) -> Arc<Var> {
        let mut vars = self.vars.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = vars.get(name) {
            existing.set(value);
            return existing.clone();
        }
        let var = Arc::new(Var::new(name, value));
        vars.insert(name.to_string(), var.clone());
        var
    }

    pub fn lookup_var(&self, name: &str) -> Option<Value> {
        self.var(name).map(|var| var.get())
    }

    pub fn var(&self, name: &str) -> Option<Arc<Var>> {
        self.vars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Defined names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .vars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn redefinition_overwrites_the_same_cell() {
        let vars = VarRegistry::new();
        let first = vars.define_var("x", Value::Int(1));
        let second = vars.define_var("x", Value::Int(2));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.get(), Value::Int(2));
        assert_eq!(vars.lookup_var("x"), Some(Value::Int(2)));
    }

    #[test]
    fn core_builtins_are_installed_once() {
        let vars = VarRegistry::new();
        vars.ensure_core();
        assert!(matches!(vars.lookup_var("inc"), Some(Value::BuiltIn(_))));
        vars.define_var("inc", Value::Int(7));
        vars.ensure_core();
        assert_eq!(vars.lookup_var("inc"), Some(Value::Int(7)));
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let vars = VarRegistry::new();
        assert_eq!(vars.lookup_var("nope"), None);
        assert!(vars.var("nope").is_none());
        assert!(!vars.contains("nope"));
    }

    #[test]
    fn names_are_sorted() {
        let vars = VarRegistry::new();
        vars.define_var("b", Value::Nil);
        vars.define_var("a", Value::Nil);
        vars.define_var("c", Value::Nil);
        assert_eq!(vars.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn concurrent_definitions_keep_one_cell() {
        let vars = Arc::new(VarRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let vars = vars.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        vars.define_var("shared", Value::Int(i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(vars.names(), vec!["shared"]);
        assert!(matches!(vars.lookup_var("shared"), Some(Value::Int(n)) if (0..8).contains(&n)));
    }

    #[test]
    fn global_registry_is_shared() {
        let a = VarRegistry::global();
        let b = VarRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
