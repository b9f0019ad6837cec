use std::env;

fn env_flag(name: &str) -> bool {
    let Ok(value) = env::var(name) else {
        return false;
    };
    parse_flag(&value)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_depth(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

pub fn max_depth_from_env() -> Option<usize> {
    env::var("SPRIG_MAX_DEPTH")
        .ok()
        .and_then(|value| parse_depth(&value))
}

pub fn no_builtins_from_env() -> bool {
    env_flag("SPRIG_NO_BUILTINS")
}

#[derive(Clone, Debug)]
pub struct EvalOptions {
    /// Nested function and macro applications allowed before `DepthExceeded`.
    pub max_depth: Option<usize>,
    pub no_builtins: bool,
    pub source_name: Option<String>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: max_depth_from_env(),
            no_builtins: no_builtins_from_env(),
            source_name: None,
        }
    }
}

impl EvalOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}
