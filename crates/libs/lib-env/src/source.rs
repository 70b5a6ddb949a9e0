//! # Environment Sources
//!
//! Lookup capability behind every accessor in [`crate::envs`].
//!
//! Accessors never cache: each call asks the source again, so changes made by
//! the host process (or by a test) are always observed.
//!
//! - [`SystemEnv`] reads the real process environment.
//! - [`MapEnv`] is an isolated in-memory table, used by tests and by callers
//!   that assemble configuration themselves.

use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

/// Read-only lookup of string-valued variables by name.
pub trait EnvSource: Send + Sync {
    /// Value of `name`, or `None` when it is not set (or not valid unicode).
    fn var(&self, name: &str) -> Option<String>;
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

impl<S: EnvSource + ?Sized> EnvSource for std::sync::Arc<S> {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

/// In-memory variable table.
///
/// Mutation goes through `&self`, so a single `MapEnv` can be shared by an
/// [`Env`](crate::envs::Env) and the code setting it up.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self {
            vars: RwLock::new(vars),
        }
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut vars = self.vars.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        vars.insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        let mut vars = self.vars.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        vars.remove(name)
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        let vars = self.vars.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        vars.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_set_and_remove() {
        let source = MapEnv::new();
        assert_eq!(source.var("APP_MODE"), None);

        source.set("APP_MODE", "prod");
        assert_eq!(source.var("APP_MODE").as_deref(), Some("prod"));

        assert_eq!(source.remove("APP_MODE").as_deref(), Some("prod"));
        assert_eq!(source.var("APP_MODE"), None);
    }

    #[test]
    fn test_map_env_from_pairs() {
        let source = MapEnv::from_pairs([("A", "1"), ("B", "")]);
        assert_eq!(source.var("A").as_deref(), Some("1"));
        assert_eq!(source.var("B").as_deref(), Some(""));
        assert_eq!(source.var("C"), None);
    }

    #[test]
    fn test_source_by_reference() {
        fn lookup<S: EnvSource>(source: S) -> Option<String> {
            source.var("KEY")
        }

        let source = MapEnv::from_pairs([("KEY", "value")]);
        assert_eq!(lookup(&source).as_deref(), Some("value"));
    }

    #[test]
    fn test_system_env_missing_var() {
        assert_eq!(SystemEnv.var("LIB_ENV_SURELY_UNSET_VARIABLE_7F3A"), None);
    }
}
