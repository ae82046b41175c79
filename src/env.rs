//! Runtime environment access.
//!
//! Handlers never touch `std::env` directly; they read through an
//! [`Environment`] handed to them in the application state. The OS-backed
//! implementation reads the live process environment on every call.

use std::collections::BTreeMap;

/// Read-only view of a process environment.
pub trait Environment: Send + Sync {
    /// Look up a single variable. Returns `None` only when unset; invalid
    /// UTF-8 is replaced, as in [`Environment::vars`].
    fn get(&self, name: &str) -> Option<String>;

    /// All variables, in whatever order the source iterates them.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The live process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnvironment;

impl Environment for OsEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }
}

/// A fixed set of variables, used for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: BTreeMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
