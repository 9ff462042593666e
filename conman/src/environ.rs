//! Process environment model.
//!
//! [`Environ`] is an unordered table of environment variables. It is filled
//! from `NAME=VALUE` strings, exposed to templates as the `env` context field,
//! and handed to the target process when it is exec'd.

use std::collections::HashMap;

use crate::node::{Mapping, Node};

/// A collection of environment variables.
///
/// The table does not keep any ordering; consumers of [`Environ::values`]
/// must not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ(HashMap<String, String>);

impl Environ {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites existing names with the values in `environ`.
    pub fn update<I, K, V>(&mut self, environ: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in environ {
            self.0.insert(name.into(), value.into());
        }
    }

    /// Loads `NAME=VALUE` formatted entries.
    ///
    /// Entries are split on the first `=`; an entry without one gets an empty
    /// value. Within one call the first occurrence of a name wins and later
    /// duplicates are ignored. Names already in the table are overwritten.
    pub fn load<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch: HashMap<String, String> = HashMap::new();
        for entry in entries {
            let (name, value) = parse_env_var(entry.as_ref());
            batch.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
        self.update(batch);
    }

    /// Loads the environment of the current process.
    ///
    /// Names or values that are not valid UTF-8 are converted lossily.
    pub fn load_process(&mut self) {
        self.load(std::env::vars_os().map(|(name, value)| {
            encode_env_var(&name.to_string_lossy(), &value.to_string_lossy())
        }));
    }

    /// Returns the value for `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of variables in the table.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no variables are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the table as `NAME=VALUE` strings in unspecified order.
    pub fn values(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(name, value)| encode_env_var(name, value))
            .collect()
    }

    /// Returns the table as a mapping of string nodes for template context.
    pub fn context(&self) -> Mapping {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), Node::String(value.clone())))
            .collect()
    }
}

/// Splits a single `NAME=VALUE` entry on the first `=`.
pub fn parse_env_var(entry: &str) -> (&str, &str) {
    entry.split_once('=').unwrap_or((entry, ""))
}

/// Formats a name and value as `NAME=VALUE`.
pub fn encode_env_var(name: &str, value: &str) -> String {
    format!("{name}={value}")
}
