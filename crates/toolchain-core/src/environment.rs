//! Child process environment snapshots and search-path merging
//!
//! Merging works on values: [`EnvironmentBuilder::merge_tool_directory`]
//! consumes a map and hands back the updated one, so two invocations never
//! share an environment by accident. Callers that want to keep the original
//! clone it first.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::platform::{CANONICAL_PATH_KEY, HostOs};

/// Snapshot of a process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentMap {
    vars: BTreeMap<String, String>,
}

impl EnvironmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the environment of the current process.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for EnvironmentMap {
    fn from(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }
}

/// Adds tool directories to the search-path variable of an environment
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    separator: char,
    keys: &'static [&'static str],
}

impl EnvironmentBuilder {
    /// Builder using the conventions of `os`
    pub fn for_host(os: HostOs) -> Self {
        Self {
            separator: os.path_list_separator(),
            keys: os.search_path_keys(),
        }
    }

    /// Override the path-list separator
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Put the directory containing `tool_executable` in front of the search path.
    ///
    /// Returns `env` unchanged when the executable does not exist or its
    /// directory is already part of the search path.
    pub fn merge_tool_directory(&self, env: EnvironmentMap, tool_executable: &Path) -> EnvironmentMap {
        if !tool_executable.exists() {
            debug!(tool = %tool_executable.display(), "Tool executable missing, environment unchanged");
            return env;
        }

        let tool_dir = match tool_executable.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_string_lossy().into_owned(),
            _ => return env,
        };

        self.prepend_directory(env, &tool_dir)
    }

    /// Prepend `dir` to the search-path key of `env`.
    ///
    /// The first key with a non-empty value is written, else the first key
    /// present at all. When none exists the canonical `PATH` is created
    /// holding just `dir`.
    pub fn prepend_directory(&self, mut env: EnvironmentMap, dir: &str) -> EnvironmentMap {
        let existing = self
            .keys
            .iter()
            .copied()
            .find(|key| env.get(key).is_some_and(|value| !value.is_empty()))
            .or_else(|| self.keys.iter().copied().find(|key| env.contains_key(key)));

        match existing {
            Some(key) => {
                let current = env.get(key).unwrap_or_default();
                if current.contains(dir) {
                    debug!(key, dir, "Directory already on search path");
                    return env;
                }
                let value = if current.is_empty() {
                    dir.to_string()
                } else {
                    format!("{}{}{}", dir, self.separator, current)
                };
                debug!(key, dir, "Prepending directory to search path");
                env.insert(key, value);
            }
            None => {
                debug!(key = CANONICAL_PATH_KEY, dir, "Creating search path variable");
                env.insert(CANONICAL_PATH_KEY, dir);
            }
        }

        env
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::for_host(HostOs::current())
    }
}
