//! Tool discovery: find the interpreter, version-control tool and install root
//!
//! Interpreter discovery differs per platform and sits behind the
//! [`InterpreterLocator`] trait. The strategy is picked once when the
//! [`PathResolver`] is built. Resolution never fails: a missing tool is
//! `None` and the caller decides whether that matters.

mod registry;
mod search;

pub use registry::{RegistryLocator, parse_registry_listing};
pub use search::{SearchPathLocator, default_install_dirs, find_executable};

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::INSTALL_ROOT_VAR;
use crate::environment::EnvironmentMap;
use crate::platform::HostOs;

/// Strategy for discovering interpreter installations
pub trait InterpreterLocator: Debug + Send + Sync {
    /// Discover interpreters visible from `env`
    fn locate(&self, env: &EnvironmentMap) -> InterpreterCandidates;
}

/// Interpreters found on the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpreterCandidates {
    /// Installed versions keyed by version string
    versions: BTreeMap<String, PathBuf>,
    /// Single path picked by convention, when the strategy produces one
    best_guess: Option<PathBuf>,
}

impl InterpreterCandidates {
    pub fn none() -> Self {
        Self::default()
    }

    /// A single conventional interpreter path
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            versions: BTreeMap::new(),
            best_guess: Some(path.into()),
        }
    }

    /// An enumeration of installed versions
    pub fn from_versions(versions: BTreeMap<String, PathBuf>) -> Self {
        Self {
            versions,
            best_guess: None,
        }
    }

    pub fn versions(&self) -> &BTreeMap<String, PathBuf> {
        &self.versions
    }

    /// The interpreter to use without asking
    ///
    /// A version enumeration only auto-selects when it holds exactly one
    /// installation.
    pub fn selected(&self) -> Option<&Path> {
        if let Some(ref path) = self.best_guess {
            return Some(path);
        }
        if self.versions.len() == 1 {
            return self.versions.values().next().map(PathBuf::as_path);
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.best_guess.is_none() && self.versions.is_empty()
    }
}

/// Locates the tools an action needs on the current host
#[derive(Debug)]
pub struct PathResolver {
    host: HostOs,
    env: EnvironmentMap,
    locator: Box<dyn InterpreterLocator>,
    search_dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// Resolver for `host` reading from the given environment snapshot
    pub fn for_host(host: HostOs, env: EnvironmentMap) -> Self {
        let locator: Box<dyn InterpreterLocator> = if host.is_windows() {
            Box::new(RegistryLocator::new())
        } else {
            Box::new(SearchPathLocator::new(host))
        };

        Self {
            host,
            env,
            locator,
            search_dirs: Vec::new(),
        }
    }

    /// Resolver for the running process
    pub fn current() -> Self {
        Self::for_host(HostOs::current(), EnvironmentMap::from_process())
    }

    /// Replace the interpreter strategy
    pub fn with_locator(mut self, locator: impl InterpreterLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    /// Extra directories searched after the search path and default locations
    pub fn with_search_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_dirs.extend(dirs);
        self
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    pub fn environment(&self) -> &EnvironmentMap {
        &self.env
    }

    /// All interpreter installations the strategy can see
    pub fn interpreter_candidates(&self) -> InterpreterCandidates {
        let candidates = self.locator.locate(&self.env);
        if candidates.is_empty() {
            info!("No Python installations found in the system.");
        } else {
            debug!(versions = candidates.versions().len(), "Interpreter candidates found");
        }
        candidates
    }

    /// The interpreter to use without prompting, if one is unambiguous
    pub fn resolve_interpreter(&self) -> Option<PathBuf> {
        self.interpreter_candidates().selected().map(Path::to_path_buf)
    }

    /// First executable named `name` on the search path or in a default location
    pub fn resolve_version_control_tool(&self, name: &str) -> Option<PathBuf> {
        let found = find_executable(name, &self.env, self.host, &self.search_dirs);
        debug!(tool = name, path = ?found, "Version-control tool lookup");
        found
    }

    /// Install root advertised by the environment
    pub fn install_root(&self) -> Option<PathBuf> {
        self.env
            .get(INSTALL_ROOT_VAR)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedLocator(InterpreterCandidates);

    impl InterpreterLocator for FixedLocator {
        fn locate(&self, _env: &EnvironmentMap) -> InterpreterCandidates {
            self.0.clone()
        }
    }

    fn versions(entries: &[(&str, &str)]) -> BTreeMap<String, PathBuf> {
        entries
            .iter()
            .map(|(v, p)| (v.to_string(), PathBuf::from(p)))
            .collect()
    }

    #[test]
    fn test_single_version_is_auto_selected() {
        let candidates = InterpreterCandidates::from_versions(versions(&[("3.11", "C:\\Py311\\python.exe")]));
        assert_eq!(candidates.selected(), Some(Path::new("C:\\Py311\\python.exe")));
    }

    #[test]
    fn test_several_versions_need_a_choice() {
        let candidates = InterpreterCandidates::from_versions(versions(&[
            ("3.10", "C:\\Py310\\python.exe"),
            ("3.11", "C:\\Py311\\python.exe"),
        ]));
        assert!(candidates.selected().is_none());
        assert_eq!(candidates.versions().len(), 2);
    }

    #[test]
    fn test_no_versions_selects_nothing() {
        let candidates = InterpreterCandidates::none();
        assert!(candidates.is_empty());
        assert!(candidates.selected().is_none());
    }

    #[test]
    fn test_resolver_uses_injected_locator() {
        let resolver = PathResolver::for_host(HostOs::Linux, EnvironmentMap::new())
            .with_locator(FixedLocator(InterpreterCandidates::single("/opt/py/bin/python3")));
        assert_eq!(resolver.resolve_interpreter(), Some(PathBuf::from("/opt/py/bin/python3")));
    }

    #[test]
    fn test_install_root_from_environment() {
        let env = EnvironmentMap::new().with(INSTALL_ROOT_VAR, "/opt/esp/idf");
        let resolver = PathResolver::for_host(HostOs::Linux, env);
        assert_eq!(resolver.install_root(), Some(PathBuf::from("/opt/esp/idf")));
    }

    #[test]
    fn test_blank_install_root_is_absent() {
        let env = EnvironmentMap::new().with(INSTALL_ROOT_VAR, "  ");
        let resolver = PathResolver::for_host(HostOs::Linux, env);
        assert!(resolver.install_root().is_none());
    }
}
