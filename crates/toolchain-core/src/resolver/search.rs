//! Search-path based discovery for non-Windows hosts and for executables in general

use std::ffi::OsString;
use std::path::PathBuf;

use crate::environment::EnvironmentMap;
use crate::platform::HostOs;

use super::{InterpreterCandidates, InterpreterLocator};

/// Virtual environment created by the management script
const PYTHON_ENV_VAR: &str = "IDF_PYTHON_ENV_PATH";

/// Interpreter names tried in order
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

/// Finds the interpreter by install convention, then on the search path
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    host: HostOs,
}

impl SearchPathLocator {
    pub fn new(host: HostOs) -> Self {
        Self { host }
    }

    /// Interpreter inside the virtual environment named by `IDF_PYTHON_ENV_PATH`
    fn python_env_interpreter(&self, env: &EnvironmentMap) -> Option<PathBuf> {
        let root = PathBuf::from(env.get(PYTHON_ENV_VAR)?.trim());
        let python = if self.host.is_windows() {
            root.join("Scripts").join("python.exe")
        } else {
            root.join("bin").join("python")
        };
        python.is_file().then_some(python)
    }
}

impl InterpreterLocator for SearchPathLocator {
    fn locate(&self, env: &EnvironmentMap) -> InterpreterCandidates {
        if let Some(python) = self.python_env_interpreter(env) {
            return InterpreterCandidates::single(python);
        }

        PYTHON_CANDIDATES
            .iter()
            .find_map(|name| find_executable(name, env, self.host, &[]))
            .map(InterpreterCandidates::single)
            .unwrap_or_default()
    }
}

/// Well-known install directories checked after the search path
pub fn default_install_dirs(host: HostOs) -> Vec<PathBuf> {
    let dirs: &[&str] = match host {
        HostOs::Windows => &[
            "C:\\Program Files\\Git\\cmd",
            "C:\\Program Files\\Git\\bin",
            "C:\\Program Files (x86)\\Git\\cmd",
        ],
        HostOs::MacOs => &["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"],
        HostOs::Linux | HostOs::Other => &["/usr/local/bin", "/usr/bin", "/bin"],
    };
    dirs.iter().map(PathBuf::from).collect()
}

/// Search the environment's search path, the default locations and `extra` for `name`
///
/// Returns the first match.
pub fn find_executable(
    name: &str,
    env: &EnvironmentMap,
    host: HostOs,
    extra: &[PathBuf],
) -> Option<PathBuf> {
    let search_path = search_path_of(env, host, extra)?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(name, Some(search_path), cwd).ok()
}

/// Joined search path: the environment value, then defaults, then `extra`
fn search_path_of(env: &EnvironmentMap, host: HostOs, extra: &[PathBuf]) -> Option<OsString> {
    let listed = host
        .search_path_keys()
        .iter()
        .find_map(|key| env.get(key).filter(|value| !value.is_empty()))
        .unwrap_or_default();

    let dirs: Vec<PathBuf> = std::env::split_paths(listed)
        .chain(default_install_dirs(host))
        .chain(extra.iter().cloned())
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();

    std::env::join_paths(dirs).ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn executable(dir: &std::path::Path, name: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_find_executable_on_search_path() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        let tool = executable(&bin, "fake-vcs-tool");
        let env = EnvironmentMap::new().with("PATH", bin.to_string_lossy());

        let found = find_executable("fake-vcs-tool", &env, HostOs::Linux, &[]);

        assert_eq!(found, Some(tool));
    }

    #[test]
    fn test_find_executable_in_extra_dirs() {
        let temp = TempDir::new().unwrap();
        let extra = temp.path().join("extra");
        let tool = executable(&extra, "fake-vcs-tool");
        let env = EnvironmentMap::new().with("PATH", "");

        let found = find_executable("fake-vcs-tool", &env, HostOs::Linux, &[extra]);

        assert_eq!(found, Some(tool));
    }

    #[test]
    fn test_first_match_wins() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let expected = executable(&first, "fake-vcs-tool");
        executable(&second, "fake-vcs-tool");
        let joined = std::env::join_paths([&first, &second]).unwrap();
        let env = EnvironmentMap::new().with("PATH", joined.to_string_lossy());

        let found = find_executable("fake-vcs-tool", &env, HostOs::Linux, &[]);

        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_missing_executable_is_none() {
        let env = EnvironmentMap::new().with("PATH", "/nonexistent-dir");
        assert!(find_executable("definitely-not-a-real-tool-xyz", &env, HostOs::Linux, &[]).is_none());
    }

    #[test]
    fn test_python_env_variable_takes_priority() {
        let temp = TempDir::new().unwrap();
        let python = executable(&temp.path().join("venv/bin"), "python");
        let env = EnvironmentMap::new()
            .with(PYTHON_ENV_VAR, temp.path().join("venv").to_string_lossy())
            .with("PATH", "/nonexistent-dir");

        let candidates = SearchPathLocator::new(HostOs::Linux).locate(&env);

        assert_eq!(candidates.selected(), Some(python.as_path()));
    }

    #[test]
    fn test_falls_back_to_python3_on_path() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        let python3 = executable(&bin, "python3");
        executable(&bin, "python");
        let env = EnvironmentMap::new().with("PATH", bin.to_string_lossy());

        let candidates = SearchPathLocator::new(HostOs::Linux).locate(&env);

        assert_eq!(candidates.selected(), Some(python3.as_path()));
    }
}
