//! Windows interpreter enumeration from the registry
//!
//! Installed interpreters register under
//! `Software\Python\PythonCore\<version>\InstallPath`. The keys are read with
//! `reg query` so no Windows-only bindings are needed to build the crate.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

use crate::environment::EnvironmentMap;

use super::{InterpreterCandidates, InterpreterLocator};

/// Registry roots scanned for installations, in priority order
const REGISTRY_ROOTS: &[&str] = &[
    "HKCU\\Software\\Python\\PythonCore",
    "HKLM\\Software\\Python\\PythonCore",
    "HKLM\\Software\\WOW6432Node\\Python\\PythonCore",
];

const INSTALL_PATH_KEY: &str = "InstallPath";

/// Enumerates registered interpreter installations
#[derive(Debug, Clone, Default)]
pub struct RegistryLocator;

impl RegistryLocator {
    pub fn new() -> Self {
        Self
    }

    fn query(root: &str) -> Option<String> {
        let output = Command::new("reg").args(["query", root, "/s"]).output();
        match output {
            Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(_) => {
                debug!(root, "Registry key not present");
                None
            }
            Err(e) => {
                warn!(root, error = %e, "Failed to query registry");
                None
            }
        }
    }
}

impl InterpreterLocator for RegistryLocator {
    fn locate(&self, _env: &EnvironmentMap) -> InterpreterCandidates {
        let mut versions = BTreeMap::new();
        for root in REGISTRY_ROOTS {
            if let Some(listing) = Self::query(root) {
                for (version, path) in parse_registry_listing(&listing) {
                    // Earlier roots win: per-user installs shadow machine-wide ones.
                    versions.entry(version).or_insert(path);
                }
            }
        }
        InterpreterCandidates::from_versions(versions)
    }
}

/// Extract `version -> interpreter path` pairs from `reg query /s` output.
///
/// `ExecutablePath` is preferred; otherwise the default value of
/// `InstallPath` joined with `python.exe` is used.
pub fn parse_registry_listing(listing: &str) -> BTreeMap<String, PathBuf> {
    let mut executables: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut install_dirs: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut current_version: Option<String> = None;

    for line in listing.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            current_version = install_path_version(line.trim());
            continue;
        }

        let Some(version) = current_version.as_ref() else {
            continue;
        };
        let Some((name, value)) = split_value(line) else {
            continue;
        };

        match name {
            "ExecutablePath" => {
                executables.insert(version.clone(), PathBuf::from(value));
            }
            "(Default)" => {
                install_dirs.insert(version.clone(), PathBuf::from(value).join("python.exe"));
            }
            _ => {}
        }
    }

    for (version, path) in install_dirs {
        executables.entry(version).or_insert(path);
    }
    executables
}

/// Version component of a `...\PythonCore\<version>\InstallPath` key
fn install_path_version(key: &str) -> Option<String> {
    let mut segments = key.rsplit('\\');
    if segments.next()? != INSTALL_PATH_KEY {
        return None;
    }
    segments.next().map(str::to_string)
}

/// Split `    Name    REG_SZ    Value` into name and value
fn split_value(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let (name, value) = line
        .split_once("REG_EXPAND_SZ")
        .or_else(|| line.split_once("REG_SZ"))?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((name.trim(), value))
}
