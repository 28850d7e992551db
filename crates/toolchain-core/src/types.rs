//! Shared types for tool invocations

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Paths the orchestrator needs for one action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    /// Interpreter that runs the management script
    pub interpreter: PathBuf,
    /// Version-control executable, merged into the child search path when present
    pub version_control: Option<PathBuf>,
    /// Toolchain installation root
    pub install_root: PathBuf,
}

impl ToolPaths {
    pub fn new(interpreter: impl Into<PathBuf>, install_root: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            version_control: None,
            install_root: install_root.into(),
        }
    }

    /// Attach a version-control executable
    pub fn with_version_control(mut self, path: impl Into<PathBuf>) -> Self {
        self.version_control = Some(path.into());
        self
    }

    /// Check that the interpreter and install root are non-empty
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if is_empty(&self.interpreter) {
            missing.push("interpreter");
        }
        if is_empty(&self.install_root) {
            missing.push("install root");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingPath { missing })
        }
    }

    /// Version-control path, ignoring an empty value
    pub fn version_control(&self) -> Option<&Path> {
        self.version_control.as_deref().filter(|p| !is_empty(p))
    }
}

fn is_empty(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

/// Outcome of a single process run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
}

/// Severity reported to external callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, the action succeeded
    Ok,
    /// The action failed
    Error,
}

impl From<Outcome> for Severity {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ok => Severity::Ok,
            Outcome::Error => Severity::Error,
        }
    }
}

/// Final status handed back to whoever triggered an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub severity: Severity,
    pub message: String,
}

impl Status {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }
}
