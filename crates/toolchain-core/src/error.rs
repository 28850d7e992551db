//! Error types for toolchain-core

use std::path::PathBuf;
use std::time::Duration;

/// Result type for toolchain-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running a tool invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// One or more required tool paths are empty
    #[error(
        "One or more paths are empty ({}). Make sure you provide the install root and the interpreter executable",
        missing.join(", ")
    )]
    MissingPath {
        /// Names of the empty paths
        missing: Vec<&'static str>,
    },

    /// The OS could not start the process
    #[error("Failed to launch {program}: {reason}")]
    ProcessLaunch {
        /// Program that failed to start
        program: String,
        /// Underlying OS error text
        reason: String,
    },

    /// Process ran but exited with a non-zero status
    #[error("Command failed (exit code {code}): {stderr}")]
    NonZeroExit {
        /// Exit code, or -1 when the process was killed by a signal
        code: i32,
        /// Captured stderr output
        stderr: String,
    },

    /// The runner task finished without producing a result
    #[error("Status can't be null: the process runner produced no result ({reason})")]
    NullStatus {
        /// Why the runner task ended
        reason: String,
    },

    /// The invocation was cancelled and the child terminated
    #[error("Cancelled")]
    Cancelled,

    /// The process did not finish in time and was terminated
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Configured limit
        timeout: Duration,
    },

    /// Configuration file could not be read or parsed
    #[error("Invalid configuration at {path}: {message}")]
    Config {
        /// Configuration file path
        path: PathBuf,
        /// Parse or read failure
        message: String,
    },
}

impl Error {
    /// Build a launch error from an I/O failure
    pub fn launch(program: impl Into<String>, source: &std::io::Error) -> Self {
        Self::ProcessLaunch {
            program: program.into(),
            reason: source.to_string(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_lists_names() {
        let err = Error::MissingPath {
            missing: vec!["interpreter", "install root"],
        };
        let text = err.to_string();
        assert!(text.contains("interpreter, install root"));
        assert!(text.starts_with("One or more paths are empty"));
    }

    #[test]
    fn test_non_zero_exit_display() {
        let err = Error::NonZeroExit {
            code: 2,
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Command failed (exit code 2): boom");
    }

    #[test]
    fn test_launch_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::launch("python3", &io);
        assert!(err.to_string().contains("python3"));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Timeout after 30s");
    }
}
