//! Tool orchestration core for the toolchain manager
//!
//! This crate drives the external management script that installs and
//! maintains a toolchain. It handles:
//!
//! - Discovery of the interpreter and version-control executables per host OS
//! - Merging the version-control tool directory into a child environment
//! - Running the script as a child process with cancellation and timeout
//! - Classifying and reporting the outcome to a [`Reporter`]
//!
//! # Architecture
//!
//! ```text
//!               ToolsHandler
//!                    |
//!          InvocationOrchestrator
//!          /         |          \
//! PathResolver  EnvironmentBuilder  ProcessRunner
//! ```
//!
//! Presentation (path selection, console views, build-environment storage)
//! stays outside this crate behind the [`PathSelector`], [`Reporter`] and
//! [`BuildEnvironment`] traits.

pub mod config;
pub mod environment;
pub mod error;
pub mod handler;
pub mod logging;
pub mod orchestrator;
pub mod platform;
pub mod reporter;
pub mod resolver;
pub mod runner;
pub mod types;

pub use config::ToolsConfig;
pub use environment::{EnvironmentBuilder, EnvironmentMap};
pub use error::{Error, Result};
pub use handler::{
    BuildEnvironment, CollectedEnvironment, PathSelector, Selection, SelectionRequest, ToolsAction,
    ToolsHandler, parse_export_output,
};
pub use orchestrator::{InvocationContext, InvocationOrchestrator};
pub use platform::HostOs;
pub use reporter::{NullReporter, Reporter};
pub use resolver::{InterpreterCandidates, InterpreterLocator, PathResolver};
pub use runner::{CommandInvocation, ExecutionResult, ProcessRunner, TokioProcessRunner};
pub use types::{Outcome, Severity, Status, ToolPaths};

/// Environment variable holding the toolchain installation root
pub const INSTALL_ROOT_VAR: &str = "IDF_PATH";
