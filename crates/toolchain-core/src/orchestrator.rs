//! Invocation orchestration: validate, build, merge, execute, classify, report
//!
//! One call to [`InvocationOrchestrator::run_command`] walks the states in a
//! fixed order and spawns at most one process. The process wait runs on its
//! own tokio task; if that task dies without a result the orchestrator
//! reports [`Error::NullStatus`] instead of propagating the fault.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_SCRIPT;
use crate::environment::{EnvironmentBuilder, EnvironmentMap};
use crate::error::Error;
use crate::reporter::Reporter;
use crate::runner::{CommandInvocation, ExecutionResult, ProcessRunner};
use crate::types::{Severity, Status, ToolPaths};

/// Prefix of the command line echoed before each run
pub const EXECUTING_PREFIX: &str = "Executing";

/// Everything one orchestration call needs, passed explicitly through the states
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub paths: ToolPaths,
    /// Base environment for the child; the version-control directory is merged into a copy
    pub environment: EnvironmentMap,
    pub working_dir: PathBuf,
    pub cancel: CancellationToken,
}

impl InvocationContext {
    /// Context running from the filesystem root with a fresh cancellation token
    pub fn new(paths: ToolPaths, environment: EnvironmentMap) -> Self {
        Self {
            paths,
            environment,
            working_dir: filesystem_root(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

fn filesystem_root() -> PathBuf {
    PathBuf::from(std::path::MAIN_SEPARATOR_STR)
}

/// Coordinates one management-script run from validation to reporting
pub struct InvocationOrchestrator {
    runner: Arc<dyn ProcessRunner>,
    reporter: Arc<dyn Reporter>,
    environment: EnvironmentBuilder,
    script: PathBuf,
    report_lock: Mutex<()>,
}

impl InvocationOrchestrator {
    pub fn new(runner: Arc<dyn ProcessRunner>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            runner,
            reporter,
            environment: EnvironmentBuilder::default(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            report_lock: Mutex::new(()),
        }
    }

    pub fn with_environment_builder(mut self, builder: EnvironmentBuilder) -> Self {
        self.environment = builder;
        self
    }

    /// Management script location relative to the install root
    pub fn with_script(mut self, relative: impl Into<PathBuf>) -> Self {
        self.script = relative.into();
        self
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Absolute path of the management script under `install_root`
    pub fn script_path(&self, install_root: &Path) -> PathBuf {
        let joined = install_root.join(&self.script);
        std::path::absolute(&joined).unwrap_or(joined)
    }

    /// `[interpreter, script, caller_args...]`
    pub fn build_arguments(&self, paths: &ToolPaths, caller_args: &[String]) -> Vec<String> {
        let mut arguments = Vec::with_capacity(caller_args.len() + 2);
        arguments.push(paths.interpreter.to_string_lossy().into_owned());
        arguments.push(self.script_path(&paths.install_root).to_string_lossy().into_owned());
        arguments.extend(caller_args.iter().cloned());
        arguments
    }

    /// Copy of `base` with the version-control directory merged in, when one was resolved
    pub fn merge_environment(&self, paths: &ToolPaths, base: &EnvironmentMap) -> EnvironmentMap {
        match paths.version_control() {
            Some(tool) => self.environment.merge_tool_directory(base.clone(), tool),
            None => {
                debug!("No version-control tool resolved, environment passed through");
                base.clone()
            }
        }
    }

    /// Run the management script with `caller_args` and report the outcome
    pub async fn run_command(&self, ctx: &InvocationContext, caller_args: &[String]) -> Status {
        let _report = self.report_lock.lock().await;

        // VALIDATE
        if let Err(err) = ctx.paths.validate() {
            let text = err.to_string();
            error!(error = %text, "Refusing to run with missing paths");
            self.reporter.print_error(&text);
            return Status::error(text);
        }

        // BUILD_ARGS
        let arguments = self.build_arguments(&ctx.paths, caller_args);

        // MERGE_ENV
        let environment = self.merge_environment(&ctx.paths, &ctx.environment);

        let invocation = CommandInvocation::new(arguments, &ctx.working_dir, environment);
        let command_line = format!("{} {}", EXECUTING_PREFIX, invocation.command_line());
        self.reporter.println(&command_line);
        info!("{}", command_line);

        // EXECUTE
        let result = self.execute(invocation, ctx.cancel.clone()).await;

        // CLASSIFY
        let severity = Severity::from(result.outcome());

        // REPORT
        match severity {
            Severity::Ok => info!(output = %result.message(), "Command finished"),
            Severity::Error => {
                let text = result.error_text();
                error!(error = %text, "Command failed");
                self.reporter.print_error(&text);
            }
        }
        self.reporter.println(result.message());
        self.reporter.println("");

        Status {
            severity,
            message: result.message().to_string(),
        }
    }

    /// Run `arguments` as given and return the captured output.
    ///
    /// No prefixing and no reporting. A non-zero exit still returns the
    /// result message; failures where nothing ran (launch, cancel, timeout,
    /// lost runner) are logged and yield an empty string.
    pub async fn run_raw(
        &self,
        arguments: Vec<String>,
        working_dir: impl Into<PathBuf>,
        environment: EnvironmentMap,
        cancel: CancellationToken,
    ) -> String {
        let command_line = arguments.join(" ");
        let result = self.capture(arguments, working_dir, environment, cancel).await;

        match result.error() {
            None => {
                info!(command = %command_line, output = %result.message(), "Command output captured");
                result.message().to_string()
            }
            Some(err @ Error::NonZeroExit { .. }) => {
                warn!(command = %command_line, error = %err, "Command exited with an error");
                result.message().to_string()
            }
            Some(err) => {
                error!(command = %command_line, error = %err, "Command produced no output");
                String::new()
            }
        }
    }

    /// Run `arguments` as given and hand back the full result.
    ///
    /// Like [`Self::run_raw`] nothing is prefixed or reported, but the caller
    /// sees the outcome and can tell a failed run from empty output.
    pub async fn capture(
        &self,
        arguments: Vec<String>,
        working_dir: impl Into<PathBuf>,
        environment: EnvironmentMap,
        cancel: CancellationToken,
    ) -> ExecutionResult {
        let invocation = CommandInvocation::new(arguments, working_dir, environment);
        self.execute(invocation, cancel).await
    }

    /// Drive the runner on its own task so the wait never blocks the caller's thread
    async fn execute(&self, invocation: CommandInvocation, cancel: CancellationToken) -> ExecutionResult {
        let runner = Arc::clone(&self.runner);
        let handle = tokio::spawn(async move { runner.run(invocation, cancel).await });

        match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                let err = Error::NullStatus {
                    reason: join_error.to_string(),
                };
                error!(error = %err, "Process runner task ended without a result");
                ExecutionResult::failed(err.to_string(), err)
            }
        }
    }
}
