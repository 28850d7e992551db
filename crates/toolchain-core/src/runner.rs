//! Child process execution
//!
//! [`TokioProcessRunner`] starts the command with exactly the environment it
//! is given, captures stdout and stderr, and waits for exit, cancellation or
//! timeout, whichever comes first. The child leads its own process group on
//! unix so termination also reaches anything it started. Every call produces an
//! [`ExecutionResult`]; failures are carried inside it, never returned as
//! `Err`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::environment::EnvironmentMap;
use crate::error::Error;
use crate::types::Outcome;

/// A fully-formed command ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    executable: PathBuf,
    arguments: Vec<String>,
    working_dir: PathBuf,
    environment: EnvironmentMap,
}

impl CommandInvocation {
    /// Build an invocation from a full argument vector.
    ///
    /// `arguments[0]` is the program to start; the rest are passed to it.
    pub fn new(arguments: Vec<String>, working_dir: impl Into<PathBuf>, environment: EnvironmentMap) -> Self {
        let executable = arguments.first().map(PathBuf::from).unwrap_or_default();
        Self {
            executable,
            arguments,
            working_dir: working_dir.into(),
            environment,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Full argument vector, program included
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Arguments handed to the program, i.e. everything after `arguments[0]`
    pub fn program_arguments(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or_default()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn environment(&self) -> &EnvironmentMap {
        &self.environment
    }

    /// Arguments joined by single spaces, as shown to the user
    pub fn command_line(&self) -> String {
        self.arguments.join(" ").trim().to_string()
    }
}

/// Normalized result of one process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    outcome: Outcome,
    message: String,
    error: Option<Error>,
}

impl ExecutionResult {
    /// Successful run carrying the captured output
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Ok,
            message: message.into(),
            error: None,
        }
    }

    /// Failed run with a readable summary and the underlying cause
    pub fn failed(message: impl Into<String>, error: Error) -> Self {
        Self {
            outcome: Outcome::Error,
            message: message.into(),
            error: Some(error),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }

    /// Text for the error stream: the cause when there is one, else the message
    pub fn error_text(&self) -> String {
        match self.error {
            Some(ref err) => err.to_string(),
            None => self.message.clone(),
        }
    }
}

/// Executes a command and waits for it
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` to completion, or until `cancel` fires
    async fn run(&self, invocation: CommandInvocation, cancel: CancellationToken) -> ExecutionResult;
}

/// Runs commands as tokio child processes
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    timeout: Option<Duration>,
}

/// How long output pipes may stay open after the child exits.
///
/// A background process started by the script inherits the pipes; once this
/// elapses the process group is killed and whatever was read so far is kept.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How the wait for the child ended
enum WaitEnd {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

/// How the wait for the output pipes ended
enum DrainEnd {
    Closed,
    Cancelled,
    TimedOut(Duration),
    Lingering,
}

/// Absolute deadline with the configured limit it came from
type Deadline = Option<(Instant, Duration)>;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate the child if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn wait_for(child: &mut Child, cancel: &CancellationToken, deadline: Deadline) -> WaitEnd {
        tokio::select! {
            status = child.wait() => WaitEnd::Exited(status),
            () = cancel.cancelled() => WaitEnd::Cancelled,
            limit = until(deadline) => WaitEnd::TimedOut(limit),
        }
    }

    /// Wait for both pipes to close, bounded by cancel, the deadline and [`DRAIN_GRACE`]
    async fn drain(
        stdout: &mut PipeCapture,
        stderr: &mut PipeCapture,
        cancel: &CancellationToken,
        deadline: Deadline,
    ) -> DrainEnd {
        tokio::select! {
            () = async {
                stdout.closed().await;
                stderr.closed().await;
            } => DrainEnd::Closed,
            () = cancel.cancelled() => DrainEnd::Cancelled,
            limit = until(deadline) => DrainEnd::TimedOut(limit),
            () = tokio::time::sleep(DRAIN_GRACE) => DrainEnd::Lingering,
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: CommandInvocation, cancel: CancellationToken) -> ExecutionResult {
        let program = invocation.executable().display().to_string();
        debug!(command = %invocation.command_line(), cwd = %invocation.working_dir().display(), "Spawning process");

        let mut cmd = Command::new(invocation.executable());
        cmd.args(invocation.program_arguments())
            .current_dir(invocation.working_dir())
            .env_clear()
            .envs(invocation.environment().iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so termination reaches everything the script started
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %program, error = %e, "Failed to launch process");
                return ExecutionResult::failed(
                    format!("Unable to start {}", program),
                    Error::launch(&program, &e),
                );
            }
        };
        let pid = child.id();
        let deadline = self.timeout.map(|limit| (Instant::now() + limit, limit));

        let mut stdout = PipeCapture::spawn(child.stdout.take());
        let mut stderr = PipeCapture::spawn(child.stderr.take());

        let status = match Self::wait_for(&mut child, &cancel, deadline).await {
            WaitEnd::Exited(status) => status,
            WaitEnd::Cancelled => {
                terminate(&mut child, pid, &program).await;
                stdout.abort();
                stderr.abort();
                return cancelled(&program);
            }
            WaitEnd::TimedOut(limit) => {
                terminate(&mut child, pid, &program).await;
                stdout.abort();
                stderr.abort();
                return timed_out(&program, limit);
            }
        };

        match Self::drain(&mut stdout, &mut stderr, &cancel, deadline).await {
            DrainEnd::Closed => {}
            DrainEnd::Cancelled => {
                kill_process_group(pid).await;
                stdout.abort();
                stderr.abort();
                return cancelled(&program);
            }
            DrainEnd::TimedOut(limit) => {
                kill_process_group(pid).await;
                stdout.abort();
                stderr.abort();
                return timed_out(&program, limit);
            }
            DrainEnd::Lingering => {
                warn!(program = %program, "Output still held open by a background process, killing it");
                kill_process_group(pid).await;
                stdout.abort();
                stderr.abort();
            }
        }

        let stdout = stdout.text();
        let stderr = stderr.text();

        match status {
            Ok(status) if status.success() => {
                if !stderr.trim().is_empty() {
                    debug!(stderr = %stderr.trim_end(), "Process wrote to stderr");
                }
                ExecutionResult::ok(stdout.trim_end())
            }
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                let stderr = stderr.trim_end().to_string();
                let message = if stderr.trim().is_empty() {
                    format!("{} exited with status {}", program, status)
                } else {
                    stderr.clone()
                };
                ExecutionResult::failed(message, Error::NonZeroExit { code, stderr })
            }
            Err(e) => {
                warn!(program = %program, error = %e, "Failed to wait for process");
                ExecutionResult::failed(
                    format!("Lost track of {}", program),
                    Error::launch(&program, &e),
                )
            }
        }
    }
}

fn cancelled(program: &str) -> ExecutionResult {
    ExecutionResult::failed(format!("{} was cancelled", program), Error::Cancelled)
}

fn timed_out(program: &str, timeout: Duration) -> ExecutionResult {
    ExecutionResult::failed(
        format!("{} timed out after {:?}", program, timeout),
        Error::Timeout { timeout },
    )
}

/// Resolves with the configured limit once `deadline` passes; never without one
async fn until(deadline: Deadline) -> Duration {
    match deadline {
        Some((at, limit)) => {
            tokio::time::sleep_until(at).await;
            limit
        }
        None => std::future::pending().await,
    }
}

/// One output pipe drained on its own task so a chatty child never blocks on a full buffer.
///
/// Bytes land in a shared buffer as they arrive, so output read before an
/// abort is still available.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeCapture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else { return };
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });
        Self { buffer, task }
    }

    /// Resolves once the pipe reached end of file
    async fn closed(&mut self) {
        let _ = (&mut self.task).await;
    }

    fn abort(&self) {
        self.task.abort();
    }

    fn text(&self) -> String {
        self.buffer
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

async fn terminate(child: &mut Child, pid: Option<u32>, program: &str) {
    kill_process_group(pid).await;
    if let Err(e) = child.kill().await {
        warn!(program, error = %e, "Failed to terminate process");
    }
}

/// Kill the child's process group (unix) or process tree (Windows)
async fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };

    #[cfg(unix)]
    let output = Command::new("kill")
        .args(["-s", "KILL", "--", &format!("-{}", pid)])
        .output()
        .await;
    #[cfg(windows)]
    let output = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .output()
        .await;

    match output {
        Ok(out) if !out.status.success() => {
            debug!(pid, stderr = %String::from_utf8_lossy(&out.stderr).trim_end(), "Process group already gone");
        }
        Ok(_) => debug!(pid, "Process group killed"),
        Err(e) => warn!(pid, error = %e, "Failed to kill process group"),
    }
}
