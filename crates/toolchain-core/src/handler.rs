//! Action entry point: discover paths, let the user confirm them, run the script
//!
//! The handler gathers everything discovery can find, asks the
//! [`PathSelector`] to confirm or cancel, publishes the install root to the
//! [`BuildEnvironment`], then runs a [`ToolsAction`] through the
//! orchestrator.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::INSTALL_ROOT_VAR;
use crate::config::ToolsConfig;
use crate::environment::EnvironmentMap;
use crate::orchestrator::{InvocationContext, InvocationOrchestrator};
use crate::resolver::PathResolver;
use crate::types::{Status, ToolPaths};

/// Everything discovery found, handed to the selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionRequest {
    pub command_id: String,
    pub interpreter: Option<PathBuf>,
    /// Installed interpreter versions, filled on hosts that enumerate them
    pub interpreter_versions: BTreeMap<String, PathBuf>,
    pub version_control: Option<PathBuf>,
    pub install_root: Option<PathBuf>,
}

/// Answer of the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Confirmed(ToolPaths),
    Cancelled,
}

/// Lets the user confirm or override discovered paths
pub trait PathSelector {
    fn select(&self, request: &SelectionRequest) -> Selection;
}

/// Receives variables for the downstream build environment
pub trait BuildEnvironment {
    fn set_var(&self, key: &str, value: &str);
}

/// Management-script operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsAction {
    /// Download and install tools, all of them when `tools` is empty
    Install { tools: Vec<String> },
    /// Create the interpreter virtual environment
    InstallPythonEnv,
    /// List known tools and their install state
    List,
    /// Print the environment needed to use the installed tools
    Export,
    /// Pass arbitrary arguments to the script
    Run { args: Vec<String> },
}

impl ToolsAction {
    /// Arguments following the script path
    pub fn arguments(&self) -> Vec<String> {
        match self {
            ToolsAction::Install { tools } => std::iter::once("install".to_string())
                .chain(tools.iter().cloned())
                .collect(),
            ToolsAction::InstallPythonEnv => vec!["install-python-env".to_string()],
            ToolsAction::List => vec!["list".to_string()],
            ToolsAction::Export => ["export", "--format", "key-value"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ToolsAction::Run { args } => args.clone(),
        }
    }

    /// Identifier logged at the start of the action
    pub fn command_id(&self) -> &'static str {
        match self {
            ToolsAction::Install { .. } => "tools.install",
            ToolsAction::InstallPythonEnv => "tools.install-python-env",
            ToolsAction::List => "tools.list",
            ToolsAction::Export => "tools.export",
            ToolsAction::Run { .. } => "tools.run",
        }
    }
}

/// Drives one user-initiated action end to end
pub struct ToolsHandler {
    resolver: PathResolver,
    orchestrator: InvocationOrchestrator,
    config: ToolsConfig,
}

impl ToolsHandler {
    pub fn new(resolver: PathResolver, orchestrator: InvocationOrchestrator, config: ToolsConfig) -> Self {
        Self {
            resolver,
            orchestrator,
            config,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Collect discovered paths for `command_id`
    pub fn discover(&self, command_id: &str) -> SelectionRequest {
        info!("Command id: {}", command_id);

        let install_root = self.resolver.install_root();
        info!("{}: {:?}", INSTALL_ROOT_VAR, install_root);

        let version_control = self
            .resolver
            .resolve_version_control_tool(&self.config.version_control_tool);
        info!("{} path: {:?}", self.config.version_control_tool, version_control);

        let candidates = self.resolver.interpreter_candidates();

        SelectionRequest {
            command_id: command_id.to_string(),
            interpreter: candidates.selected().map(PathBuf::from),
            interpreter_versions: candidates.versions().clone(),
            version_control,
            install_root,
        }
    }

    /// Run `action` after the selector confirms the paths.
    ///
    /// Returns `None` when the selector cancels; nothing runs in that case.
    pub async fn handle(
        &self,
        action: &ToolsAction,
        selector: &dyn PathSelector,
        build_env: &dyn BuildEnvironment,
        cancel: CancellationToken,
    ) -> Option<Status> {
        let request = self.discover(action.command_id());

        let paths = match selector.select(&request) {
            Selection::Confirmed(paths) => paths,
            Selection::Cancelled => {
                info!(command = action.command_id(), "Path selection cancelled");
                return None;
            }
        };

        if paths.version_control().is_none() {
            warn!("No version-control executable selected, search path left as is");
        }

        let root = paths.install_root.to_string_lossy();
        if !root.trim().is_empty() {
            build_env.set_var(INSTALL_ROOT_VAR, &root);
        }

        let mut ctx = InvocationContext::new(paths, self.resolver.environment().clone()).with_cancel(cancel);
        if let Some(ref dir) = self.config.working_dir {
            ctx = ctx.with_working_dir(dir);
        }

        let status = match action {
            ToolsAction::Export => self.export(&ctx, build_env).await,
            _ => self.orchestrator.run_command(&ctx, &action.arguments()).await,
        };
        Some(status)
    }

    async fn export(&self, ctx: &InvocationContext, build_env: &dyn BuildEnvironment) -> Status {
        let reporter = self.orchestrator.reporter();
        if let Err(err) = ctx.paths.validate() {
            reporter.print_error(&err.to_string());
            return Status::error(err.to_string());
        }

        let arguments = self
            .orchestrator
            .build_arguments(&ctx.paths, &ToolsAction::Export.arguments());
        let environment = self.orchestrator.merge_environment(&ctx.paths, &ctx.environment);

        let result = self
            .orchestrator
            .capture(arguments, &ctx.working_dir, environment, ctx.cancel.clone())
            .await;

        if !result.is_ok() {
            let text = result.error_text();
            warn!(error = %text, "Export failed, nothing published");
            reporter.print_error(&text);
            return match result.message() {
                "" => Status::error(text),
                message => Status::error(message),
            };
        }

        let vars = parse_export_output(result.message());
        if vars.is_empty() {
            let text = "Export produced no environment variables";
            reporter.print_error(text);
            return Status::error(text);
        }
        for (key, value) in &vars {
            debug!(key = %key, "Exporting variable");
            build_env.set_var(key, value);
        }
        Status::ok(format!("Exported {} environment variables", vars.len()))
    }
}

/// Parse `KEY=VALUE` lines; blank and malformed lines are skipped
pub fn parse_export_output(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            let key = key.trim();
            let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            valid.then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Publishes variables into an in-memory map
#[derive(Debug, Default)]
pub struct CollectedEnvironment {
    vars: std::sync::Mutex<EnvironmentMap>,
}

impl CollectedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn snapshot(&self) -> EnvironmentMap {
        self.vars.lock().map(|vars| vars.clone()).unwrap_or_default()
    }
}

impl BuildEnvironment for CollectedEnvironment {
    fn set_var(&self, key: &str, value: &str) {
        if let Ok(mut vars) = self.vars.lock() {
            vars.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ToolsAction::Install { tools: vec![] }, &["install"])]
    #[case(ToolsAction::Install { tools: vec!["cmake".into(), "ninja".into()] }, &["install", "cmake", "ninja"])]
    #[case(ToolsAction::InstallPythonEnv, &["install-python-env"])]
    #[case(ToolsAction::List, &["list"])]
    #[case(ToolsAction::Export, &["export", "--format", "key-value"])]
    #[case(ToolsAction::Run { args: vec!["check".into()] }, &["check"])]
    fn test_action_arguments(#[case] action: ToolsAction, #[case] expected: &[&str]) {
        assert_eq!(action.arguments(), expected);
    }

    #[test]
    fn test_parse_export_output() {
        let output = "\nIDF_TOOLS_EXPORT_CMD=/opt/idf/export.sh\nPATH=/opt/tools/bin:$PATH\nnot a pair\n=orphan\nBAD KEY=1\n";
        let vars = parse_export_output(output);
        assert_eq!(
            vars,
            vec![
                ("IDF_TOOLS_EXPORT_CMD".to_string(), "/opt/idf/export.sh".to_string()),
                ("PATH".to_string(), "/opt/tools/bin:$PATH".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let vars = parse_export_output("CFLAGS=-DX=1");
        assert_eq!(vars, vec![("CFLAGS".to_string(), "-DX=1".to_string())]);
    }

    #[test]
    fn test_collected_environment() {
        let env = CollectedEnvironment::new();
        env.set_var(INSTALL_ROOT_VAR, "/opt/idf");
        assert_eq!(env.snapshot().get(INSTALL_ROOT_VAR), Some("/opt/idf"));
    }
}
