//! Scenario tests wiring the full stack the way the CLI does:
//! configuration file -> resolver -> handler -> tokio runner -> real script.
//!
//! Scripts are shell run through `/bin/sh`, so the scenarios are unix only.

#![cfg(unix)]

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use toolchain_core::{
    CollectedEnvironment, EnvironmentMap, HostOs, INSTALL_ROOT_VAR, PathResolver, Severity,
    ToolsAction, ToolsConfig, ToolsHandler,
};
use toolchain_test_utils::{FixedSelector, RecordingReporter, ToolFixture};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Scenario {
    fixture: ToolFixture,
    reporter: Arc<RecordingReporter>,
    handler: ToolsHandler,
}

impl Scenario {
    /// Handler over `fixture` configured by the TOML text `config`
    fn new(fixture: ToolFixture, config: &str) -> Self {
        let config_dir = TempDir::new().unwrap();
        let config_path = config_dir.path().join("config.toml");
        fs::write(&config_path, config).unwrap();
        let config = ToolsConfig::load(&config_path).unwrap();

        let reporter = Arc::new(RecordingReporter::new());
        let resolver = PathResolver::for_host(HostOs::Linux, fixture.environment())
            .with_search_dirs(config.search_dirs.clone());
        let orchestrator = config.orchestrator(HostOs::Linux, reporter.clone());

        Self {
            fixture,
            reporter,
            handler: ToolsHandler::new(resolver, orchestrator, config),
        }
    }

    async fn run(&self, action: ToolsAction) -> (Option<toolchain_core::Status>, EnvironmentMap) {
        let selector = FixedSelector::confirm(self.fixture.paths());
        let build_env = CollectedEnvironment::new();
        let status = self
            .handler
            .handle(&action, &selector, &build_env, CancellationToken::new())
            .await;
        (status, build_env.snapshot())
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_install_publishes_root_and_succeeds() {
    let scenario = Scenario::new(ToolFixture::new().with_script(r#"echo "installing $2""#), "");

    let (status, published) = scenario.run(ToolsAction::Install { tools: vec!["cmake".into()] }).await;

    let status = status.unwrap();
    assert!(status.is_ok(), "{status:?}");
    assert_eq!(status.message, "installing cmake");
    assert_eq!(
        published.get(INSTALL_ROOT_VAR).map(str::to_string),
        Some(scenario.fixture.install_root().to_string_lossy().into_owned())
    );
}

#[tokio::test]
async fn scenario_configured_working_dir_is_used() {
    let work = TempDir::new().unwrap();
    let expected = work.path().canonicalize().unwrap();
    let config = format!("working_dir = \"{}\"\n", work.path().display());
    let scenario = Scenario::new(ToolFixture::new().with_script("pwd"), &config);

    let (status, _) = scenario.run(ToolsAction::List).await;

    let reported = std::path::PathBuf::from(status.unwrap().message);
    assert_eq!(reported.canonicalize().unwrap(), expected);
}

#[tokio::test]
async fn scenario_default_working_dir_is_filesystem_root() {
    let scenario = Scenario::new(ToolFixture::new().with_script("pwd"), "");

    let (status, _) = scenario.run(ToolsAction::List).await;

    assert_eq!(status.unwrap().message, "/");
}

#[tokio::test]
async fn scenario_version_control_from_search_dirs_reaches_path() {
    let fixture = ToolFixture::new().with_script(r#"echo "$PATH""#);
    let git = fixture.fake_tool("git");
    let git_dir = git.parent().unwrap().to_path_buf();
    let config = format!("search_dirs = [\"{}\"]\nversion_control_tool = \"git\"\n", git_dir.display());
    let scenario = Scenario::new(fixture, &config);

    let request = scenario.handler.discover("tools.list");
    assert!(request.version_control.is_some());

    let selector = FixedSelector::confirm(scenario.fixture.paths().with_version_control(&git));
    let build_env = CollectedEnvironment::new();
    let status = scenario
        .handler
        .handle(&ToolsAction::List, &selector, &build_env, CancellationToken::new())
        .await
        .unwrap();

    assert!(status.message.starts_with(&format!("{}:", git_dir.display())));
}

#[tokio::test]
async fn scenario_export_round_trip() {
    let scenario = Scenario::new(
        ToolFixture::new().with_script(
            r#"[ "$1" = export ] && [ "$3" = key-value ] || exit 9
echo IDF_PYTHON_ENV_PATH=/opt/env
echo "   "
echo PATH=/opt/xtensa/bin"#,
        ),
        "",
    );

    let (status, published) = scenario.run(ToolsAction::Export).await;

    let status = status.unwrap();
    assert_eq!(status.message, "Exported 2 environment variables");
    assert_eq!(published.get("IDF_PYTHON_ENV_PATH"), Some("/opt/env"));
    assert_eq!(published.get("PATH"), Some("/opt/xtensa/bin"));
    assert!(scenario.reporter.lines().is_empty());
}

#[tokio::test]
async fn scenario_configured_timeout_fails_the_action() {
    let scenario = Scenario::new(ToolFixture::new().with_script("sleep 30"), "timeout_secs = 1\n");

    let (status, _) = scenario.run(ToolsAction::List).await;

    let status = status.unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(scenario.reporter.errors()[0].starts_with("Timeout after"));
}

#[tokio::test]
async fn scenario_cancelled_selection_leaves_no_trace() {
    let scenario = Scenario::new(ToolFixture::new().with_script("echo ran"), "");
    let build_env = CollectedEnvironment::new();

    let status = scenario
        .handler
        .handle(
            &ToolsAction::List,
            &FixedSelector::cancel(),
            &build_env,
            CancellationToken::new(),
        )
        .await;

    assert!(status.is_none());
    assert!(build_env.snapshot().is_empty());
    assert!(scenario.reporter.lines().is_empty());
}
