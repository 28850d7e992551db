//! Toolchain manager CLI
//!
//! Discovers the interpreter, version-control tool and install root, then
//! runs the management script for the chosen command.

mod cli;
mod console;
mod error;
mod selector;

use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use toolchain_core::{
    CollectedEnvironment, EnvironmentMap, HostOs, PathResolver, ToolsAction, ToolsConfig, ToolsHandler,
    logging,
};

use cli::{Cli, Commands};
use console::ConsoleReporter;
use error::{CliError, Result};
use selector::FlagSelector;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let mut config = ToolsConfig::discover(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout {
        config.timeout_secs = Some(secs);
    }

    let host = HostOs::current();
    let resolver =
        PathResolver::for_host(host, EnvironmentMap::from_process()).with_search_dirs(config.search_dirs.clone());
    let version_control_tool = config.version_control_tool.clone();
    let orchestrator = config.orchestrator(host, Arc::new(ConsoleReporter));
    let handler = ToolsHandler::new(resolver, orchestrator, config);

    let selector = FlagSelector {
        python: cli.python,
        git: cli.git,
        idf_path: cli.idf_path,
    };

    let Some(action) = cli.command.action() else {
        let json = matches!(cli.command, Commands::Locate { json: true });
        return cmd_locate(&handler, &version_control_tool, json);
    };

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(cmd_action(&handler, &action, &selector))
}

fn cmd_locate(handler: &ToolsHandler, version_control_tool: &str, json: bool) -> Result<()> {
    let request = handler.discover("tools.locate");
    if json {
        println!("{}", serde_json::to_string_pretty(&request)?);
    } else {
        print!("{}", console::render_discovery(&request, version_control_tool));
    }
    Ok(())
}

async fn cmd_action(handler: &ToolsHandler, action: &ToolsAction, selector: &FlagSelector) -> Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling");
                cancel.cancel();
            }
        })
    };

    let build_env = CollectedEnvironment::new();
    let status = handler.handle(action, selector, &build_env, cancel).await;
    interrupt.abort();

    let status = status.ok_or_else(|| CliError::user("Path selection cancelled, nothing was run"))?;

    if *action == ToolsAction::Export && status.is_ok() {
        print!("{}", console::render_environment(&build_env.snapshot()));
    }

    if status.is_ok() {
        tracing::info!("{}", status.message);
        Ok(())
    } else {
        Err(CliError::Failed {
            command: action.command_id().to_string(),
            message: status.message,
        })
    }
}
