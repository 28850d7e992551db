//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use toolchain_core::ToolsAction;

/// Toolchain manager - install and maintain build tools through the management script
#[derive(Parser, Debug)]
#[command(name = "toolchain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to <config dir>/toolchain/config.toml)
    #[arg(long, global = true, env = "TOOLCHAIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interpreter executable, overrides discovery
    #[arg(long, global = true)]
    pub python: Option<PathBuf>,

    /// Version-control executable, overrides discovery
    #[arg(long, global = true)]
    pub git: Option<PathBuf>,

    /// Install root, overrides the IDF_PATH environment variable
    #[arg(long, global = true)]
    pub idf_path: Option<PathBuf>,

    /// Kill the script after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show discovered interpreter, version-control tool and install root
    Locate {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Install tools, all of them when none are named
    ///
    /// Examples:
    ///   toolchain install               # Everything the install root requires
    ///   toolchain install cmake ninja   # Only these tools
    Install {
        /// Tools to install
        tools: Vec<String>,
    },

    /// Create the interpreter virtual environment
    InstallPythonEnv,

    /// List tools and their install state
    List,

    /// Print the environment needed to use the installed tools as KEY=VALUE lines
    Export,

    /// Pass arguments to the management script unchanged
    ///
    /// Example:
    ///   toolchain run -- download --platform linux-amd64
    Run {
        /// Arguments for the script
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
}

impl Commands {
    /// Script action behind this command; `None` for commands that run nothing
    pub fn action(&self) -> Option<ToolsAction> {
        match self {
            Commands::Locate { .. } => None,
            Commands::Install { tools } => Some(ToolsAction::Install { tools: tools.clone() }),
            Commands::InstallPythonEnv => Some(ToolsAction::InstallPythonEnv),
            Commands::List => Some(ToolsAction::List),
            Commands::Export => Some(ToolsAction::Export),
            Commands::Run { args } => Some(ToolsAction::Run { args: args.clone() }),
        }
    }
}
