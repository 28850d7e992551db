//! Runner configuration loaded from TOML
//!
//! ```toml
//! script = "tools/idf_tools.py"
//! version_control_tool = "git"
//! timeout_secs = 1800
//! path_separator = ";"
//! search_dirs = ["/opt/git/bin"]
//! working_dir = "/"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::EnvironmentBuilder;
use crate::error::{Error, Result};
use crate::orchestrator::InvocationOrchestrator;
use crate::platform::HostOs;
use crate::reporter::Reporter;
use crate::runner::TokioProcessRunner;

/// Management script path relative to the install root
pub const DEFAULT_SCRIPT: &str = "tools/idf_tools.py";

/// Version-control executable looked up by default
pub const DEFAULT_VERSION_CONTROL_TOOL: &str = "git";

const CONFIG_DIR: &str = "toolchain";
const CONFIG_FILE: &str = "config.toml";

/// Settings for discovery and process execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Management script relative to the install root
    pub script: PathBuf,
    /// Name of the version-control executable
    pub version_control_tool: String,
    /// Kill the child after this many seconds
    pub timeout_secs: Option<u64>,
    /// Override for the search-path list separator
    pub path_separator: Option<char>,
    /// Extra directories searched for executables
    pub search_dirs: Vec<PathBuf>,
    /// Working directory for the child process
    pub working_dir: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from(DEFAULT_SCRIPT),
            version_control_tool: DEFAULT_VERSION_CONTROL_TOOL.to_string(),
            timeout_secs: None,
            path_separator: None,
            search_dirs: Vec::new(),
            working_dir: None,
        }
    }
}

impl ToolsConfig {
    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::config(path, e.to_string()))?;
        Self::parse(&content).map_err(|message| Error::config(path, message))
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load `explicit` if given, else the user config file if it exists, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Loading user configuration");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Environment builder for `host`, honouring the separator override
    pub fn environment_builder(&self, host: HostOs) -> EnvironmentBuilder {
        let builder = EnvironmentBuilder::for_host(host);
        match self.path_separator {
            Some(separator) => builder.with_separator(separator),
            None => builder,
        }
    }

    /// Process runner honouring the timeout
    pub fn runner(&self) -> TokioProcessRunner {
        TokioProcessRunner::new().with_timeout(self.timeout())
    }

    /// Orchestrator wired with this configuration and a tokio runner
    pub fn orchestrator(&self, host: HostOs, reporter: Arc<dyn Reporter>) -> InvocationOrchestrator {
        InvocationOrchestrator::new(Arc::new(self.runner()), reporter)
            .with_environment_builder(self.environment_builder(host))
            .with_script(&self.script)
    }
}

/// `<config dir>/toolchain/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
