//! Non-interactive path selection from command-line flags

use std::path::PathBuf;

use colored::Colorize;
use toolchain_core::{PathSelector, Selection, SelectionRequest, ToolPaths};
use tracing::debug;

/// Confirms discovered paths, letting explicit flags win.
///
/// With several interpreter versions and no `--python` flag the choice is
/// ambiguous: the versions are listed and selection is cancelled.
#[derive(Debug, Clone, Default)]
pub struct FlagSelector {
    pub python: Option<PathBuf>,
    pub git: Option<PathBuf>,
    pub idf_path: Option<PathBuf>,
}

impl FlagSelector {
    /// Resolve the final paths, or `None` when the interpreter choice is ambiguous
    pub fn choose(&self, request: &SelectionRequest) -> Option<ToolPaths> {
        let interpreter = match (&self.python, &request.interpreter) {
            (Some(flag), _) => flag.clone(),
            (None, Some(found)) => found.clone(),
            (None, None) if request.interpreter_versions.len() > 1 => return None,
            (None, None) => PathBuf::new(),
        };

        let install_root = self
            .idf_path
            .clone()
            .or_else(|| request.install_root.clone())
            .unwrap_or_default();

        let mut paths = ToolPaths::new(interpreter, install_root);
        paths.version_control = self.git.clone().or_else(|| request.version_control.clone());
        Some(paths)
    }
}

impl PathSelector for FlagSelector {
    fn select(&self, request: &SelectionRequest) -> Selection {
        match self.choose(request) {
            Some(paths) => {
                debug!(?paths, "Paths confirmed");
                Selection::Confirmed(paths)
            }
            None => {
                eprintln!(
                    "{} several interpreter versions found, pass one with {}:",
                    "note:".yellow().bold(),
                    "--python".cyan()
                );
                for (version, path) in &request.interpreter_versions {
                    eprintln!("  {} {}", version, path.display());
                }
                Selection::Cancelled
            }
        }
    }
}
