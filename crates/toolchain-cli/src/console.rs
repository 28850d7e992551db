//! Terminal output: script progress on stdout, errors on stderr

use colored::Colorize;
use toolchain_core::{EnvironmentMap, Reporter, SelectionRequest};

/// Writes orchestrator output to the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn println(&self, line: &str) {
        println!("{}", line);
    }

    fn print_error(&self, text: &str) {
        eprintln!("{}", text.red());
    }
}

/// `KEY=VALUE` lines, sorted by key
pub fn render_environment(env: &EnvironmentMap) -> String {
    env.iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}

/// Human-readable summary of discovery results
pub fn render_discovery(request: &SelectionRequest, version_control_tool: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {}\n",
        "interpreter:".bold(),
        display_or_missing(request.interpreter.as_deref())
    ));
    for (version, path) in &request.interpreter_versions {
        out.push_str(&format!("  {} {}\n", version.cyan(), path.display()));
    }
    out.push_str(&format!(
        "{:<12} {}\n",
        format!("{}:", version_control_tool).bold(),
        display_or_missing(request.version_control.as_deref())
    ));
    out.push_str(&format!(
        "{:<12} {}\n",
        "IDF_PATH:".bold(),
        display_or_missing(request.install_root.as_deref())
    ));
    out
}

fn display_or_missing(path: Option<&std::path::Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "not found".yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_environment_sorted() {
        let env = EnvironmentMap::new().with("PATH", "/opt/bin").with("IDF_PATH", "/opt/idf");
        assert_eq!(render_environment(&env), "IDF_PATH=/opt/idf\nPATH=/opt/bin\n");
    }

    #[test]
    fn test_render_discovery_marks_missing() {
        colored::control::set_override(false);
        let request = SelectionRequest {
            command_id: "tools.locate".into(),
            interpreter: Some(PathBuf::from("/usr/bin/python3")),
            install_root: None,
            ..SelectionRequest::default()
        };

        let text = render_discovery(&request, "git");

        assert!(text.contains("/usr/bin/python3"));
        assert!(text.contains("git:"));
        assert_eq!(text.matches("not found").count(), 2);
    }
}
