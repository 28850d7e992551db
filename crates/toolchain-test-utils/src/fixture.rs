//! [`ToolFixture`] builder for orchestration test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use toolchain_core::config::DEFAULT_SCRIPT;
use toolchain_core::{EnvironmentMap, INSTALL_ROOT_VAR, ToolPaths};

/// A temporary install root with a management script and fake tools.
///
/// # Example
///
/// ```rust,no_run
/// use toolchain_test_utils::ToolFixture;
///
/// let fixture = ToolFixture::new().with_script("echo done");
/// let git = fixture.fake_tool("git");
/// let paths = fixture.paths().with_version_control(git);
/// ```
pub struct ToolFixture {
    temp_dir: TempDir,
}

impl Default for ToolFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolFixture {
    /// Create an empty install root.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the temporary install tree.
    pub fn install_root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path the management script is written to.
    pub fn script_path(&self) -> PathBuf {
        self.install_root().join(DEFAULT_SCRIPT)
    }

    /// Write `body` as the management script.
    ///
    /// Tests run the script with `/bin/sh` as the interpreter, so the body is
    /// shell. Arguments after the script path arrive as `$1`, `$2`, ...
    pub fn with_script(self, body: &str) -> Self {
        let path = self.script_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("{body}\n")).unwrap();
        self
    }

    /// Create an executable stub named `name` under `<root>/bin` and return its path.
    pub fn fake_tool(&self, name: &str) -> PathBuf {
        let dir = self.install_root().join("bin");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    /// `/bin/sh` as interpreter and this fixture as install root.
    pub fn paths(&self) -> ToolPaths {
        ToolPaths::new("/bin/sh", self.install_root())
    }

    /// Minimal child environment: system binaries on `PATH` and the install root set.
    pub fn environment(&self) -> EnvironmentMap {
        EnvironmentMap::new()
            .with("PATH", "/usr/bin:/bin")
            .with(INSTALL_ROOT_VAR, self.install_root().to_string_lossy())
    }

    /// Assert that `relative` exists under the install root.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.install_root().join(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }
}
