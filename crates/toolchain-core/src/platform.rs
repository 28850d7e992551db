//! Host platform conventions for executable lookup

/// Operating system family the process runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
    Other,
}

/// Canonical name of the executable search-path variable
pub const CANONICAL_PATH_KEY: &str = "PATH";

impl HostOs {
    /// Detect the platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }

    pub fn is_windows(self) -> bool {
        self == HostOs::Windows
    }

    /// Separator between entries of the search-path variable
    pub fn path_list_separator(self) -> char {
        match self {
            HostOs::Windows => ';',
            _ => ':',
        }
    }

    /// Spellings of the search-path variable, in lookup priority order
    pub fn search_path_keys(self) -> &'static [&'static str] {
        match self {
            HostOs::Windows => &["PATH", "Path"],
            _ => &["PATH"],
        }
    }

    /// File name of an executable with the platform suffix applied
    pub fn executable_name(self, name: &str) -> String {
        if self.is_windows() && !name.to_ascii_lowercase().ends_with(".exe") {
            format!("{}.exe", name)
        } else {
            name.to_string()
        }
    }
}
