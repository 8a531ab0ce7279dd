// file: src/config/mod.rs
// version: 1.0.0
// guid: b6f03a84-5c17-4de9-a2b8-90e64d7c15f3

//! Run configuration structures

use serde::{Deserialize, Serialize};

/// Host CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    /// Detect the architecture of the running host
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "aarch64" => Architecture::Arm64,
            _ => Architecture::Amd64,
        }
    }

    /// Debian-style architecture string, as used in apt sources
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
        }
    }

    /// Architecture component of Go toolchain release file names
    pub fn go_arch(&self) -> &'static str {
        self.as_str()
    }
}

/// Immutable run configuration, constructed once from CLI arguments and
/// passed by reference to every component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Skip confirmation prompts
    pub assume_yes: bool,
    /// Run the daemon's one-time auto-initialization after install
    pub run_init: bool,
    /// Storage backend passed to `incus admin init --auto`
    pub storage_backend: Option<String>,
    /// Project to create after initialization
    pub project: Option<String>,
    /// Git URL for the compile-from-source path
    pub git_url: String,
    /// Git reference to checkout; also opts into the compile path
    pub git_ref: Option<String>,
    /// Mirror command output live to the console
    pub stream_console: bool,
    /// Suppress non-error console output
    pub quiet: bool,
    /// Emit the install summary as JSON
    pub json: bool,
}

impl RunConfig {
    /// Default daemon source tree
    pub const DEFAULT_GIT_URL: &'static str = "https://github.com/lxc/incus.git";

    /// True when the compile-from-source path was requested explicitly
    pub fn wants_source_build(&self) -> bool {
        self.git_ref.is_some() || self.git_url != Self::DEFAULT_GIT_URL
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            assume_yes: false,
            run_init: true,
            storage_backend: None,
            project: None,
            git_url: Self::DEFAULT_GIT_URL.to_string(),
            git_ref: None,
            stream_console: false,
            quiet: false,
            json: false,
        }
    }
}
