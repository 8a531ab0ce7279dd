// file: src/cli/args.rs
// version: 1.0.0
// guid: b17e4c90-6da5-43f8-82b0-59c3f7a16d24

//! Command line argument definitions

use crate::config::RunConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "incus-provision")]
#[command(about = "Provision, remove, and self-update the Incus daemon on this host")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Answer yes to every prompt (non-interactive mode)
    #[arg(short = 'y', long = "yes", global = true)]
    pub assume_yes: bool,

    /// Skip the daemon's one-time initialization after install
    #[arg(long, global = true)]
    pub no_init: bool,

    /// Storage backend passed to the daemon's auto-initialization
    #[arg(long, value_name = "NAME", global = true)]
    pub backend: Option<String>,

    /// Project to create after initialization
    #[arg(long, value_name = "NAME", global = true)]
    pub project: Option<String>,

    /// Daemon source repository for the compile-from-source path
    #[arg(
        long,
        value_name = "URL",
        global = true,
        default_value = RunConfig::DEFAULT_GIT_URL,
        value_parser = parse_git_url
    )]
    pub git_url: String,

    /// Git reference to build; selects the compile-from-source path
    #[arg(long, value_name = "REF", global = true)]
    pub git_ref: Option<String>,

    /// Emit the install summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Mirror command output live to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error console output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Install the daemon and issue a client certificate
    Install,

    /// Remove the daemon, its packages, and everything this tool created
    Uninstall,

    /// Replace this installer with the latest release build
    Update,
}

/// Reject malformed repository URLs at parse time (exit 2)
fn parse_git_url(value: &str) -> std::result::Result<String, String> {
    url::Url::parse(value)
        .map(|_| value.to_string())
        .map_err(|e| format!("invalid git URL: {}", e))
}

impl Cli {
    /// Freeze the parsed flags into the immutable run configuration
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            assume_yes: self.assume_yes,
            run_init: !self.no_init,
            storage_backend: self.backend.clone(),
            project: self.project.clone(),
            git_url: self.git_url.clone(),
            git_ref: self.git_ref.clone(),
            stream_console: self.verbose,
            quiet: self.quiet,
            json: self.json,
        }
    }
}
