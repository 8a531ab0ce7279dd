// file: src/cli/commands.rs
// version: 1.0.0
// guid: e64a08d2-5b97-4c31-bd80-f52a91c6e037

//! Command implementations for the CLI

use crate::config::RunConfig;
use crate::install;
use crate::paths;
use crate::system::{self, CommandRunner, DurableLog};
use crate::uninstall::{self, RemovalPaths};
use crate::update;
use crate::{ProvisionError, Result};
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use tracing::info;

/// Install the daemon, activate its service, initialize it, and issue a
/// client certificate
pub async fn install_command(config: &RunConfig) -> Result<()> {
    require_root("install")?;
    if !confirm(config, "Install the Incus daemon on this host?")? {
        info!("Install cancelled");
        return Ok(());
    }

    let profile = system::detect()?;
    let runner = make_runner(config)?;
    runner.log().status("install flow started")?;

    let report = install::install(config, &profile, &runner).await?;

    runner.log().status("install flow finished")?;
    report.print(config.json)?;
    Ok(())
}

/// Remove the daemon and everything the install flow created. Best-effort:
/// always succeeds overall.
pub async fn uninstall_command(config: &RunConfig) -> Result<()> {
    require_root("uninstall")?;
    if !confirm(config, "Remove the Incus daemon and its data from this host?")? {
        info!("Uninstall cancelled");
        return Ok(());
    }

    let profile = system::detect()?;
    let runner = make_runner(config)?;
    runner.log().status("uninstall flow started")?;

    let outcomes = uninstall::uninstall(&profile, &runner, &RemovalPaths::default()).await;
    for (name, outcome) in &outcomes {
        runner.log().status(&format!("uninstall {}: {}", name, outcome))?;
    }

    runner.log().status("uninstall flow finished")?;
    info!("Uninstall finished; see {} for details", paths::LOG_FILE);
    Ok(())
}

/// Replace this installer with the latest release build
pub async fn update_command(_config: &RunConfig) -> Result<()> {
    let log = DurableLog::open(paths::LOG_FILE)?;
    let backup = update::self_update(&log).await?;
    info!(
        "Previous installer kept at {}; re-run to use the new version",
        backup.display()
    );
    Ok(())
}

fn require_root(action: &str) -> Result<()> {
    if system::is_root() {
        return Ok(());
    }
    Err(ProvisionError::permission(format!(
        "{} must run as root",
        action
    )))
}

fn make_runner(config: &RunConfig) -> Result<CommandRunner> {
    let log = DurableLog::open(paths::LOG_FILE)?;
    Ok(CommandRunner::new(Arc::new(log), config.stream_console))
}

/// Ask for confirmation on a terminal; `--yes` and non-interactive contexts
/// proceed without asking.
fn confirm(config: &RunConfig, question: &str) -> Result<bool> {
    if config.assume_yes || !std::io::stdin().is_terminal() {
        return Ok(true);
    }

    print!("{} [y/N]: ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
