// file: src/install/service.rs
// version: 1.0.0
// guid: 86b4d1f0-5e39-4a72-bc86-941e0d72a5c8

//! Service activation and readiness polling
//!
//! Some distributions run the daemon unmanaged, so a missing unit is a
//! warning, not a failure. After activation the daemon's version command is
//! polled on a fixed budget; exhaustion is logged since later steps re-check
//! responsiveness on their own.

use crate::steps::StepOutcome;
use crate::system::CommandRunner;
use crate::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Daemon identifier searched for among registered units
const DAEMON_NAME: &str = "incus";

const PREFERRED_UNIT: &str = "incus.service";

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const POLL_ATTEMPTS: u32 = 12;

/// Enable and start the daemon's unit, if one is registered
pub async fn activate(runner: &CommandRunner) -> Result<StepOutcome> {
    let Some(listing) = unit_listing(runner).await else {
        warn!("systemctl not usable on this host, leaving service unmanaged");
        return Ok(StepOutcome::skipped("systemctl unavailable"));
    };

    let Some(unit) = select_unit(&listing) else {
        warn!(
            "No unit matching `{}` registered, daemon may run unmanaged",
            DAEMON_NAME
        );
        return Ok(StepOutcome::skipped("no matching service unit"));
    };

    info!("Enabling and starting {}", unit);
    runner.run("systemctl", &["enable", "--now", &unit]).await?;
    Ok(StepOutcome::Completed)
}

/// Poll the daemon's version command until it answers or the attempt budget
/// runs out. Returns the reported version when responsive.
pub async fn wait_ready(runner: &CommandRunner) -> Option<String> {
    poll_version(runner, DAEMON_NAME, &["--version"], POLL_INTERVAL, POLL_ATTEMPTS).await
}

async fn poll_version(
    runner: &CommandRunner,
    program: &str,
    args: &[&str],
    interval: Duration,
    attempts: u32,
) -> Option<String> {
    for attempt in 1..=attempts {
        if let Some(version) = runner.capture_soft(program, args).await {
            info!("Daemon responding (version {})", version);
            return Some(version);
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    warn!(
        "Daemon did not respond after {} attempts, continuing anyway",
        attempts
    );
    None
}

/// The unit this tool manages, looked up the same way activation does.
/// Used by the uninstaller so teardown targets whatever install activated.
pub async fn find_registered_unit(runner: &CommandRunner) -> Option<String> {
    select_unit(&unit_listing(runner).await?)
}

async fn unit_listing(runner: &CommandRunner) -> Option<String> {
    runner
        .capture_soft(
            "systemctl",
            &["list-unit-files", "--type=service", "--no-legend", "--no-pager"],
        )
        .await
}

/// Pick the unit to activate: the exact daemon unit when registered, else
/// the first registered unit containing the daemon's identifier.
pub(crate) fn select_unit(listing: &str) -> Option<String> {
    let units: Vec<&str> = listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();

    if units.contains(&PREFERRED_UNIT) {
        return Some(PREFERRED_UNIT.to_string());
    }
    units
        .iter()
        .find(|unit| unit.contains(DAEMON_NAME))
        .map(|unit| unit.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::DurableLog;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn runner(dir: &TempDir) -> CommandRunner {
        let log = DurableLog::open(dir.path().join("run.log")).unwrap();
        CommandRunner::new(Arc::new(log), false)
    }

    #[test]
    fn test_select_exact_unit() {
        let listing = "cron.service enabled\nincus.service disabled\nincus-lts.service enabled\n";
        assert_eq!(select_unit(listing).as_deref(), Some("incus.service"));
    }

    #[test]
    fn test_select_first_containing_match() {
        let listing = "cron.service enabled\nincus-agent.service static\nincus-lts.service enabled\n";
        assert_eq!(select_unit(listing).as_deref(), Some("incus-agent.service"));
    }

    #[test]
    fn test_select_none_when_no_match() {
        let listing = "cron.service enabled\nsshd.service enabled\n";
        assert!(select_unit(listing).is_none());
    }

    #[test]
    fn test_select_none_on_empty_listing() {
        assert!(select_unit("").is_none());
    }

    #[tokio::test]
    async fn test_poll_returns_version_when_responsive() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);

        let version = poll_version(
            &runner,
            "sh",
            &["-c", "echo 6.0.0"],
            Duration::from_millis(1),
            3,
        )
        .await;
        assert_eq!(version.as_deref(), Some("6.0.0"));
    }

    #[tokio::test]
    async fn test_poll_exhausts_budget_without_hanging() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);

        let version = poll_version(&runner, "false", &[], Duration::from_millis(1), 3).await;
        assert!(version.is_none());

        // All three attempts must appear in the durable log
        let content = std::fs::read_to_string(runner.log().path()).unwrap();
        assert_eq!(content.matches("+ false").count(), 3);
    }
}
