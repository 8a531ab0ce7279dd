// file: src/uninstall/mod.rs
// version: 1.0.0
// guid: 2b85f4d9-60c3-47ae-91d5-c04e83b61f72

//! Best-effort removal of everything the install flow created
//!
//! Every step swallows its own failure and proceeds to the next. Total
//! removal is aspirational; the durable log is the authoritative record of
//! what actually happened. The flow as a whole always reports success.

use crate::paths;
use crate::steps::StepOutcome;
use crate::system::detect::{HostProfile, PackageManager};
use crate::system::CommandRunner;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Filesystem locations the uninstaller touches; overridable for tests
#[derive(Debug, Clone)]
pub struct RemovalPaths {
    pub compiled_binary: PathBuf,
    pub unit_dir: PathBuf,
    pub client_key: PathBuf,
    pub client_cert: PathBuf,
    pub backup_dir: PathBuf,
    pub apt_source: PathBuf,
    pub apt_keyring: PathBuf,
    pub dnf_repo: PathBuf,
    pub data_dirs: Vec<PathBuf>,
}

impl Default for RemovalPaths {
    fn default() -> Self {
        Self {
            compiled_binary: paths::COMPILED_BINARY.into(),
            unit_dir: "/etc/systemd/system".into(),
            client_key: paths::CLIENT_KEY.into(),
            client_cert: paths::CLIENT_CERT.into(),
            backup_dir: paths::BACKUP_DIR.into(),
            apt_source: paths::APT_SOURCE_FILE.into(),
            apt_keyring: paths::APT_KEYRING_FILE.into(),
            dnf_repo: paths::DNF_REPO_FILE.into(),
            data_dirs: vec!["/var/lib/incus".into(), "/etc/incus".into()],
        }
    }
}

/// Run the uninstall flow. Infallible by design: each step's outcome is
/// returned for the summary, and the process exits zero regardless.
pub async fn uninstall(
    profile: &HostProfile,
    runner: &CommandRunner,
    removal: &RemovalPaths,
) -> Vec<(&'static str, StepOutcome)> {
    let mut outcomes = Vec::new();
    let mut record = |name: &'static str, outcome: StepOutcome| {
        match &outcome {
            StepOutcome::Completed => info!("{}: done", name),
            StepOutcome::Skipped(reason) => info!("{}: skipped ({})", name, reason),
            StepOutcome::Failed(reason) => warn!("{}: failed ({})", name, reason),
        }
        outcomes.push((name, outcome));
    };

    record("stop service", stop_service(runner).await);
    record("remove packages", remove_packages(profile, runner).await);
    record(
        "remove compiled binary",
        remove_file(&removal.compiled_binary),
    );
    record(
        "remove unit files",
        remove_unit_files(runner, &removal.unit_dir).await,
    );
    record(
        "remove credentials",
        remove_credentials(removal),
    );
    record("remove package sources", remove_repo_definitions(removal));
    record("remove data directories", remove_data_dirs(&removal.data_dirs));

    outcomes
}

async fn stop_service(runner: &CommandRunner) -> StepOutcome {
    // Same lookup the activator used, so a fallback unit such as
    // incus-lts.service is torn down too
    let Some(unit) = crate::install::service::find_registered_unit(runner).await else {
        return StepOutcome::skipped("no matching service unit");
    };
    runner
        .run_soft("systemctl", &["disable", "--now", &unit])
        .await
}

async fn remove_packages(profile: &HostProfile, runner: &CommandRunner) -> StepOutcome {
    match profile.pkg {
        PackageManager::Apt => {
            runner
                .run_soft_env(
                    "apt-get",
                    &["purge", "-y", "incus"],
                    &[("DEBIAN_FRONTEND", "noninteractive")],
                )
                .await
        }
        PackageManager::Dnf | PackageManager::Yum => {
            runner
                .run_soft(profile.pkg.command(), &["remove", "-y", "incus"])
                .await
        }
    }
}

async fn remove_unit_files(runner: &CommandRunner, unit_dir: &Path) -> StepOutcome {
    let mut removed = 0;
    for name in ["incus.service", "incus.socket"] {
        let unit = unit_dir.join(name);
        if unit.exists() {
            match std::fs::remove_file(&unit) {
                Ok(()) => removed += 1,
                Err(e) => return StepOutcome::failed(format!("{}: {}", unit.display(), e)),
            }
        }
    }
    if removed == 0 {
        return StepOutcome::skipped("no unit files installed");
    }

    runner.run_soft("systemctl", &["daemon-reload"]).await
}

/// Credentials are backed up before removal, like everywhere else
fn remove_credentials(removal: &RemovalPaths) -> StepOutcome {
    let mut touched = false;
    for path in [&removal.client_key, &removal.client_cert] {
        match paths::backup_file(path, &removal.backup_dir) {
            Ok(Some(_)) => {
                if let Err(e) = std::fs::remove_file(path) {
                    return StepOutcome::failed(format!("{}: {}", path.display(), e));
                }
                touched = true;
            }
            Ok(None) => {}
            Err(e) => return StepOutcome::failed(format!("backup {}: {}", path.display(), e)),
        }
    }
    if touched {
        StepOutcome::Completed
    } else {
        StepOutcome::skipped("no credentials present")
    }
}

fn remove_repo_definitions(removal: &RemovalPaths) -> StepOutcome {
    let mut touched = false;
    for path in [&removal.apt_source, &removal.apt_keyring, &removal.dnf_repo] {
        if path.exists() {
            match std::fs::remove_file(path) {
                Ok(()) => touched = true,
                Err(e) => return StepOutcome::failed(format!("{}: {}", path.display(), e)),
            }
        }
    }
    if touched {
        StepOutcome::Completed
    } else {
        StepOutcome::skipped("no repo definitions present")
    }
}

fn remove_data_dirs(dirs: &[PathBuf]) -> StepOutcome {
    let mut touched = false;
    for dir in dirs {
        if dir.exists() {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => touched = true,
                Err(e) => return StepOutcome::failed(format!("{}: {}", dir.display(), e)),
            }
        }
    }
    if touched {
        StepOutcome::Completed
    } else {
        StepOutcome::skipped("no data directories present")
    }
}

fn remove_file(path: &Path) -> StepOutcome {
    if !path.exists() {
        return StepOutcome::skipped("not present");
    }
    match std::fs::remove_file(path) {
        Ok(()) => StepOutcome::Completed,
        Err(e) => StepOutcome::failed(e.to_string()),
    }
}
