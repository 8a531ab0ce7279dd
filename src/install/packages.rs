// file: src/install/packages.rs
// version: 1.0.0
// guid: 71f5c2a8-94d0-4e6b-a317-58b09cd4e2f6

//! Package-manager provisioning path
//!
//! Installs prerequisites and the daemon package. When the daemon package is
//! not present in the configured sources, a known third-party repository is
//! added best-effort first; the install is then retried from whatever
//! sources exist. Repo-add failure is never fatal on its own.

use crate::network::NetworkDownloader;
use crate::paths;
use crate::steps::StepOutcome;
use crate::system::detect::{HostProfile, PackageManager};
use crate::system::CommandRunner;
use crate::Result;
use tracing::{info, warn};

/// Daemon package name in both supported families
pub const DAEMON_PACKAGE: &str = "incus";

const APT_PREREQS: &[&str] = &["curl", "ca-certificates", "gnupg"];
const DNF_PREREQS: &[&str] = &["curl", "ca-certificates"];

const ZABBLY_KEY_URL: &str = "https://pkgs.zabbly.com/key.asc";
const ZABBLY_APT_URL: &str = "https://pkgs.zabbly.com/incus/stable";

const NONINTERACTIVE: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

/// Install the daemon through the host's native package manager
pub async fn install(
    profile: &HostProfile,
    runner: &CommandRunner,
    downloader: &NetworkDownloader,
) -> Result<()> {
    match profile.pkg {
        PackageManager::Apt => install_apt(profile, runner, downloader).await,
        PackageManager::Dnf | PackageManager::Yum => install_dnf(profile, runner).await,
    }
}

async fn install_apt(
    profile: &HostProfile,
    runner: &CommandRunner,
    downloader: &NetworkDownloader,
) -> Result<()> {
    info!("Installing prerequisites via apt");
    runner.run_env("apt-get", &["update"], NONINTERACTIVE).await?;

    let mut args = vec!["install", "-y"];
    args.extend_from_slice(APT_PREREQS);
    runner.run_env("apt-get", &args, NONINTERACTIVE).await?;

    if !package_available_apt(runner).await {
        let outcome = add_apt_repo(profile, runner, downloader).await;
        match &outcome {
            StepOutcome::Completed => info!("Added third-party package repository"),
            other => warn!("Could not add package repository: {}", other),
        }
        runner.log().status(&retry_status(&outcome))?;
    }

    runner
        .run_env("apt-get", &["install", "-y", DAEMON_PACKAGE], NONINTERACTIVE)
        .await
}

async fn install_dnf(profile: &HostProfile, runner: &CommandRunner) -> Result<()> {
    let pkg = profile.pkg.command();
    info!("Installing prerequisites via {}", pkg);

    let mut args = vec!["install", "-y"];
    args.extend_from_slice(DNF_PREREQS);
    runner.run(pkg, &args).await?;

    if !runner.check(pkg, &["info", DAEMON_PACKAGE]).await {
        let outcome = add_dnf_repo(profile, runner).await;
        match &outcome {
            StepOutcome::Completed => info!("Added third-party package repository"),
            other => warn!("Could not add package repository: {}", other),
        }
        runner.log().status(&retry_status(&outcome))?;
    }

    runner.run(pkg, &["install", "-y", DAEMON_PACKAGE]).await
}

/// Does apt already know the daemon package from its configured sources?
async fn package_available_apt(runner: &CommandRunner) -> bool {
    runner.check("apt-cache", &["show", DAEMON_PACKAGE]).await
}

/// Fetch the signing key and write a deb822 source definition scoped to the
/// detected release codename and host architecture. Best-effort.
async fn add_apt_repo(
    profile: &HostProfile,
    runner: &CommandRunner,
    downloader: &NetworkDownloader,
) -> StepOutcome {
    let Some(codename) = profile.codename.as_deref() else {
        return StepOutcome::skipped("no release codename detected");
    };

    if let Err(e) = std::fs::create_dir_all("/etc/apt/keyrings") {
        return StepOutcome::failed(format!("keyring dir: {}", e));
    }
    if let Err(e) = downloader.download(ZABBLY_KEY_URL, paths::APT_KEYRING_FILE).await {
        return StepOutcome::failed(format!("signing key fetch: {}", e));
    }

    let definition = apt_source_definition(codename, profile.arch.as_str());
    if let Err(e) = std::fs::write(paths::APT_SOURCE_FILE, definition) {
        return StepOutcome::failed(format!("source definition: {}", e));
    }
    let _ = runner.log().status(&format!("wrote {}", paths::APT_SOURCE_FILE));

    runner
        .run_soft_env("apt-get", &["update"], NONINTERACTIVE)
        .await
}

/// Write a `.repo` definition for dnf/yum hosts. Best-effort.
async fn add_dnf_repo(profile: &HostProfile, runner: &CommandRunner) -> StepOutcome {
    if let Err(e) = std::fs::write(paths::DNF_REPO_FILE, dnf_repo_definition()) {
        return StepOutcome::failed(format!("repo definition: {}", e));
    }
    let _ = runner.log().status(&format!("wrote {}", paths::DNF_REPO_FILE));

    // Refresh with whichever strategy the host actually has; yum hosts by
    // definition have no dnf.
    runner.run_soft(profile.pkg.command(), &["makecache"]).await
}

/// Status line recorded before the install retry, reflecting how the repo
/// add actually went
fn retry_status(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Completed => "retrying daemon install from updated sources".to_string(),
        other => format!(
            "repo add {}; retrying daemon install from existing sources",
            other
        ),
    }
}

fn apt_source_definition(codename: &str, arch: &str) -> String {
    format!(
        "Enabled: yes\n\
         Types: deb\n\
         URIs: {}\n\
         Suites: {}\n\
         Components: main\n\
         Architectures: {}\n\
         Signed-By: {}\n",
        ZABBLY_APT_URL,
        codename,
        arch,
        paths::APT_KEYRING_FILE
    )
}

fn dnf_repo_definition() -> String {
    format!(
        "[zabbly-incus]\n\
         name=Zabbly Incus stable\n\
         baseurl={}\n\
         enabled=1\n\
         gpgcheck=1\n\
         gpgkey={}\n",
        ZABBLY_APT_URL,
        ZABBLY_KEY_URL
    )
}
