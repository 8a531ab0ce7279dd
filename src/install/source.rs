// file: src/install/source.rs
// version: 1.0.0
// guid: 39a0e7d5-c264-4f18-b95a-80d13e6f24c7

//! Compile-from-source provisioning path
//!
//! Ensures a Go toolchain (packages first, then a pinned upstream release),
//! clones the daemon source at a fixed location, checks out the configured
//! reference, builds with the project's own tooling when present, and
//! installs any service units shipped in the tree. Fatal only when the
//! daemon binary is still unresolvable afterwards.

use crate::config::{Architecture, RunConfig};
use crate::network::NetworkDownloader;
use crate::paths;
use crate::steps::StepOutcome;
use crate::system::detect::{HostProfile, PackageManager};
use crate::system::CommandRunner;
use crate::{ProvisionError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Pinned toolchain release used when no packaged Go is available
const GO_VERSION: &str = "go1.22.5";

const GO_INSTALL_ROOT: &str = "/usr/local";
const GO_BINARY: &str = "/usr/local/go/bin/go";

/// Build target used when the tree ships no Makefile
const BUILD_TARGET: &str = "./cmd/incusd";

const UNIT_DIR: &str = "/etc/systemd/system";

/// Build and install the daemon from source
pub async fn install(
    config: &RunConfig,
    profile: &HostProfile,
    runner: &CommandRunner,
    downloader: &NetworkDownloader,
) -> Result<()> {
    let go = ensure_toolchain(profile, runner, downloader).await?;

    clone_or_update(config, runner).await?;

    if let Some(git_ref) = config.git_ref.as_deref() {
        match runner
            .run_soft("git", &["-C", paths::SOURCE_DIR, "checkout", git_ref])
            .await
        {
            StepOutcome::Completed => info!("Checked out {}", git_ref),
            outcome => warn!(
                "Checkout of {} failed, continuing on default branch: {}",
                git_ref, outcome
            ),
        }
    }

    build(&go, runner).await?;
    install_unit_files(Path::new(paths::SOURCE_DIR), runner).await;

    // The whole path is pointless if nothing ended up resolvable
    if resolve_daemon_binary().is_none() {
        return Err(ProvisionError::provision(
            "daemon binary not found on PATH after source build",
        ));
    }
    Ok(())
}

/// Locate the built daemon on the command search path
pub fn resolve_daemon_binary() -> Option<PathBuf> {
    which::which("incusd")
        .or_else(|_| which::which("incus"))
        .ok()
        .or_else(|| {
            let compiled = PathBuf::from(paths::COMPILED_BINARY);
            compiled.exists().then_some(compiled)
        })
}

/// Find a usable `go`, installing one if necessary
async fn ensure_toolchain(
    profile: &HostProfile,
    runner: &CommandRunner,
    downloader: &NetworkDownloader,
) -> Result<String> {
    if which::which("go").is_ok() {
        return Ok("go".to_string());
    }

    info!("Go toolchain not found, trying packages");
    let package = match profile.pkg {
        PackageManager::Apt => "golang-go",
        PackageManager::Dnf | PackageManager::Yum => "golang",
    };
    let outcome = match profile.pkg {
        PackageManager::Apt => {
            runner
                .run_soft_env(
                    "apt-get",
                    &["install", "-y", package],
                    &[("DEBIAN_FRONTEND", "noninteractive")],
                )
                .await
        }
        _ => {
            runner
                .run_soft(profile.pkg.command(), &["install", "-y", package])
                .await
        }
    };

    if outcome.is_completed() && which::which("go").is_ok() {
        return Ok("go".to_string());
    }

    info!("Fetching pinned {} release", GO_VERSION);
    let url = toolchain_url(profile.arch);
    let tarball = std::env::temp_dir().join(format!("{}.tar.gz", GO_VERSION));
    downloader
        .download_with_progress(&url, &tarball)
        .await?;
    runner
        .run(
            "tar",
            &["-C", GO_INSTALL_ROOT, "-xzf", &tarball.to_string_lossy()],
        )
        .await?;

    Ok(GO_BINARY.to_string())
}

async fn clone_or_update(config: &RunConfig, runner: &CommandRunner) -> Result<()> {
    if Path::new(paths::SOURCE_DIR).join(".git").exists() {
        info!("Source tree present, fetching updates");
        match runner
            .run_soft("git", &["-C", paths::SOURCE_DIR, "fetch", "--all"])
            .await
        {
            StepOutcome::Completed => {}
            outcome => warn!("Fetch failed, building from existing tree: {}", outcome),
        }
        return Ok(());
    }

    info!("Cloning {} into {}", config.git_url, paths::SOURCE_DIR);
    runner
        .run("git", &["clone", &config.git_url, paths::SOURCE_DIR])
        .await
}

/// Use the project's own build tooling when present, else invoke the
/// toolchain directly against the known build target.
async fn build(go: &str, runner: &CommandRunner) -> Result<()> {
    if Path::new(paths::SOURCE_DIR).join("Makefile").exists() {
        info!("Building with project Makefile");
        runner.run("make", &["-C", paths::SOURCE_DIR]).await?;

        // Make drops the binary inside the tree on some refs
        let built = Path::new(paths::SOURCE_DIR).join("bin/incusd");
        if built.exists() && !Path::new(paths::COMPILED_BINARY).exists() {
            std::fs::copy(&built, paths::COMPILED_BINARY)?;
        }
        return Ok(());
    }

    info!("No Makefile, invoking toolchain directly");
    runner
        .run(
            go,
            &[
                "build",
                "-C",
                paths::SOURCE_DIR,
                "-o",
                paths::COMPILED_BINARY,
                BUILD_TARGET,
            ],
        )
        .await
}

/// Copy any systemd units shipped in the tree and reload the manager.
/// Best-effort: distributions differ in what the tree carries.
async fn install_unit_files(tree: &Path, runner: &CommandRunner) {
    let units = find_unit_files(tree, 3);
    if units.is_empty() {
        warn!("No service unit files found in source tree");
        return;
    }

    for unit in &units {
        let Some(name) = unit.file_name() else { continue };
        let dest = Path::new(UNIT_DIR).join(name);
        match std::fs::copy(unit, &dest) {
            Ok(_) => info!("Installed unit {}", dest.display()),
            Err(e) => warn!("Could not install unit {}: {}", unit.display(), e),
        }
    }

    if let StepOutcome::Failed(reason) = runner.run_soft("systemctl", &["daemon-reload"]).await {
        warn!("daemon-reload failed: {}", reason);
    }
}

/// Depth-limited scan for `.service`/`.socket` files
fn find_unit_files(dir: &Path, depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 && path.file_name().is_some_and(|n| n != ".git") {
                found.extend(find_unit_files(&path, depth - 1));
            }
        } else if path
            .extension()
            .is_some_and(|ext| ext == "service" || ext == "socket")
        {
            found.push(path);
        }
    }
    found.sort();
    found
}

fn toolchain_url(arch: Architecture) -> String {
    format!(
        "https://go.dev/dl/{}.linux-{}.tar.gz",
        GO_VERSION,
        arch.go_arch()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toolchain_url_per_arch() {
        assert_eq!(
            toolchain_url(Architecture::Amd64),
            "https://go.dev/dl/go1.22.5.linux-amd64.tar.gz"
        );
        assert_eq!(
            toolchain_url(Architecture::Arm64),
            "https://go.dev/dl/go1.22.5.linux-arm64.tar.gz"
        );
    }

    #[test]
    fn test_find_unit_files_scans_subdirectories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("init/systemd");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("incus.service"), "[Unit]").unwrap();
        std::fs::write(nested.join("incus.socket"), "[Socket]").unwrap();
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();

        let units = find_unit_files(dir.path(), 3);
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| {
            let ext = u.extension().unwrap();
            ext == "service" || ext == "socket"
        }));
    }

    #[test]
    fn test_find_unit_files_respects_depth() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a/b/c/d");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join("incus.service"), "[Unit]").unwrap();

        assert!(find_unit_files(dir.path(), 2).is_empty());
        assert_eq!(find_unit_files(dir.path(), 4).len(), 1);
    }

    #[test]
    fn test_find_unit_files_skips_git_dir() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git/hooks");
        std::fs::create_dir_all(&git).unwrap();
        std::fs::write(git.join("stale.service"), "[Unit]").unwrap();

        assert!(find_unit_files(dir.path(), 3).is_empty());
    }
}
