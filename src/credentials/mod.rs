// file: src/credentials/mod.rs
// version: 1.0.0
// guid: 90e36c14-7a5f-4d82-b0c9-26f81d4a73e5

//! Client credential issuance
//!
//! Generates a 4096-bit key and self-signed certificate at fixed paths and
//! registers the certificate with the daemon's trust store. Prior
//! credentials are always copied to timestamped backups first, never
//! deleted in place. Registration failures are non-fatal: the pair stays on
//! disk for manual registration.

use crate::paths;
use crate::steps::StepOutcome;
use crate::system::CommandRunner;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Subject written into the self-signed certificate; also the trust-token
/// client name
pub const CLIENT_NAME: &str = "incus-provision-client";

/// Certificate validity in days
const CERT_DAYS: &str = "3650";

/// Result of credential issuance
#[derive(Debug)]
pub struct IssuedCredentials {
    pub key: PathBuf,
    pub certificate: PathBuf,
    pub trust_registration: StepOutcome,
    pub trust_token: StepOutcome,
}

/// Issue the client credential pair at the fixed paths
pub async fn issue(runner: &CommandRunner) -> Result<IssuedCredentials> {
    issue_at(
        runner,
        Path::new(paths::CLIENT_KEY),
        Path::new(paths::CLIENT_CERT),
        Path::new(paths::BACKUP_DIR),
    )
    .await
}

/// Issuance against explicit paths; separated for testability
pub async fn issue_at(
    runner: &CommandRunner,
    key: &Path,
    cert: &Path,
    backup_dir: &Path,
) -> Result<IssuedCredentials> {
    for prior in [key, cert] {
        if let Some(backup) = paths::backup_file(prior, backup_dir)? {
            info!("Backed up {} to {}", prior.display(), backup.display());
            runner
                .log()
                .status(&format!("backed up {} -> {}", prior.display(), backup.display()))?;
        }
    }

    if let Some(parent) = key.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!("Generating 4096-bit client key and self-signed certificate");
    runner
        .run(
            "openssl",
            &[
                "req",
                "-x509",
                "-newkey",
                "rsa:4096",
                "-sha256",
                "-days",
                CERT_DAYS,
                "-nodes",
                "-keyout",
                &key.to_string_lossy(),
                "-out",
                &cert.to_string_lossy(),
                "-subj",
                &format!("/CN={}", CLIENT_NAME),
            ],
        )
        .await?;

    set_mode(key, 0o600)?;
    set_mode(cert, 0o644)?;

    let trust_registration = runner
        .run_soft(
            "incus",
            &["config", "trust", "add-certificate", &cert.to_string_lossy()],
        )
        .await;
    if let StepOutcome::Failed(reason) = &trust_registration {
        warn!(
            "Trust registration failed, certificate kept at {}: {}",
            cert.display(),
            reason
        );
    }

    let trust_token = runner
        .run_soft("incus", &["config", "trust", "add", CLIENT_NAME])
        .await;
    if let StepOutcome::Failed(reason) = &trust_token {
        warn!("Trust token request failed: {}", reason);
    }

    Ok(IssuedCredentials {
        key: key.to_path_buf(),
        certificate: cert.to_path_buf(),
        trust_registration,
        trust_token,
    })
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
