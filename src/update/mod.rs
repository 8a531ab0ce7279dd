// file: src/update/mod.rs
// version: 1.0.0
// guid: 6f24c8b1-d395-4a07-8e62-13b7a0d5c948

//! Installer self-update
//!
//! Downloads the fixed release asset, validates it against corrupt or
//! HTML-error payloads, and only then backs up and atomically replaces the
//! running executable. Validation failure never touches the existing
//! installer. The update does not re-invoke itself.

use crate::network::NetworkDownloader;
use crate::paths;
use crate::system::DurableLog;
use crate::{ProvisionError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// ELF executables start with this magic
const ELF_MAGIC: &[u8] = b"\x7fELF";

/// Wrapper scripts are accepted too
const SHEBANG: &[u8] = b"#!";

/// Error-page markers rejected when found near the top of a text payload
const HTML_MARKERS: &[&str] = &["<html", "<!doctype", "not found"];

/// How many leading lines of a text payload are scanned for error markers
const SCAN_LINES: usize = 20;

/// Download and apply a new installer build. Returns the backup path of the
/// previous executable.
pub async fn self_update(log: &DurableLog) -> Result<PathBuf> {
    let target = std::env::current_exe()?;
    let downloader = NetworkDownloader::new();

    log.status(&format!("self-update: fetching {}", paths::UPDATE_URL))?;
    let staged = tempfile::Builder::new()
        .prefix("incus-provision-update.")
        .tempfile()?;
    downloader
        .download_with_progress(paths::UPDATE_URL, staged.path())
        .await?;

    let payload = std::fs::read(staged.path())?;
    apply_payload(&payload, &target, Path::new(paths::BACKUP_DIR), log)
}

/// Validate the payload and replace `target` with it, backing up the
/// previous executable first. Separated from the download for testability.
pub fn apply_payload(
    payload: &[u8],
    target: &Path,
    backup_dir: &Path,
    log: &DurableLog,
) -> Result<PathBuf> {
    if let Err(e) = validate_payload(payload) {
        let _ = log.status(&format!("self-update rejected: {}", e));
        return Err(e);
    }

    let backup = paths::backup_file(target, backup_dir)?.ok_or_else(|| {
        ProvisionError::provision(format!("current executable missing: {}", target.display()))
    })?;
    log.status(&format!("self-update: backed up installer to {}", backup.display()))?;

    // Stage next to the target so the final rename is atomic
    let parent = target
        .parent()
        .ok_or_else(|| ProvisionError::provision("executable path has no parent"))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".incus-provision.new.")
        .tempfile_in(parent)?;
    std::io::Write::write_all(&mut staged, payload)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(0o755))?;
    }

    staged
        .persist(target)
        .map_err(|e| ProvisionError::provision(format!("replacing installer: {}", e.error)))?;
    log.status(&format!("self-update: replaced {}", target.display()))?;
    info!("Installer updated, re-run to use the new version");

    Ok(backup)
}

/// Reject payloads that are empty, lack an executable marker, or look like
/// an HTML error page.
pub fn validate_payload(payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        return Err(ProvisionError::update_rejected("empty payload"));
    }

    if payload.starts_with(ELF_MAGIC) {
        return Ok(());
    }

    let head = String::from_utf8_lossy(payload);
    let head = head
        .lines()
        .take(SCAN_LINES)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    for marker in HTML_MARKERS {
        if head.contains(marker) {
            return Err(ProvisionError::update_rejected(format!(
                "payload looks like an HTML error page (`{}`)",
                marker
            )));
        }
    }

    if payload.starts_with(SHEBANG) {
        return Ok(());
    }
    Err(ProvisionError::update_rejected(
        "payload does not begin with an executable marker",
    ))
}
