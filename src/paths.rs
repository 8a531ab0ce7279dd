// file: src/paths.rs
// version: 1.0.0
// guid: a91c3e57-2f84-4d06-bb39-7e50d1c4a862

//! Fixed filesystem locations and backup helpers

use crate::Result;
use std::path::{Path, PathBuf};

/// Durable log recording every executed command
pub const LOG_FILE: &str = "/var/log/incus-provision.log";

/// Directory holding timestamped snapshots of the installer and credentials
pub const BACKUP_DIR: &str = "/var/backups/incus-provision";

/// Client private key registered with the daemon's trust store
pub const CLIENT_KEY: &str = "/etc/incus-provision/client.key";

/// Client certificate registered with the daemon's trust store
pub const CLIENT_CERT: &str = "/etc/incus-provision/client.crt";

/// Where the compile-from-source path clones the daemon tree
pub const SOURCE_DIR: &str = "/usr/local/src/incus";

/// Binary installed by the compile-from-source path
pub const COMPILED_BINARY: &str = "/usr/local/bin/incusd";

/// Apt source definition written when the third-party repo is added
pub const APT_SOURCE_FILE: &str = "/etc/apt/sources.list.d/zabbly-incus-stable.sources";

/// Keyring fetched for the third-party repo
pub const APT_KEYRING_FILE: &str = "/etc/apt/keyrings/zabbly.asc";

/// Dnf/yum repo definition written when the third-party repo is added
pub const DNF_REPO_FILE: &str = "/etc/yum.repos.d/zabbly-incus.repo";

/// Release asset holding the latest installer build
pub const UPDATE_URL: &str =
    "https://github.com/jdfalk/incus-provision/releases/latest/download/incus-provision";

/// Copy `src` into the backup directory under `<file-name>.<timestamp>`.
///
/// Additive only: nothing is ever removed from the backup directory. Returns
/// the backup path, or `None` when `src` does not exist.
pub fn backup_file(src: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !src.exists() {
        return Ok(None);
    }

    std::fs::create_dir_all(backup_dir)?;

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "backup".to_string());

    // Two backups inside the same timestamp tick must not collide, or the
    // earlier copy would be silently overwritten.
    let mut dest = backup_dir.join(format!("{}.{}", name, stamp));
    let mut discriminator = 1;
    while dest.exists() {
        dest = backup_dir.join(format!("{}.{}.{}", name, stamp, discriminator));
        discriminator += 1;
    }

    std::fs::copy(src, &dest)?;
    Ok(Some(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_missing_source_is_none() {
        let dir = TempDir::new().unwrap();
        let result = backup_file(&dir.path().join("absent"), dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_backup_copies_without_deleting() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("client.key");
        std::fs::write(&src, b"key material").unwrap();

        let backup_dir = dir.path().join("backups");
        let dest = backup_file(&src, &backup_dir).unwrap().unwrap();

        assert!(src.exists());
        assert!(dest.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"key material");
        assert!(dest.file_name().unwrap().to_string_lossy().starts_with("client.key."));
    }

    #[test]
    fn test_backups_are_additive() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("client.crt");
        let backup_dir = dir.path().join("backups");

        std::fs::write(&src, b"v1").unwrap();
        backup_file(&src, &backup_dir).unwrap().unwrap();
        std::fs::write(&src, b"v2").unwrap();
        backup_file(&src, &backup_dir).unwrap().unwrap();

        let count = std::fs::read_dir(&backup_dir).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_rapid_backups_never_collide() {
        // Back-to-back backups can land in the same timestamp tick; every
        // copy must still get a distinct name and preserve its content.
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("client.key");
        let backup_dir = dir.path().join("backups");

        let mut dests = Vec::new();
        for i in 0..5 {
            std::fs::write(&src, format!("v{}", i)).unwrap();
            dests.push(backup_file(&src, &backup_dir).unwrap().unwrap());
        }

        assert_eq!(std::fs::read_dir(&backup_dir).unwrap().count(), 5);
        for (i, dest) in dests.iter().enumerate() {
            assert_eq!(std::fs::read(dest).unwrap(), format!("v{}", i).as_bytes());
        }
    }
}
