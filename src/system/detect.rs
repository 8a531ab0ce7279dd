// file: src/system/detect.rs
// version: 1.0.0
// guid: f03b8c26-71da-4e95-8f40-12c6a9d57e83

//! Operating system detection
//!
//! Exactly two OS families are supported: Debian-like hosts using apt, and
//! RHEL-like hosts using dnf (or yum where dnf is absent). Anything else is
//! a fatal, user-facing error rather than a guess.

use crate::config::Architecture;
use crate::{ProvisionError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

const OS_RELEASE: &str = "/etc/os-release";

/// Package-manager strategy selected from the host's release identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
}

impl PackageManager {
    /// Binary invoked for this strategy
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }
}

/// Detected host properties, computed once and read-only afterwards
#[derive(Debug, Clone, Serialize)]
pub struct HostProfile {
    /// `ID` field of os-release (e.g. `ubuntu`)
    pub os_id: String,
    /// `PRETTY_NAME` field, for the summary
    pub pretty_name: String,
    /// `VERSION_ID` field, may be absent on rolling releases
    pub version_id: Option<String>,
    /// `VERSION_CODENAME`, used to scope apt source definitions
    pub codename: Option<String>,
    /// Selected package-manager strategy
    pub pkg: PackageManager,
    /// Host CPU architecture
    pub arch: Architecture,
}

/// Detect the running host's profile from `/etc/os-release`
pub fn detect() -> Result<HostProfile> {
    let profile = detect_from(Path::new(OS_RELEASE), which::which("dnf").is_ok())?;
    info!(
        "Detected {} ({}) using {}",
        profile.pretty_name,
        profile.arch.as_str(),
        profile.pkg.command()
    );
    Ok(profile)
}

/// Detection against an explicit os-release file; `have_dnf` resolves the
/// dnf-vs-yum fallback for RHEL-like hosts.
pub fn detect_from(os_release: &Path, have_dnf: bool) -> Result<HostProfile> {
    let content = std::fs::read_to_string(os_release).map_err(|e| {
        ProvisionError::provision(format!("cannot read {}: {}", os_release.display(), e))
    })?;
    let fields = parse_os_release(&content);

    let os_id = fields.get("ID").cloned().unwrap_or_default();
    let pkg = strategy_for(&os_id, have_dnf)?;

    Ok(HostProfile {
        pretty_name: fields
            .get("PRETTY_NAME")
            .cloned()
            .unwrap_or_else(|| os_id.clone()),
        version_id: fields.get("VERSION_ID").cloned(),
        codename: fields.get("VERSION_CODENAME").cloned(),
        os_id,
        pkg,
        arch: Architecture::host(),
    })
}

fn strategy_for(os_id: &str, have_dnf: bool) -> Result<PackageManager> {
    match os_id {
        "ubuntu" | "debian" => Ok(PackageManager::Apt),
        "fedora" | "centos" | "rhel" | "rocky" | "almalinux" => Ok(if have_dnf {
            PackageManager::Dnf
        } else {
            PackageManager::Yum
        }),
        "" => Err(ProvisionError::UnsupportedOs(
            "missing ID field in os-release".to_string(),
        )),
        other => Err(ProvisionError::UnsupportedOs(other.to_string())),
    }
}

/// Parse the `KEY=value` lines of an os-release file, stripping quotes
fn parse_os_release(content: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            fields.insert(key.trim().to_string(), value.to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_os_release(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("os-release");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_ubuntu_maps_to_apt() {
        let dir = TempDir::new().unwrap();
        let path = write_os_release(
            &dir,
            "ID=ubuntu\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\nVERSION_ID=\"24.04\"\nVERSION_CODENAME=noble\n",
        );

        let profile = detect_from(&path, true).unwrap();
        assert_eq!(profile.pkg, PackageManager::Apt);
        assert_eq!(profile.os_id, "ubuntu");
        assert_eq!(profile.codename.as_deref(), Some("noble"));
        assert_eq!(profile.version_id.as_deref(), Some("24.04"));
    }

    #[test]
    fn test_debian_maps_to_apt() {
        let dir = TempDir::new().unwrap();
        let path = write_os_release(&dir, "ID=debian\nVERSION_CODENAME=bookworm\n");
        assert_eq!(detect_from(&path, true).unwrap().pkg, PackageManager::Apt);
    }

    #[test]
    fn test_rhel_family_maps_to_dnf() {
        for id in ["fedora", "centos", "rhel", "rocky", "almalinux"] {
            let dir = TempDir::new().unwrap();
            let path = write_os_release(&dir, &format!("ID={}\n", id));
            let profile = detect_from(&path, true).unwrap();
            assert_eq!(profile.pkg, PackageManager::Dnf, "id={}", id);
        }
    }

    #[test]
    fn test_rhel_family_falls_back_to_yum() {
        let dir = TempDir::new().unwrap();
        let path = write_os_release(&dir, "ID=centos\n");
        let profile = detect_from(&path, false).unwrap();
        assert_eq!(profile.pkg, PackageManager::Yum);
    }

    #[test]
    fn test_unknown_id_is_fatal() {
        for id in ["arch", "alpine", "nixos", "gentoo"] {
            let dir = TempDir::new().unwrap();
            let path = write_os_release(&dir, &format!("ID={}\n", id));
            let err = detect_from(&path, true).unwrap_err();
            assert!(matches!(err, ProvisionError::UnsupportedOs(_)), "id={}", id);
        }
    }

    #[test]
    fn test_missing_id_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_os_release(&dir, "PRETTY_NAME=\"Mystery Linux\"\n");
        assert!(matches!(
            detect_from(&path, true),
            Err(ProvisionError::UnsupportedOs(_))
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = detect_from(&dir.path().join("absent"), true);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_strips_quotes_and_comments() {
        let fields = parse_os_release(
            "# comment\nID='debian'\nPRETTY_NAME=\"Debian GNU/Linux 12\"\n\nEMPTY=\n",
        );
        assert_eq!(fields.get("ID").unwrap(), "debian");
        assert_eq!(fields.get("PRETTY_NAME").unwrap(), "Debian GNU/Linux 12");
        assert_eq!(fields.get("EMPTY").unwrap(), "");
    }

    #[test]
    fn test_package_manager_commands() {
        assert_eq!(PackageManager::Apt.command(), "apt-get");
        assert_eq!(PackageManager::Dnf.command(), "dnf");
        assert_eq!(PackageManager::Yum.command(), "yum");
    }
}
