// file: src/report/mod.rs
// version: 1.0.0
// guid: e2d64a09-3b78-4fc1-95d2-8a40c7e1f635

//! Install summary reporting

use crate::steps::StepOutcome;
use crate::system::detect::{HostProfile, PackageManager};
use crate::Result;
use colored::Colorize;
use serde::Serialize;

/// How the daemon ended up on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    Packages,
    Source,
}

/// Summary of a completed install flow, printed at the end and optionally
/// emitted as JSON.
#[derive(Debug, Serialize)]
pub struct InstallReport {
    pub os: String,
    pub package_manager: PackageManager,
    pub method: InstallMethod,
    pub daemon_version: Option<String>,
    pub service: StepOutcome,
    pub initialization: StepOutcome,
    pub project: StepOutcome,
    pub remote_api: StepOutcome,
    pub trust_registration: StepOutcome,
    pub trust_token: StepOutcome,
    pub certificate_path: String,
}

impl InstallReport {
    pub fn new(profile: &HostProfile, method: InstallMethod) -> Self {
        Self {
            os: profile.pretty_name.clone(),
            package_manager: profile.pkg,
            method,
            daemon_version: None,
            service: StepOutcome::skipped("not attempted"),
            initialization: StepOutcome::skipped("not attempted"),
            project: StepOutcome::skipped("not requested"),
            remote_api: StepOutcome::skipped("not attempted"),
            trust_registration: StepOutcome::skipped("not attempted"),
            trust_token: StepOutcome::skipped("not attempted"),
            certificate_path: crate::paths::CLIENT_CERT.to_string(),
        }
    }

    /// Print the summary, human-readable or JSON
    pub fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        println!();
        println!("{}", "Install summary".bold());
        println!("  OS:              {}", self.os);
        println!("  Package manager: {}", self.package_manager.command());
        println!(
            "  Install method:  {}",
            match self.method {
                InstallMethod::Packages => "native packages",
                InstallMethod::Source => "compiled from source",
            }
        );
        println!(
            "  Daemon version:  {}",
            self.daemon_version.as_deref().unwrap_or("not responding")
        );
        print_line("Service", &self.service);
        print_line("Initialization", &self.initialization);
        print_line("Project", &self.project);
        print_line("Remote API", &self.remote_api);
        print_line("Trust registration", &self.trust_registration);
        print_line("Trust token", &self.trust_token);
        println!("  Client cert:     {}", self.certificate_path);
        Ok(())
    }
}

fn print_line(name: &str, outcome: &StepOutcome) {
    let label = match outcome {
        StepOutcome::Completed => outcome.label().green(),
        StepOutcome::Skipped(_) => outcome.label().yellow(),
        StepOutcome::Failed(_) => outcome.label().red(),
    };
    match outcome {
        StepOutcome::Completed => println!("  {:<16} {}", format!("{}:", name), label),
        StepOutcome::Skipped(reason) | StepOutcome::Failed(reason) => {
            println!("  {:<16} {} - {}", format!("{}:", name), label, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Architecture;

    fn profile() -> HostProfile {
        HostProfile {
            os_id: "ubuntu".to_string(),
            pretty_name: "Ubuntu 24.04 LTS".to_string(),
            version_id: Some("24.04".to_string()),
            codename: Some("noble".to_string()),
            pkg: PackageManager::Apt,
            arch: Architecture::Amd64,
        }
    }

    #[test]
    fn test_new_report_defaults_to_skipped() {
        let report = InstallReport::new(&profile(), InstallMethod::Packages);
        assert!(matches!(report.service, StepOutcome::Skipped(_)));
        assert!(report.daemon_version.is_none());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut report = InstallReport::new(&profile(), InstallMethod::Source);
        report.daemon_version = Some("6.0.0".to_string());
        report.service = StepOutcome::Completed;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["os"], "Ubuntu 24.04 LTS");
        assert_eq!(json["method"], "source");
        assert_eq!(json["daemon_version"], "6.0.0");
        assert_eq!(json["service"]["state"], "completed");
    }
}
