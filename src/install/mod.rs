// file: src/install/mod.rs
// version: 1.0.0
// guid: 04d96b72-e8a1-4f53-bc08-37f2d61a90c4

//! Install flow orchestration
//!
//! Strictly sequential: each step starts only after the previous one has
//! completed, either successfully or as a logged non-fatal outcome. Fatal
//! steps abort the whole flow through `?`.

pub mod init;
pub mod packages;
pub mod service;
pub mod source;

use crate::config::RunConfig;
use crate::credentials;
use crate::network::NetworkDownloader;
use crate::report::{InstallMethod, InstallReport};
use crate::system::{CommandRunner, HostProfile};
use crate::Result;
use tracing::info;

/// Run the full install flow and return the summary
pub async fn install(
    config: &RunConfig,
    profile: &HostProfile,
    runner: &CommandRunner,
) -> Result<InstallReport> {
    let downloader = NetworkDownloader::new();

    let method = if config.wants_source_build() {
        source::install(config, profile, runner, &downloader).await?;
        InstallMethod::Source
    } else {
        packages::install(profile, runner, &downloader).await?;
        InstallMethod::Packages
    };

    let mut report = InstallReport::new(profile, method);

    report.service = service::activate(runner).await?;
    report.daemon_version = service::wait_ready(runner).await;

    let init = init::initialize(config, runner).await?;
    report.initialization = init.auto_setup;
    report.project = init.project;
    report.remote_api = init.remote_api;

    let issued = credentials::issue(runner).await?;
    report.trust_registration = issued.trust_registration;
    report.trust_token = issued.trust_token;
    report.certificate_path = issued.certificate.display().to_string();

    // Record the daemon's storage and network state in the audit trail;
    // output lands in the durable log as a side effect of running them.
    let _ = runner.run_soft("incus", &["storage", "list"]).await;
    let _ = runner.run_soft("incus", &["network", "list"]).await;

    info!("Install flow finished");
    Ok(report)
}
