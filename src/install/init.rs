// file: src/install/init.rs
// version: 1.0.0
// guid: 52c7a9e3-1d08-4b6f-9e31-74d05f8b2ca6

//! One-time daemon initialization
//!
//! Every sub-step is independently best-effort: the daemon is already usable
//! locally, so auto-setup, project creation, and remote-API exposure are
//! logged on failure and never abort the install.

use crate::config::RunConfig;
use crate::steps::StepOutcome;
use crate::system::CommandRunner;
use crate::Result;
use tracing::{info, warn};

/// Wildcard listen address for the daemon's remote API
const REMOTE_API_ADDRESS: &str = ":8443";

/// Feature flags applied to created projects
const PROJECT_FEATURES: &[&str] = &["-c", "features.images=true", "-c", "features.profiles=true"];

/// Outcomes of the initialization sub-steps
#[derive(Debug)]
pub struct InitOutcome {
    pub auto_setup: StepOutcome,
    pub project: StepOutcome,
    pub remote_api: StepOutcome,
}

/// Run non-interactive daemon initialization per the run configuration
pub async fn initialize(config: &RunConfig, runner: &CommandRunner) -> Result<InitOutcome> {
    if !config.run_init {
        info!("Initialization disabled, skipping");
        runner.log().status("initialization skipped (--no-init)")?;
        return Ok(InitOutcome {
            auto_setup: StepOutcome::skipped("disabled by --no-init"),
            project: StepOutcome::skipped("disabled by --no-init"),
            remote_api: StepOutcome::skipped("disabled by --no-init"),
        });
    }

    let auto_setup = auto_setup(config, runner).await;
    let project = create_project(config, runner).await;
    let remote_api = enable_remote_api(runner).await;

    Ok(InitOutcome {
        auto_setup,
        project,
        remote_api,
    })
}

async fn auto_setup(config: &RunConfig, runner: &CommandRunner) -> StepOutcome {
    info!("Running daemon auto-initialization");

    let mut args = vec!["admin", "init", "--auto"];
    if let Some(backend) = config.storage_backend.as_deref() {
        args.push("--storage-backend");
        args.push(backend);
    }

    let outcome = runner.run_soft("incus", &args).await;
    if let StepOutcome::Failed(reason) = &outcome {
        warn!("Auto-initialization failed: {}", reason);
    }
    outcome
}

async fn create_project(config: &RunConfig, runner: &CommandRunner) -> StepOutcome {
    let Some(project) = config.project.as_deref() else {
        return StepOutcome::skipped("no project configured");
    };

    info!("Creating project {}", project);
    let mut args = vec!["project", "create", project];
    args.extend_from_slice(PROJECT_FEATURES);

    let outcome = runner.run_soft("incus", &args).await;
    if let StepOutcome::Failed(reason) = &outcome {
        warn!("Project creation failed: {}", reason);
    }
    outcome
}

async fn enable_remote_api(runner: &CommandRunner) -> StepOutcome {
    info!("Enabling remote API on {}", REMOTE_API_ADDRESS);

    let outcome = runner
        .run_soft(
            "incus",
            &["config", "set", "core.https_address", REMOTE_API_ADDRESS],
        )
        .await;
    if let StepOutcome::Failed(reason) = &outcome {
        warn!("Remote API configuration failed: {}", reason);
    }
    outcome
}
