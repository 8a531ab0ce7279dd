// file: src/lib.rs
// version: 1.0.0
// guid: d4b7f219-66a3-4c85-b1e0-38c92a57f6d1

//! # Incus Provision
//!
//! Provisions, removes, and self-updates the Incus container-management
//! daemon on a Linux host. Detects the OS family, installs the daemon via
//! the native package manager or by compiling it from source, enables its
//! systemd service, runs one-time initialization, issues a client
//! certificate registered with the daemon's trust store, and supports full
//! uninstall plus self-update from a remote release asset.
//!
//! ## Known limitation
//!
//! On hosts where no systemd unit for the daemon exists (containerized or
//! otherwise unmanaged installs), service activation is skipped with a
//! warning. Later initialization and trust steps then run best-effort
//! against a daemon that may not be listening; their outcomes are reported
//! in the install summary but never abort the flow.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod install;
pub mod logging;
pub mod network;
pub mod paths;
pub mod report;
pub mod steps;
pub mod system;
pub mod uninstall;
pub mod update;

pub use error::{ProvisionError, Result};

/// Version information for the tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
