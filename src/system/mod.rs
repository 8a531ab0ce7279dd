// file: src/system/mod.rs
// version: 1.0.0
// guid: 42c8f6a1-0b5d-4397-9e82-67a1d03c5b94

//! Host inspection and external command execution

pub mod detect;
pub mod log;
pub mod runner;

pub use detect::{detect, HostProfile, PackageManager};
pub use log::DurableLog;
pub use runner::CommandRunner;

/// Check if running as root
pub fn is_root() -> bool {
    unsafe { libc::getuid() == 0 }
}
