// file: src/error.rs
// version: 1.0.0
// guid: 7c1e5a92-4d3f-4b68-a0e7-92f15c8d36b4

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Error types for the Incus provisioner
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("Command `{command}` failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Update payload rejected: {0}")]
    UpdateRejected(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Provisioning error: {0}")]
    Provision(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProvisionError {
    /// Create a new permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new update-rejection error
    pub fn update_rejected(msg: impl Into<String>) -> Self {
        Self::UpdateRejected(msg.into())
    }

    /// Create a new invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new provisioning error
    pub fn provision(msg: impl Into<String>) -> Self {
        Self::Provision(msg.into())
    }

    /// Process exit code for this error: invalid arguments exit 2, every
    /// other fatal error exits 1
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
