// file: src/steps/mod.rs
// version: 1.0.0
// guid: 5e8d0f36-91ab-4c27-8e54-d3a76b109c4f

//! Explicit outcomes for best-effort provisioning steps
//!
//! Optional steps never abort the flow. Instead of propagating errors they
//! return a [`StepOutcome`], and the caller logs it and continues.

use serde::Serialize;

/// Result of a best-effort step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum StepOutcome {
    /// The step ran and succeeded
    Completed,
    /// The step did not apply on this host
    Skipped(String),
    /// The step ran and failed; the flow continues
    Failed(String),
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// True when the step actually ran to completion
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Short label for summary lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "ok",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "ok"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(StepOutcome::Completed.label(), "ok");
        assert_eq!(StepOutcome::skipped("no unit").label(), "skipped");
        assert_eq!(StepOutcome::failed("exit 1").label(), "failed");
    }

    #[test]
    fn test_display_includes_reason() {
        let outcome = StepOutcome::failed("trust add exited 1");
        assert_eq!(outcome.to_string(), "failed (trust add exited 1)");
        assert!(!outcome.is_completed());
    }

    #[test]
    fn test_serializes_with_state_tag() {
        let json = serde_json::to_string(&StepOutcome::skipped("disabled")).unwrap();
        assert!(json.contains("\"state\":\"skipped\""));
        assert!(json.contains("\"detail\":\"disabled\""));
    }
}
