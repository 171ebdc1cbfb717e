//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A scenario step failed
    #[error("Step '{step}' failed: {message}")]
    StepFailed {
        /// Step name
        step: String,
        /// Error message
        message: String,
    },

    /// A section's props are not the variant the scenario expects
    #[error("Section '{section}' has no {expected} props")]
    PropsMismatch {
        /// Section path
        section: String,
        /// Expected props variant
        expected: &'static str,
    },

    /// The scenario finished with failures
    #[error("{failed} of {total} step(s) failed")]
    ScenarioFailed {
        /// Failed step count
        failed: usize,
        /// Total step count
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cometprobe library error
    #[error("Cometprobe error: {0}")]
    Probe(#[from] cometprobe::ProbeError),

    /// YAML config error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON report error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a step failure
    #[must_use]
    pub fn step_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.into(),
            message: message.into(),
        }
    }
}
