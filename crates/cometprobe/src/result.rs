//! Result and error types for Cometprobe.
//!
//! Errors describe a misconfigured harness or a broken driver session.
//! An application in the wrong UI state is reported through
//! [`BatchAssertionResult`](crate::BatchAssertionResult) values instead,
//! except for the single-element expectations in [`crate::expect`], which
//! fail hard with [`ProbeError::AssertionFailed`].

use thiserror::Error;

/// Result type for Cometprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur in Cometprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A symbolic name was declared twice in the same scope
    #[error("Duplicate name '{name}' in scope '{scope}'")]
    DuplicateName {
        /// Scope that declares the name
        scope: String,
        /// The repeated name
        name: String,
    },

    /// A symbolic element name is not registered in the scope
    #[error("Unknown element '{name}' in scope '{scope}'")]
    UnknownElement {
        /// Scope that was asked
        scope: String,
        /// The unregistered name
        name: String,
    },

    /// A child section name is not registered in the scope
    #[error("Unknown section '{name}' in scope '{scope}'")]
    UnknownSection {
        /// Scope that was asked
        scope: String,
        /// The unregistered section name
        name: String,
    },

    /// A registered element must exist but matched nothing in the live DOM
    #[error("Element '{name}' in scope '{scope}' not found (selector: {selector})")]
    ElementNotFound {
        /// Scope that declares the element
        scope: String,
        /// Symbolic element name
        name: String,
        /// Selector that matched nothing
        selector: String,
    },

    /// The page readiness signal never became true
    #[error("Page '{page}' not ready after {ms}ms (waiting for {signal})")]
    ReadinessTimeout {
        /// Page name
        page: String,
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the readiness signal
        signal: String,
    },

    /// A generic poll timed out
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was waited for
        waited_for: String,
    },

    /// A locator cannot be composed or used
    #[error("Invalid locator: {message}")]
    InvalidLocator {
        /// Error message
        message: String,
    },

    /// Operation called in the wrong state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// A handle refers to an element that is no longer attached
    #[error("Stale element handle '{id}'")]
    StaleElement {
        /// Handle identifier
        id: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Driver round-trip failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Whether this error reports a misconfigured harness (bad names or locators)
    #[must_use]
    pub const fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. }
                | Self::UnknownElement { .. }
                | Self::UnknownSection { .. }
                | Self::InvalidLocator { .. }
        )
    }
}
