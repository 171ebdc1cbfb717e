//! Batch Assertion Utilities.
//!
//! Evaluate one predicate over an ordered list of element names in a
//! [`Scope`] and report every violation in a single result.
//!
//! ## Semantics
//!
//! - Names are checked sequentially, in the order given.
//! - A mismatch never stops the batch; later names are still checked.
//! - Mismatches are data ([`BatchAssertionResult`]). Unknown names and
//!   driver failures are errors and end the batch immediately.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::result::{ProbeError, ProbeResult};
use crate::section::Scope;

/// Predicate evaluated for each element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Predicate {
    /// Present and displayed
    Visible,
    /// Absent or hidden
    NotVisible,
    /// Matches something in the DOM
    Present,
    /// Matches nothing in the DOM
    NotPresent,
}

impl Predicate {
    /// State an element must be in to satisfy the predicate
    #[must_use]
    pub const fn expected(self) -> ElementState {
        match self {
            Self::Visible => ElementState::Visible,
            Self::NotVisible => ElementState::NotVisible,
            Self::Present => ElementState::Present,
            Self::NotPresent => ElementState::NotPresent,
        }
    }

    async fn observe<S: Scope + ?Sized>(self, scope: &S, name: &str) -> ProbeResult<ElementState> {
        Ok(match self {
            Self::Visible | Self::NotVisible => {
                if scope.is_visible(name).await? {
                    ElementState::Visible
                } else {
                    ElementState::NotVisible
                }
            }
            Self::Present | Self::NotPresent => {
                if scope.is_present(name).await? {
                    ElementState::Present
                } else {
                    ElementState::NotPresent
                }
            }
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expected(), f)
    }
}

/// Observed or expected state of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementState {
    /// Displayed
    Visible,
    /// Absent or hidden
    NotVisible,
    /// In the DOM
    Present,
    /// Not in the DOM
    NotPresent,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Visible => "visible",
            Self::NotVisible => "not visible",
            Self::Present => "present",
            Self::NotPresent => "not present",
        })
    }
}

/// One element that did not satisfy the predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Symbolic element name
    pub element: String,
    /// Observed state
    pub actual: ElementState,
    /// Required state
    pub expected: ElementState,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, was {}",
            self.element, self.expected, self.actual
        )
    }
}

/// Outcome of one batch; empty violations means success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAssertionResult {
    /// Scope the names were evaluated in
    pub scope: String,
    /// Predicate applied to every name
    pub predicate: Predicate,
    /// Number of names checked
    pub checked: usize,
    /// Violations in input order
    pub violations: Vec<Violation>,
}

impl BatchAssertionResult {
    /// Whether every name satisfied the predicate
    #[must_use]
    pub fn success(&self) -> bool {
        self.violations.is_empty()
    }

    /// Names that failed, in input order
    #[must_use]
    pub fn violated_names(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.element.as_str()).collect()
    }

    /// Turn violations into a hard failure
    ///
    /// # Errors
    ///
    /// [`ProbeError::AssertionFailed`] carrying the full report.
    pub fn into_result(self) -> ProbeResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProbeError::assertion(self.to_string()))
        }
    }
}

impl fmt::Display for BatchAssertionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success() {
            return write!(
                f,
                "{}: all {} element(s) {}",
                self.scope, self.checked, self.predicate
            );
        }
        write!(
            f,
            "{}: {} of {} element(s) failed '{}'",
            self.scope,
            self.violations.len(),
            self.checked,
            self.predicate
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

/// Check `predicate` for every name in order, collecting all violations
///
/// # Errors
///
/// Lookup errors for unregistered names and driver errors; never for
/// mismatches.
pub async fn expect_all<S, N>(
    scope: &S,
    names: &[N],
    predicate: Predicate,
) -> ProbeResult<BatchAssertionResult>
where
    S: Scope + ?Sized,
    N: AsRef<str>,
{
    let expected = predicate.expected();
    let mut violations = Vec::new();

    for name in names {
        let name = name.as_ref();
        let actual = predicate.observe(scope, name).await?;
        debug!(scope = scope.scope_name(), element = name, %actual, "batch check");
        if actual != expected {
            violations.push(Violation {
                element: name.to_string(),
                actual,
                expected,
            });
        }
    }

    let result = BatchAssertionResult {
        scope: scope.scope_name().to_string(),
        predicate,
        checked: names.len(),
        violations,
    };
    if !result.success() {
        warn!(
            scope = %result.scope,
            violations = ?result.violated_names(),
            "batch assertion failed"
        );
    }
    Ok(result)
}

/// Every name must be visible
///
/// # Errors
///
/// See [`expect_all`].
pub async fn expect_all_visible<S, N>(scope: &S, names: &[N]) -> ProbeResult<BatchAssertionResult>
where
    S: Scope + ?Sized,
    N: AsRef<str>,
{
    expect_all(scope, names, Predicate::Visible).await
}

/// No name may match anything in the DOM
///
/// # Errors
///
/// See [`expect_all`].
pub async fn expect_all_not_present<S, N>(
    scope: &S,
    names: &[N],
) -> ProbeResult<BatchAssertionResult>
where
    S: Scope + ?Sized,
    N: AsRef<str>,
{
    expect_all(scope, names, Predicate::NotPresent).await
}
