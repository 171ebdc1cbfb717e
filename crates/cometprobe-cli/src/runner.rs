//! Scenario runner implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DeviceKind;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::scenario::{ScenarioContext, Step};

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepOutcome {
    /// All checks held
    Passed,
    /// A check failed or the harness errored
    Failed {
        /// Error message
        message: String,
    },
    /// Not run because an earlier step failed
    Skipped,
}

/// Step execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Step name
    pub name: String,
    /// Outcome
    pub outcome: StepOutcome,
    /// Step duration
    pub duration: Duration,
}

impl StepResult {
    /// Create a passing step result
    #[must_use]
    pub fn pass(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Passed,
            duration,
        }
    }

    /// Create a failing step result
    #[must_use]
    pub fn fail(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Failed {
                message: message.into(),
            },
            duration,
        }
    }

    /// Create a skipped step result
    #[must_use]
    pub fn skip(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Skipped,
            duration: Duration::ZERO,
        }
    }

    /// Whether the step passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == StepOutcome::Passed
    }

    /// Failure message, if failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Report for one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Application URL
    pub url: String,
    /// Device profile
    pub device: DeviceKind,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Total duration
    pub duration: Duration,
    /// Per-step results in execution order
    pub steps: Vec<StepResult>,
}

impl ScenarioReport {
    /// Start an empty report
    #[must_use]
    pub fn new(url: impl Into<String>, device: DeviceKind) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            url: url.into(),
            device,
            started_at: now,
            finished_at: now,
            duration: Duration::ZERO,
            steps: Vec::new(),
        }
    }

    /// Add a step result
    pub fn add(&mut self, result: StepResult) {
        self.steps.push(result);
    }

    /// Get number of passed steps
    #[must_use]
    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|r| r.passed()).count()
    }

    /// Get number of failed steps
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures().len()
    }

    /// Get number of skipped steps
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.steps
            .iter()
            .filter(|r| r.outcome == StepOutcome::Skipped)
            .count()
    }

    /// Get total number of steps
    #[must_use]
    pub fn total(&self) -> usize {
        self.steps.len()
    }

    /// Check if every step passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.steps.iter().all(StepResult::passed)
    }

    /// Get failed steps
    #[must_use]
    pub fn failures(&self) -> Vec<&StepResult> {
        self.steps.iter().filter(|r| r.error().is_some()).collect()
    }

    /// Find a step by name
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|r| r.name == name)
    }

    /// Turn failures into [`CliError::ScenarioFailed`]
    ///
    /// # Errors
    ///
    /// When any step did not pass.
    pub fn into_result(self) -> CliResult<Self> {
        if self.all_passed() {
            Ok(self)
        } else {
            Err(CliError::ScenarioFailed {
                failed: self.total() - self.passed(),
                total: self.total(),
            })
        }
    }

    /// Write the report as pretty JSON
    ///
    /// # Errors
    ///
    /// I/O or serialization errors.
    pub fn write_json(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
}

/// Runs scenario steps in order against one context
#[derive(Debug)]
pub struct ScenarioRunner {
    reporter: ProgressReporter,
    keep_going: bool,
}

impl ScenarioRunner {
    /// Create a new scenario runner
    #[must_use]
    pub fn new(reporter: ProgressReporter, keep_going: bool) -> Self {
        Self {
            reporter,
            keep_going,
        }
    }

    /// Run `steps` in order; after a failure the rest are skipped unless
    /// `keep_going` is set
    pub async fn run(
        &mut self,
        ctx: &mut ScenarioContext,
        steps: &[Step],
        mut report: ScenarioReport,
    ) -> ScenarioReport {
        let start = Instant::now();

        if steps.is_empty() {
            self.reporter.warning("No steps selected");
        } else {
            self.reporter.header("GreenComet acceptance");
            self.reporter.start_progress(steps.len() as u64, "Starting...");
        }

        let mut halted = false;
        for step in steps {
            if halted {
                report.add(StepResult::skip(step.name));
                self.reporter.skipped(step.name);
                self.reporter.increment(1);
                continue;
            }

            self.reporter.set_message(step.name);
            let step_start = Instant::now();
            let result = match step.run(ctx).await {
                Ok(()) => {
                    self.reporter.success(step.name);
                    StepResult::pass(step.name, step_start.elapsed())
                }
                Err(e) => {
                    warn!(step = step.name, error = %e, "step failed");
                    self.reporter.failure(&format!("{}: {e}", step.name));
                    halted = !self.keep_going;
                    StepResult::fail(step.name, e.to_string(), step_start.elapsed())
                }
            };
            report.add(result);
            self.reporter.increment(1);
        }

        self.reporter.finish();
        report.duration = start.elapsed();
        report.finished_at = Utc::now();
        self.reporter.summary(
            report.passed(),
            report.failed(),
            report.skipped(),
            report.duration,
        );
        report
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::error::CliError;
    use crate::simulation::{simulate, SimulationOptions};
    use futures::future::BoxFuture;

    mod step_result_tests {
        use super::*;

        #[test]
        fn test_pass_result() {
            let result = StepResult::pass("Open video", Duration::from_millis(100));
            assert!(result.passed());
            assert!(result.error().is_none());
        }

        #[test]
        fn test_fail_result() {
            let result = StepResult::fail("Open video", "dialog stuck", Duration::from_millis(50));
            assert!(!result.passed());
            assert_eq!(result.error(), Some("dialog stuck"));
        }

        #[test]
        fn test_serialized_status() {
            let json = serde_json::to_value(StepResult::skip("Info text")).unwrap();
            assert_eq!(json["outcome"]["status"], "skipped");
            assert_eq!(json["name"], "Info text");
        }
    }

    mod report_tests {
        use super::*;

        fn report() -> ScenarioReport {
            let mut report = ScenarioReport::new("http://localhost:8080", DeviceKind::Desktop);
            report.add(StepResult::pass("a", Duration::from_millis(10)));
            report.add(StepResult::fail("b", "error", Duration::from_millis(10)));
            report.add(StepResult::skip("c"));
            report
        }

        #[test]
        fn test_counts() {
            let report = report();
            assert_eq!(report.total(), 3);
            assert_eq!(report.passed(), 1);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.skipped(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.failures()[0].name, "b");
        }

        #[test]
        fn test_into_result_counts_skipped_as_failed() {
            let err = report().into_result().unwrap_err();
            assert!(matches!(err, CliError::ScenarioFailed { failed: 2, total: 3 }));
        }

        #[test]
        fn test_write_json() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("reports").join("run.json");
            let report = report();
            report.write_json(&path).unwrap();
            let loaded: ScenarioReport =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(loaded.run_id, report.run_id);
            assert_eq!(loaded.steps.len(), 3);
            assert_eq!(loaded.steps[1].error(), Some("error"));
        }
    }

    mod runner_tests {
        use super::*;

        fn ok(_: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn broken(_: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
            Box::pin(async { Err(CliError::step_failed("broken", "always fails")) })
        }

        fn context() -> ScenarioContext {
            let (_, page) = simulate(&RunConfig::default(), SimulationOptions::default()).unwrap();
            ScenarioContext::new(page, false)
        }

        fn steps() -> Vec<Step> {
            vec![
                Step::new("first", ok),
                Step::new("broken", broken),
                Step::new("last", ok),
            ]
        }

        #[tokio::test]
        async fn test_stops_after_failure() {
            let mut runner = ScenarioRunner::new(ProgressReporter::new(false, true), false);
            let mut ctx = context();
            let report = runner
                .run(&mut ctx, &steps(), ScenarioReport::new("u", DeviceKind::Desktop))
                .await;
            assert_eq!(report.passed(), 1);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.step("last").unwrap().outcome, StepOutcome::Skipped);
        }

        #[tokio::test]
        async fn test_keep_going_runs_everything() {
            let mut runner = ScenarioRunner::new(ProgressReporter::new(false, true), true);
            let mut ctx = context();
            let report = runner
                .run(&mut ctx, &steps(), ScenarioReport::new("u", DeviceKind::Desktop))
                .await;
            assert_eq!(report.passed(), 2);
            assert_eq!(report.skipped(), 0);
            assert!(report.finished_at >= report.started_at);
        }

        #[tokio::test]
        async fn test_no_steps() {
            let mut runner = ScenarioRunner::new(ProgressReporter::new(false, true), false);
            let mut ctx = context();
            let report = runner
                .run(&mut ctx, &[], ScenarioReport::new("u", DeviceKind::Desktop))
                .await;
            assert_eq!(report.total(), 0);
            assert!(report.all_passed());
            assert!(runner.reporter().quiet);
        }
    }
}
