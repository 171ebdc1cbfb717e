//! Cometprobe CLI library
//!
//! The GreenComet acceptance scenario and everything around it: the page
//! object tree with typed expected values, the ordered steps, a runner with
//! a JSON report, and a simulated app for running without a browser.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod greencomet;
pub mod handlers;
pub mod logging;
mod output;
mod runner;
pub mod scenario;
pub mod simulation;

pub use commands::{Cli, ColorArg, Commands, ListArgs, RunArgs, TreeArgs};
pub use config::{ColorChoice, DeviceKind, Expectations, RunConfig, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{print_report, summary_line, OutputFormat, ProgressReporter};
pub use runner::{ScenarioReport, ScenarioRunner, StepOutcome, StepResult};
pub use scenario::{ScenarioContext, Step};
pub use simulation::{simulate, SimulationOptions};
