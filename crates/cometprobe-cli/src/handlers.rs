//! Subcommand handlers

use cometprobe::{MockDriver, PageBuilder, Session};
use std::sync::Arc;
use tracing::{info, warn};

use crate::commands::{ListArgs, RunArgs, TreeArgs};
use crate::config::{ColorChoice, RunConfig, Verbosity};
use crate::error::{CliError, CliResult};
use crate::greencomet::{build_page, GreenCometPage, GreenCometProps};
use crate::output::{print_report, ProgressReporter};
use crate::runner::{ScenarioReport, ScenarioRunner};
use crate::scenario::{self, ScenarioContext};
use crate::simulation::{simulate, SimulationOptions};

/// Bind the page tree to a session, closing the session if binding fails
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn attach(
    session: Session,
    builder: PageBuilder<GreenCometProps>,
) -> CliResult<GreenCometPage> {
    match builder.build(Arc::clone(&session)) {
        Ok(page) => Ok(page),
        Err(e) => {
            if let Err(close) = session.close().await {
                warn!(error = %close, "closing the browser failed");
            }
            Err(e.into())
        }
    }
}

#[cfg(feature = "browser")]
async fn launch(config: &RunConfig) -> CliResult<GreenCometPage> {
    // Config errors surface before a browser exists
    let builder = crate::greencomet::page_builder(config)?;
    let driver = cometprobe::ChromiumDriver::launch(config.driver_config()).await?;
    attach(Arc::new(driver), builder).await
}

#[cfg(not(feature = "browser"))]
async fn launch(_config: &RunConfig) -> CliResult<GreenCometPage> {
    Err(CliError::invalid_argument(
        "built without the `browser` feature; rerun with --simulate",
    ))
}

/// Run the scenario and return its report
///
/// # Errors
///
/// Configuration or launch errors, report I/O errors, and
/// [`CliError::ScenarioFailed`] when any step did not pass.
pub async fn run_scenario(
    args: &RunArgs,
    verbosity: Verbosity,
    color: ColorChoice,
) -> CliResult<ScenarioReport> {
    let config = args.resolve()?;
    let steps = scenario::select(scenario::steps(), |name| config.selects_step(name));
    if steps.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no step matches {:?}",
            config.steps
        )));
    }

    let page = if args.simulate {
        let options = SimulationOptions {
            broken_video_close: args.break_video,
            ..SimulationOptions::default()
        };
        let (_, page) = simulate(&config, options)?;
        page
    } else {
        launch(&config).await?
    };
    info!(url = %config.url, device = ?config.device, simulated = args.simulate, steps = steps.len(), "scenario starting");

    let reporter = ProgressReporter::new(color.should_color(), verbosity.is_quiet());
    let mut runner = ScenarioRunner::new(reporter, config.keep_going);
    let mut ctx = ScenarioContext::new(page, config.device.is_mobile());
    let report = runner
        .run(
            &mut ctx,
            &steps,
            ScenarioReport::new(config.url.clone(), config.device),
        )
        .await;

    if let Err(e) = ctx.page.session().close().await {
        warn!(error = %e, "closing the browser failed");
    }
    if let Some(store) = ctx.page.snapshots() {
        info!(count = store.entries().len(), manifest = %store.manifest_path().display(), "snapshots saved");
    }
    if let Some(path) = &config.report_path {
        report.write_json(path)?;
    }
    print_report(&report, args.format)?;
    report.into_result()
}

/// Print the step names, numbered, one per line
pub fn list_steps(args: &ListArgs) -> Vec<String> {
    let filter = RunConfig {
        steps: args.steps.clone(),
        ..RunConfig::default()
    };
    scenario::steps()
        .iter()
        .enumerate()
        .filter(|(_, step)| filter.selects_step(step.name))
        .map(|(i, step)| format!("{:>2}. {}", i + 1, step.name))
        .collect()
}

/// Render the page object tree, or one section of it
///
/// # Errors
///
/// Invalid config file or an unknown section path.
pub fn render_tree(args: &TreeArgs) -> CliResult<String> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    config.snapshot_dir = None;
    let session: Session = Arc::new(MockDriver::new());
    let page = build_page(session, &config)?;
    match &args.section {
        Some(path) => Ok(page.section_path(path)?.describe()),
        None => Ok(page.describe()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::greencomet::page_builder;
    use cometprobe::{ProbeError, ReadinessSignal};

    #[test]
    fn test_list_all_steps() {
        let lines = list_steps(&ListArgs::default());
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], " 1. Navigation and loading");
        assert_eq!(lines[6], " 7. Control Panel");
    }

    #[test]
    fn test_list_filtered_keeps_numbers() {
        let lines = list_steps(&ListArgs {
            steps: vec!["FOLDER".to_string()],
        });
        assert_eq!(lines, vec![" 6. Folder View"]);
    }

    #[test]
    fn test_tree_whole_page() {
        let tree = render_tree(&TreeArgs::default()).unwrap();
        assert!(tree.starts_with("app\n"));
        assert!(tree.contains("  controls [css=#controls]"));
        assert!(tree.contains("- gridInput: css=#controls #grid-checkbox input"));
    }

    #[test]
    fn test_tree_one_section() {
        let tree = render_tree(&TreeArgs {
            section: Some("videoDialog".to_string()),
            ..TreeArgs::default()
        })
        .unwrap();
        assert!(tree.starts_with("videoDialog [css=#video-container]"));
        assert!(!tree.contains("controls"));
    }

    #[test]
    fn test_tree_unknown_section() {
        let err = render_tree(&TreeArgs {
            section: Some("sidebar".to_string()),
            ..TreeArgs::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::Probe(ProbeError::UnknownSection { .. })
        ));
    }

    #[tokio::test]
    async fn test_attach_closes_session_on_build_error() {
        let mock = Arc::new(MockDriver::new());
        let session: Session = mock.clone();
        let builder = page_builder(&RunConfig::default())
            .unwrap()
            .ready_when(ReadinessSignal::ElementVisible("missing".to_string()));
        let err = attach(session, builder).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Probe(ProbeError::UnknownElement { .. })
        ));
        assert!(mock.is_closed());
    }

    #[tokio::test]
    async fn test_attach_leaves_session_open() {
        let mock = Arc::new(MockDriver::new());
        let session: Session = mock.clone();
        let page = attach(session, page_builder(&RunConfig::default()).unwrap())
            .await
            .unwrap();
        assert_eq!(page.name(), "app");
        assert!(!mock.is_closed());
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    async fn test_launch_rejects_bad_config_before_starting_browser() {
        let mut config = RunConfig::default();
        config.expectations.action_text = "(unclosed".to_string();
        config.executable_path = Some("/nonexistent/chromium".to_string());
        let err = launch(&config).await.unwrap_err();
        assert!(matches!(err, CliError::Config { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_run_unknown_step_filter() {
        let args = RunArgs {
            simulate: true,
            steps: vec!["nonexistent".to_string()],
            ..RunArgs::default()
        };
        let err = run_scenario(&args, Verbosity::Quiet, ColorChoice::Never)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }
}
