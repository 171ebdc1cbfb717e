//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{DeviceKind, RunConfig, Verbosity};
use crate::error::CliResult;
use crate::logging::LogFormat;
use crate::output::OutputFormat;

/// Cometprobe: GreenComet acceptance scenarios over page objects
#[derive(Parser, Debug)]
#[command(name = "cometprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "COMETPROBE_LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Verbosity from `-q` and `-v`
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Log format from `--log-json`
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acceptance scenario
    Run(RunArgs),

    /// List scenario steps
    List(ListArgs),

    /// Print the page object tree with resolved selectors
    Tree(TreeArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// YAML configuration file
    #[arg(short, long, env = "COMETPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// URL of the app under test
    #[arg(long, env = "COMETPROBE_URL")]
    pub url: Option<String>,

    /// Device profile
    #[arg(long, value_enum, env = "COMETPROBE_DEVICE")]
    pub device: Option<DeviceKind>,

    /// Show the browser window
    #[arg(long, env = "COMETPROBE_HEADED")]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "COMETPROBE_CHROME")]
    pub chrome: Option<String>,

    /// Disable the Chromium sandbox (containers)
    #[arg(long, env = "COMETPROBE_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Readiness timeout in milliseconds
    #[arg(long)]
    pub ready_timeout: Option<u64>,

    /// Readiness poll interval in milliseconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Directory for checkpoint screenshots
    #[arg(long, env = "COMETPROBE_SNAPSHOT_DIR")]
    pub snapshots: Option<PathBuf>,

    /// Write the JSON report here
    #[arg(long, env = "COMETPROBE_REPORT")]
    pub report: Option<PathBuf>,

    /// Keep running after a failed step
    #[arg(long)]
    pub keep_going: bool,

    /// Only run steps whose name contains this (repeatable)
    #[arg(short, long = "step")]
    pub steps: Vec<String>,

    /// Run against the simulated app instead of a browser
    #[arg(long)]
    pub simulate: bool,

    /// Simulated app with a video dialog that never closes
    #[arg(long, hide = true, requires = "simulate")]
    pub break_video: bool,

    /// Result output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Apply flag and environment overrides on top of `base`
    #[must_use]
    pub fn apply(&self, mut base: RunConfig) -> RunConfig {
        if let Some(url) = &self.url {
            base.url.clone_from(url);
        }
        if let Some(device) = self.device {
            base.device = device;
        }
        if self.headed {
            base.headless = false;
        }
        if let Some(chrome) = &self.chrome {
            base.executable_path = Some(chrome.clone());
        }
        if self.no_sandbox {
            base.sandbox = false;
        }
        if let Some(ms) = self.ready_timeout {
            base.ready_timeout_ms = ms;
        }
        if let Some(ms) = self.poll_interval {
            base.poll_interval_ms = ms;
        }
        if let Some(dir) = &self.snapshots {
            base.snapshot_dir = Some(dir.clone());
        }
        if let Some(path) = &self.report {
            base.report_path = Some(path.clone());
        }
        if self.keep_going {
            base.keep_going = true;
        }
        if !self.steps.is_empty() {
            base.steps.clone_from(&self.steps);
        }
        base
    }

    /// Resolve the final configuration: defaults, file, then flags
    ///
    /// # Errors
    ///
    /// Unreadable or invalid config file, or invalid overridden values.
    pub fn resolve(&self) -> CliResult<RunConfig> {
        let base = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Mark steps whose name contains this (repeatable)
    #[arg(short, long = "step")]
    pub steps: Vec<String>,
}

/// Arguments for the tree command
#[derive(Parser, Debug, Default)]
pub struct TreeArgs {
    /// YAML configuration file
    #[arg(short, long, env = "COMETPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only print this section (slash-separated path)
    #[arg(long)]
    pub section: Option<String>,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["cometprobe", "run"]);
            assert!(matches!(cli.command, Commands::Run(_)));
            assert_eq!(cli.verbosity(), Verbosity::Normal);
        }

        #[test]
        fn test_parse_run_flags() {
            let cli = Cli::parse_from([
                "cometprobe",
                "run",
                "--url",
                "http://localhost:5173",
                "--device",
                "mobile",
                "--step",
                "video",
                "-s",
                "folder",
                "--keep-going",
                "--simulate",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.url.as_deref(), Some("http://localhost:5173"));
            assert_eq!(args.device, Some(DeviceKind::Mobile));
            assert_eq!(args.steps, vec!["video", "folder"]);
            assert!(args.keep_going);
            assert!(args.simulate);
        }

        #[test]
        fn test_break_video_requires_simulate() {
            assert!(Cli::try_parse_from(["cometprobe", "run", "--break-video"]).is_err());
            assert!(
                Cli::try_parse_from(["cometprobe", "run", "--simulate", "--break-video"]).is_ok()
            );
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from(["cometprobe", "tree", "-vv", "--color", "never"]);
            assert_eq!(cli.verbosity(), Verbosity::Debug);
            assert_eq!(ColorChoice::from(cli.color), ColorChoice::Never);
        }

        #[test]
        fn test_quiet_wins_over_verbose() {
            let cli = Cli::parse_from(["cometprobe", "-q", "-v", "list"]);
            assert!(cli.verbosity().is_quiet());
        }

        #[test]
        fn test_parse_tree_section() {
            let cli = Cli::parse_from(["cometprobe", "tree", "--section", "controls"]);
            let Commands::Tree(args) = cli.command else {
                panic!("expected Tree command");
            };
            assert_eq!(args.section.as_deref(), Some("controls"));
        }

        #[test]
        fn test_format_json() {
            let cli = Cli::parse_from(["cometprobe", "run", "--format", "json"]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.format, OutputFormat::Json);
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_flags_override_file_values() {
            let base = RunConfig {
                url: "http://from-file".to_string(),
                ready_timeout_ms: 5_000,
                ..RunConfig::default()
            };
            let args = RunArgs {
                url: Some("http://from-flag".to_string()),
                headed: true,
                no_sandbox: true,
                poll_interval: Some(10),
                ..RunArgs::default()
            };
            let config = args.apply(base);
            assert_eq!(config.url, "http://from-flag");
            assert_eq!(config.ready_timeout_ms, 5_000);
            assert_eq!(config.poll_interval_ms, 10);
            assert!(!config.headless);
            assert!(!config.sandbox);
        }

        #[test]
        fn test_resolve_reads_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cometprobe.yaml");
            std::fs::write(&path, "device: mobile\nkeep_going: true\n").unwrap();
            let args = RunArgs {
                config: Some(path),
                ..RunArgs::default()
            };
            let config = args.resolve().unwrap();
            assert!(config.device.is_mobile());
            assert!(config.keep_going);
        }

        #[test]
        fn test_resolve_rejects_zero_timeout() {
            let args = RunArgs {
                ready_timeout: Some(0),
                ..RunArgs::default()
            };
            assert!(args.resolve().is_err());
        }
    }
}
