//! CLI configuration
//!
//! A run is configured in three layers, later layers winning:
//! built-in defaults, an optional YAML file, then command-line flags (each
//! flag also reads a `COMETPROBE_*` environment variable).

use clap::ValueEnum;
use cometprobe::{DeviceDescriptor, DriverConfig, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter for this level when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info,cometprobe=debug",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Device profile the scenario runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// 1920x1080 desktop
    #[default]
    Desktop,
    /// Phone-sized touch viewport
    Mobile,
}

impl DeviceKind {
    /// Device descriptor for emulation
    #[must_use]
    pub const fn descriptor(self) -> DeviceDescriptor {
        match self {
            Self::Desktop => DeviceDescriptor::DESKTOP_1080P,
            Self::Mobile => DeviceDescriptor::IPHONE_14_PRO,
        }
    }

    /// Whether this is a mobile profile
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// Values the GreenComet scenario compares the live UI against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectations {
    /// Document title
    pub title: String,
    /// Credit logos in the bottom bar
    pub credit_icon_count: usize,
    /// Images in the expanded folder view
    pub folder_image_count: usize,
    /// Folder header text pattern while expanded
    pub expanded_header_text: String,
    /// Folder header text pattern while contracted
    pub contracted_header_text: String,
    /// Tabs in the info sheet
    pub tab_count: usize,
    /// Location/time label pattern in the control panel
    pub selected_location_time_text: String,
    /// "Center on now" button text pattern
    pub center_on_now_text: String,
    /// "Play comet images" button text pattern
    pub play_comet_images_text: String,
    /// "Use my location" button text pattern
    pub use_my_location_text: String,
    /// Location dialog instruction text pattern
    pub action_text: String,
    /// Main content height as a fraction of the viewport while the info sheet is open
    pub main_content_height_ratio: f64,
    /// Allowed deviation for size checks, in pixels
    pub size_tolerance_px: f64,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            title: "Green Comet".to_string(),
            credit_icon_count: 4,
            folder_image_count: 12,
            expanded_header_text: "(?i)hide images".to_string(),
            contracted_header_text: "(?i)show images".to_string(),
            tab_count: 2,
            selected_location_time_text: "(?i)selected location".to_string(),
            center_on_now_text: "(?i)center on now".to_string(),
            play_comet_images_text: "(?i)play comet images".to_string(),
            use_my_location_text: "(?i)use my location".to_string(),
            action_text: "(?i)select a location".to_string(),
            main_content_height_ratio: 0.66,
            size_tolerance_px: 2.0,
        }
    }
}

/// Complete configuration for one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// URL of the GreenComet app
    pub url: String,
    /// Device profile
    pub device: DeviceKind,
    /// Run the browser headless
    pub headless: bool,
    /// Chromium executable override
    pub executable_path: Option<String>,
    /// Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Readiness timeout in milliseconds
    pub ready_timeout_ms: u64,
    /// Readiness poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Where checkpoint screenshots go; none keeps them in memory
    pub snapshot_dir: Option<PathBuf>,
    /// JSON report destination
    pub report_path: Option<PathBuf>,
    /// Keep running steps after a failure
    pub keep_going: bool,
    /// Only run steps whose name contains one of these (case-insensitive)
    pub steps: Vec<String>,
    /// Expected values
    pub expectations: Expectations,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            device: DeviceKind::Desktop,
            headless: true,
            executable_path: None,
            sandbox: true,
            ready_timeout_ms: 30_000,
            poll_interval_ms: 50,
            snapshot_dir: None,
            report_path: None,
            keep_going: false,
            steps: Vec::new(),
            expectations: Expectations::default(),
        }
    }
}

impl RunConfig {
    /// Load from a YAML file; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// I/O errors, malformed YAML, or values rejected by [`Self::validate`].
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text
    ///
    /// # Errors
    ///
    /// Malformed YAML or invalid values.
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can use
    ///
    /// # Errors
    ///
    /// [`CliError::Config`] naming the offending key.
    pub fn validate(&self) -> CliResult<()> {
        if self.url.trim().is_empty() {
            return Err(CliError::config("url must not be empty"));
        }
        if self.ready_timeout_ms == 0 {
            return Err(CliError::config("ready_timeout_ms must be positive"));
        }
        if self.poll_interval_ms == 0 {
            return Err(CliError::config("poll_interval_ms must be positive"));
        }
        let ratio = self.expectations.main_content_height_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(CliError::config(format!(
                "expectations.main_content_height_ratio must be in (0, 1], got {ratio}"
            )));
        }
        Ok(())
    }

    /// Readiness wait options
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.ready_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Browser launch configuration
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        let mut config = self.device.descriptor().to_config().headless(self.headless);
        if let Some(path) = &self.executable_path {
            config = config.executable_path(path.clone());
        }
        if !self.sandbox {
            config = config.no_sandbox();
        }
        config
    }

    /// Whether a step passes the name filter
    #[must_use]
    pub fn selects_step(&self, name: &str) -> bool {
        if self.steps.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        self.steps
            .iter()
            .any(|pattern| name.contains(&pattern.to_lowercase()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_log_filter() {
            assert_eq!(Verbosity::Quiet.log_filter(), "error");
            assert!(Verbosity::Verbose.log_filter().contains("cometprobe=debug"));
        }

        #[test]
        fn test_color_choice() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod run_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = RunConfig::default();
            assert_eq!(config.device, DeviceKind::Desktop);
            assert_eq!(config.wait_options().timeout_ms, 30_000);
            assert_eq!(config.expectations.folder_image_count, 12);
            config.validate().unwrap();
        }

        #[test]
        fn test_yaml_overrides_defaults() {
            let config = RunConfig::from_yaml(
                "url: http://localhost:5173\ndevice: mobile\nexpectations:\n  folder_image_count: 8\n",
            )
            .unwrap();
            assert_eq!(config.url, "http://localhost:5173");
            assert!(config.device.is_mobile());
            assert_eq!(config.expectations.folder_image_count, 8);
            assert_eq!(config.expectations.tab_count, 2);
        }

        #[test]
        fn test_unknown_key_rejected() {
            assert!(matches!(
                RunConfig::from_yaml("colour: red\n"),
                Err(CliError::Yaml(_))
            ));
        }

        #[test]
        fn test_invalid_values_rejected() {
            assert!(matches!(
                RunConfig::from_yaml("poll_interval_ms: 0\n"),
                Err(CliError::Config { .. })
            ));
            assert!(matches!(
                RunConfig::from_yaml("expectations:\n  main_content_height_ratio: 1.5\n"),
                Err(CliError::Config { .. })
            ));
        }

        #[test]
        fn test_driver_config_follows_device() {
            let config = RunConfig {
                device: DeviceKind::Mobile,
                sandbox: false,
                ..RunConfig::default()
            };
            let driver = config.driver_config();
            assert!(driver.is_mobile);
            assert!(!driver.sandbox);
            assert_eq!(driver.viewport_width, 393);
        }

        #[test]
        fn test_step_filter() {
            let mut config = RunConfig::default();
            assert!(config.selects_step("Open video"));
            config.steps = vec!["video".to_string()];
            assert!(config.selects_step("Open video"));
            assert!(!config.selects_step("Info text"));
        }

        #[test]
        fn test_load_missing_file() {
            let err = RunConfig::load(Path::new("/nonexistent/cometprobe.yaml")).unwrap_err();
            assert!(err.to_string().contains("cannot read"));
        }
    }
}
