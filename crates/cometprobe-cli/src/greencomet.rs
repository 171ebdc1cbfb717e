//! GreenComet page object
//!
//! The whole app is one page: a root section holding the top-level dialogs
//! and splash screen, plus one child section per UI region. Expected values
//! live in typed props on the section they describe, compiled from
//! [`Expectations`](crate::config::Expectations) when the page is built.

use cometprobe::{
    PageBuilder, PageRoot, ReadinessSignal, Section, SectionBuilder, Selector, Session,
    SnapshotStore,
};
use regex::Regex;

use crate::config::{Expectations, RunConfig};
use crate::error::{CliError, CliResult};

/// Root section name
pub const APP: &str = "app";
/// Top bar with the video, text and map icons
pub const TOP_CONTENT: &str = "topContent";
/// Bottom bar with playback controls and credits
pub const BOTTOM_CONTENT: &str = "bottomContent";
/// Comet image strip
pub const FOLDER_VIEW: &str = "folderView";
/// Control panel
pub const CONTROLS: &str = "controls";
/// Video dialog
pub const VIDEO_DIALOG: &str = "videoDialog";
/// Info sheet with its two tabs
pub const INFO_SHEET: &str = "infoSheet";
/// Location selector dialog
pub const LOCATION_DIALOG: &str = "locationDialog";

/// Page element the app is ready on
pub const READY_ELEMENT: &str = "mainContent";

/// GreenComet section type
pub type GreenCometSection = Section<GreenCometProps>;
/// GreenComet page type
pub type GreenCometPage = PageRoot<GreenCometProps>;

/// Expected values attached to the app root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppProps {
    /// Document title
    pub title: String,
}

/// Expected values for the bottom bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottomContentProps {
    /// Number of credit logos
    pub credit_icon_count: usize,
}

/// Expected values for the folder view
#[derive(Debug, Clone)]
pub struct FolderViewProps {
    /// Images shown while expanded
    pub folder_image_count: usize,
    /// Header text while expanded
    pub expanded_header_text: Regex,
    /// Header text while contracted
    pub contracted_header_text: Regex,
}

/// Expected values for the control panel
#[derive(Debug, Clone)]
pub struct ControlsProps {
    /// Location/time label
    pub selected_location_time_text: Regex,
    /// "Center on now" button
    pub center_on_now_text: Regex,
    /// "Play comet images" button
    pub play_comet_images_text: Regex,
}

/// Expected values for the info sheet
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSheetProps {
    /// Number of tab headers
    pub tab_count: usize,
    /// Main content height as a fraction of the document height while open
    pub main_content_height_ratio: f64,
    /// Allowed deviation in pixels
    pub size_tolerance_px: f64,
}

/// Expected values for the location dialog
#[derive(Debug, Clone)]
pub struct LocationDialogProps {
    /// "Use my location" button
    pub use_my_location_text: Regex,
    /// Instruction text
    pub action_text: Regex,
}

/// Per-section expected values
#[derive(Debug, Clone, Default)]
pub enum GreenCometProps {
    /// App root
    App(AppProps),
    /// Bottom bar
    BottomContent(BottomContentProps),
    /// Folder view
    FolderView(FolderViewProps),
    /// Control panel
    Controls(ControlsProps),
    /// Info sheet
    InfoSheet(InfoSheetProps),
    /// Location dialog
    LocationDialog(LocationDialogProps),
    /// Sections without expected values
    #[default]
    Plain,
}

impl GreenCometProps {
    /// Variant name, used in mismatch errors
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::App(_) => "App",
            Self::BottomContent(_) => "BottomContent",
            Self::FolderView(_) => "FolderView",
            Self::Controls(_) => "Controls",
            Self::InfoSheet(_) => "InfoSheet",
            Self::LocationDialog(_) => "LocationDialog",
            Self::Plain => "Plain",
        }
    }
}

fn mismatch(section: &GreenCometSection, expected: &'static str) -> CliError {
    CliError::PropsMismatch {
        section: section.path().to_string(),
        expected,
    }
}

/// App root props
///
/// # Errors
///
/// [`CliError::PropsMismatch`] for any other section.
pub fn app_props(section: &GreenCometSection) -> CliResult<&AppProps> {
    match section.props() {
        GreenCometProps::App(props) => Ok(props),
        _ => Err(mismatch(section, "App")),
    }
}

/// Bottom bar props
///
/// # Errors
///
/// [`CliError::PropsMismatch`] for any other section.
pub fn bottom_content_props(section: &GreenCometSection) -> CliResult<&BottomContentProps> {
    match section.props() {
        GreenCometProps::BottomContent(props) => Ok(props),
        _ => Err(mismatch(section, "BottomContent")),
    }
}

/// Folder view props
///
/// # Errors
///
/// [`CliError::PropsMismatch`] for any other section.
pub fn folder_view_props(section: &GreenCometSection) -> CliResult<&FolderViewProps> {
    match section.props() {
        GreenCometProps::FolderView(props) => Ok(props),
        _ => Err(mismatch(section, "FolderView")),
    }
}

/// Control panel props
///
/// # Errors
///
/// [`CliError::PropsMismatch`] for any other section.
pub fn controls_props(section: &GreenCometSection) -> CliResult<&ControlsProps> {
    match section.props() {
        GreenCometProps::Controls(props) => Ok(props),
        _ => Err(mismatch(section, "Controls")),
    }
}

/// Info sheet props
///
/// # Errors
///
/// [`CliError::PropsMismatch`] for any other section.
pub fn info_sheet_props(section: &GreenCometSection) -> CliResult<&InfoSheetProps> {
    match section.props() {
        GreenCometProps::InfoSheet(props) => Ok(props),
        _ => Err(mismatch(section, "InfoSheet")),
    }
}

/// Location dialog props
///
/// # Errors
///
/// [`CliError::PropsMismatch`] for any other section.
pub fn location_dialog_props(section: &GreenCometSection) -> CliResult<&LocationDialogProps> {
    match section.props() {
        GreenCometProps::LocationDialog(props) => Ok(props),
        _ => Err(mismatch(section, "LocationDialog")),
    }
}

fn pattern(key: &str, source: &str) -> CliResult<Regex> {
    Regex::new(source).map_err(|e| CliError::config(format!("expectations.{key}: {e}")))
}

fn css(selector: &str) -> Selector {
    Selector::css(selector)
}

fn top_content() -> SectionBuilder<GreenCometProps> {
    SectionBuilder::new(TOP_CONTENT)
        .root(css("#top-content"))
        .element("videoIcon", css("#video-icon"))
        .element("textIcon", css("#text-icon"))
        .element("mapIcon", css("#map-icon"))
}

fn bottom_content(ex: &Expectations) -> SectionBuilder<GreenCometProps> {
    SectionBuilder::with_props(
        BOTTOM_CONTENT,
        GreenCometProps::BottomContent(BottomContentProps {
            credit_icon_count: ex.credit_icon_count,
        }),
    )
    .root(css("#bottom-content"))
    .element("playPauseIcon", css("#play-pause-icon"))
    .element("slider", css("#slider"))
    .element("creditIcon", css(".credit-icon"))
}

fn folder_view(ex: &Expectations) -> CliResult<SectionBuilder<GreenCometProps>> {
    let props = FolderViewProps {
        folder_image_count: ex.folder_image_count,
        expanded_header_text: pattern("expanded_header_text", &ex.expanded_header_text)?,
        contracted_header_text: pattern("contracted_header_text", &ex.contracted_header_text)?,
    };
    Ok(
        SectionBuilder::with_props(FOLDER_VIEW, GreenCometProps::FolderView(props))
            .root(css("#folder-view"))
            .element("folderItem", css(".folder-item"))
            .element("expandRow", css(".expand-row"))
            .element("expandHeader", css(".expand-row span"))
            .element("expandChevron", css(".expand-row svg")),
    )
}

fn controls(ex: &Expectations) -> CliResult<SectionBuilder<GreenCometProps>> {
    let props = ControlsProps {
        selected_location_time_text: pattern(
            "selected_location_time_text",
            &ex.selected_location_time_text,
        )?,
        center_on_now_text: pattern("center_on_now_text", &ex.center_on_now_text)?,
        play_comet_images_text: pattern("play_comet_images_text", &ex.play_comet_images_text)?,
    };
    Ok(
        SectionBuilder::with_props(CONTROLS, GreenCometProps::Controls(props))
            .root(css("#controls"))
            .element("topRow", css("#top-row"))
            .element("openCloseButton", css("#top-row svg"))
            .element("gridCheckbox", css("#grid-checkbox"))
            .element("gridInput", css("#grid-checkbox input"))
            .element("constellationsCheckbox", css("#constellations-checkbox"))
            .element("constellationsInput", css("#constellations-checkbox input"))
            .element("horizonCheckbox", css("#horizon-checkbox"))
            .element("horizonInput", css("#horizon-checkbox input"))
            .element("selectedLocationTimeLabel", css("#selected-location-time-label"))
            .element("selectedLocationTimeInput", css("#selected-location-time-input"))
            .element("timeIcon", css("#time-icon"))
            .element("centerOnNowButton", css("#center-now-button"))
            .element("centerOnNowButtonContent", css("#center-now-button .v-btn__content"))
            .element("playCometImagesButton", css("#play-comet-images-button"))
            .element(
                "playCometImagesContent",
                css("#play-comet-images-button .v-btn__content"),
            ),
    )
}

fn video_dialog() -> SectionBuilder<GreenCometProps> {
    SectionBuilder::new(VIDEO_DIALOG)
        .root(css("#video-container"))
        .element("video", css("video"))
        .element("closeIcon", css(".close-icon"))
}

fn info_sheet(ex: &Expectations) -> SectionBuilder<GreenCometProps> {
    SectionBuilder::with_props(
        INFO_SHEET,
        GreenCometProps::InfoSheet(InfoSheetProps {
            tab_count: ex.tab_count,
            main_content_height_ratio: ex.main_content_height_ratio,
            size_tolerance_px: ex.size_tolerance_px,
        }),
    )
    .root(css("#info-sheet"))
    .element("closeIcon", css(".close-icon"))
    .element("tabHeader", css(".v-tab"))
    .element("infoTabHeader", css("#info-tab"))
    .element("wwtTabHeader", css("#wwt-tab"))
    .element("infoText", css("#info-text"))
    .element("wwtText", css("#wwt-text"))
}

fn location_dialog(ex: &Expectations) -> CliResult<SectionBuilder<GreenCometProps>> {
    let props = LocationDialogProps {
        use_my_location_text: pattern("use_my_location_text", &ex.use_my_location_text)?,
        action_text: pattern("action_text", &ex.action_text)?,
    };
    Ok(
        SectionBuilder::with_props(LOCATION_DIALOG, GreenCometProps::LocationDialog(props))
            .root(css("#location-dialog"))
            .element("useMyLocationButton", css("#use-my-location"))
            .element(
                "useMyLocationButtonContent",
                css("#use-my-location .v-btn__content"),
            )
            .element("mapContainer", css("#map-container"))
            .element("actionText", css("#action-text")),
    )
}

/// Declare the GreenComet section tree
///
/// # Errors
///
/// [`CliError::Config`] when an expected-text pattern is not a valid regex.
pub fn app_section(ex: &Expectations) -> CliResult<SectionBuilder<GreenCometProps>> {
    Ok(SectionBuilder::with_props(
        APP,
        GreenCometProps::App(AppProps {
            title: ex.title.clone(),
        }),
    )
    .element("mainContent", css("#main-content"))
    .element("splashScreen", css("#splash-screen"))
    .element("splashClose", css("#close-splash-button"))
    .element("videoDialog", css("#video-container"))
    .element("locationDialog", css("#location-dialog"))
    .element("infoSheet", css("#info-sheet"))
    .element("documentRoot", css("html"))
    .child(top_content())
    .child(bottom_content(ex))
    .child(folder_view(ex)?)
    .child(controls(ex)?)
    .child(video_dialog())
    .child(info_sheet(ex))
    .child(location_dialog(ex)?))
}

/// Page builder for a run, without binding a session
///
/// # Errors
///
/// Invalid patterns, or a snapshot directory that cannot be created.
pub fn page_builder(config: &RunConfig) -> CliResult<PageBuilder<GreenCometProps>> {
    let mut builder = PageBuilder::new(app_section(&config.expectations)?)
        .url(config.url.clone())
        .ready_when(ReadinessSignal::ElementVisible(READY_ELEMENT.to_string()))
        .wait_options(config.wait_options());
    if let Some(dir) = &config.snapshot_dir {
        builder = builder.snapshot_store(SnapshotStore::create(dir)?);
    }
    Ok(builder)
}

/// Build the GreenComet page bound to a live session
///
/// # Errors
///
/// See [`page_builder`]; also any page build error.
pub fn build_page(session: Session, config: &RunConfig) -> CliResult<GreenCometPage> {
    Ok(page_builder(config)?.build(session)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cometprobe::{MockDriver, ProbeError};
    use std::sync::Arc;

    fn page() -> GreenCometPage {
        let session: Session = Arc::new(MockDriver::new());
        build_page(session, &RunConfig::default()).unwrap()
    }

    mod tree_tests {
        use super::*;

        #[test]
        fn test_all_sections_declared() {
            let page = page();
            assert_eq!(
                page.section_names(),
                vec![
                    TOP_CONTENT,
                    BOTTOM_CONTENT,
                    FOLDER_VIEW,
                    CONTROLS,
                    VIDEO_DIALOG,
                    INFO_SHEET,
                    LOCATION_DIALOG,
                ]
            );
        }

        #[test]
        fn test_locators_scoped_under_section_roots() {
            let page = page();
            let controls = page.section(CONTROLS).unwrap();
            assert_eq!(
                controls.locator("gridInput").unwrap().to_string(),
                "css=#controls #grid-checkbox input"
            );
            assert_eq!(
                page.locator("documentRoot").unwrap().to_string(),
                "css=html"
            );
        }

        #[test]
        fn test_same_name_in_sibling_sections() {
            let page = page();
            let video = page.section(VIDEO_DIALOG).unwrap().locator("closeIcon").unwrap();
            let info = page.section(INFO_SHEET).unwrap().locator("closeIcon").unwrap();
            assert_ne!(video, info);
        }

        #[test]
        fn test_app_does_not_see_section_elements() {
            let page = page();
            assert!(matches!(
                page.locator("gridInput"),
                Err(ProbeError::UnknownElement { .. })
            ));
        }

        #[test]
        fn test_readiness_on_main_content() {
            let page = page();
            assert_eq!(
                page.readiness_signal().map(ReadinessSignal::element),
                Some(READY_ELEMENT)
            );
            assert_eq!(page.url(), Some("http://localhost:8080"));
        }
    }

    mod props_tests {
        use super::*;

        #[test]
        fn test_typed_accessors() {
            let page = page();
            assert_eq!(app_props(&page).unwrap().title, "Green Comet");
            let folder = folder_view_props(page.section(FOLDER_VIEW).unwrap()).unwrap();
            assert_eq!(folder.folder_image_count, 12);
            assert!(folder.expanded_header_text.is_match("Hide Images"));
            assert!(folder.contracted_header_text.is_match("SHOW IMAGES"));
            let info = info_sheet_props(page.section(INFO_SHEET).unwrap()).unwrap();
            assert_eq!(info.tab_count, 2);
        }

        #[test]
        fn test_mismatch_names_section() {
            let page = page();
            let top = page.section(TOP_CONTENT).unwrap();
            assert_eq!(top.props().kind(), "Plain");
            let err = controls_props(top).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Section 'app/topContent' has no Controls props"
            );
        }

        #[test]
        fn test_invalid_pattern_is_config_error() {
            let mut config = RunConfig::default();
            config.expectations.action_text = "(unclosed".to_string();
            let session: Session = Arc::new(MockDriver::new());
            let err = build_page(session, &config).unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
            assert!(err.to_string().contains("expectations.action_text"));
        }

        #[test]
        fn test_snapshot_dir_creates_store() {
            let dir = tempfile::tempdir().unwrap();
            let config = RunConfig {
                snapshot_dir: Some(dir.path().join("shots")),
                ..RunConfig::default()
            };
            let session: Session = Arc::new(MockDriver::new());
            let page = build_page(session, &config).unwrap();
            assert!(page.snapshots().is_some());
            assert!(dir.path().join("shots").is_dir());
        }
    }
}
