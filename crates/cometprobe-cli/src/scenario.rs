//! The GreenComet acceptance scenario
//!
//! Seven ordered steps. Each step borrows the shared [`ScenarioContext`]
//! mutably and leaves the UI in the state the next step expects: dialogs
//! closed, folder view expanded, control panel open (desktop) or closed
//! (mobile).

use cometprobe::expect::{
    expect_attribute, expect_count, expect_not_present, expect_not_visible, expect_present,
    expect_selected, expect_text_matches, expect_title, expect_visible,
};
use cometprobe::{expect_all_not_present, expect_all_visible, Key, ProbeError, Scope};
use futures::future::BoxFuture;
use tracing::info;

use crate::error::CliResult;
use crate::greencomet::{
    app_props, bottom_content_props, controls_props, folder_view_props, info_sheet_props,
    location_dialog_props, GreenCometPage, BOTTOM_CONTENT, CONTROLS, FOLDER_VIEW, INFO_SHEET,
    LOCATION_DIALOG, TOP_CONTENT, VIDEO_DIALOG,
};

/// Everything a control-panel check expects visible while open
pub const CONTROL_PANEL: [&str; 10] = [
    "topRow",
    "openCloseButton",
    "gridCheckbox",
    "constellationsCheckbox",
    "horizonCheckbox",
    "selectedLocationTimeLabel",
    "selectedLocationTimeInput",
    "timeIcon",
    "centerOnNowButton",
    "playCometImagesButton",
];

/// Panel contents removed from the DOM while the panel is closed
pub const CONTROL_PANEL_CONTENTS: [&str; 11] = [
    "gridCheckbox",
    "gridInput",
    "constellationsCheckbox",
    "constellationsInput",
    "horizonCheckbox",
    "horizonInput",
    "selectedLocationTimeLabel",
    "selectedLocationTimeInput",
    "timeIcon",
    "centerOnNowButton",
    "playCometImagesButton",
];

/// Shared state for one scenario run
#[derive(Debug)]
pub struct ScenarioContext {
    /// The bound page
    pub page: GreenCometPage,
    /// Whether the run emulates a phone (control panel starts closed)
    pub is_mobile: bool,
}

impl ScenarioContext {
    /// Wrap a built page
    #[must_use]
    pub const fn new(page: GreenCometPage, is_mobile: bool) -> Self {
        Self { page, is_mobile }
    }

    async fn checkpoint(&mut self, label: &str) -> CliResult<()> {
        let _ = self.page.snapshot(label).await?;
        Ok(())
    }
}

/// Step body
pub type StepFn = for<'a> fn(&'a mut ScenarioContext) -> BoxFuture<'a, CliResult<()>>;

/// One named scenario step
#[derive(Clone, Copy)]
pub struct Step {
    /// Display name
    pub name: &'static str,
    run: StepFn,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

impl Step {
    /// Create a step
    #[must_use]
    pub const fn new(name: &'static str, run: StepFn) -> Self {
        Self { name, run }
    }

    /// Run against the shared context
    ///
    /// # Errors
    ///
    /// The first failed check of the step.
    pub async fn run(&self, ctx: &mut ScenarioContext) -> CliResult<()> {
        info!(step = self.name, "step started");
        (self.run)(ctx).await
    }
}

/// All steps in execution order
#[must_use]
pub fn steps() -> Vec<Step> {
    vec![
        Step::new("Navigation and loading", navigation_and_loading),
        Step::new("Initial configuration", initial_configuration),
        Step::new("Open video", open_video),
        Step::new("Info text", info_text),
        Step::new("Location selector", location_selector),
        Step::new("Folder View", folder_view),
        Step::new("Control Panel", control_panel),
    ]
}

/// Steps kept by a name filter, order preserved
#[must_use]
pub fn select(steps: Vec<Step>, keep: impl Fn(&str) -> bool) -> Vec<Step> {
    steps.into_iter().filter(|step| keep(step.name)).collect()
}

async fn all_visible<S: Scope + ?Sized>(scope: &S, names: &[&str]) -> CliResult<()> {
    let _ = expect_all_visible(scope, names).await?.into_result()?;
    Ok(())
}

async fn all_not_present<S: Scope + ?Sized>(scope: &S, names: &[&str]) -> CliResult<()> {
    let _ = expect_all_not_present(scope, names).await?.into_result()?;
    Ok(())
}

fn navigation_and_loading(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        let _ = ctx
            .page
            .navigate(None)
            .await?
            .wait_for_ready_default()
            .await?;
        Ok(())
    })
}

fn initial_configuration(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        ctx.checkpoint("Initial configuration").await?;

        {
            let page = &ctx.page;
            let _ = expect_title(page, &app_props(page)?.title).await?;
            all_visible(page, &["splashScreen", "splashClose"]).await?;
            all_not_present(page, &["videoDialog", "locationDialog", "infoSheet"]).await?;

            page.click("splashClose").await?;
            all_not_present(page, &["splashScreen", "splashClose"]).await?;

            let top = page.section(TOP_CONTENT)?;
            all_visible(top, &["videoIcon", "textIcon", "mapIcon"]).await?;

            let bottom = page.section(BOTTOM_CONTENT)?;
            all_visible(bottom, &["playPauseIcon", "slider"]).await?;
            let credits = bottom_content_props(bottom)?.credit_icon_count;
            let _ = expect_count(bottom, "creditIcon", credits).await?;

            let folder = page.section(FOLDER_VIEW)?;
            let props = folder_view_props(folder)?;
            let _ = expect_count(folder, "folderItem", props.folder_image_count).await?;
            let _ = expect_text_matches(folder, "expandHeader", &props.expanded_header_text).await?;
            let _ = expect_attribute(folder, "expandChevron", "data-icon", "chevron-up").await?;
        }

        // The panel starts closed on phones; the Control Panel step covers it there.
        if ctx.is_mobile {
            return Ok(());
        }

        {
            let controls = ctx.page.section(CONTROLS)?;
            let props = controls_props(controls)?;
            let _ = expect_attribute(controls, "openCloseButton", "data-icon", "chevron-down").await?;
            let _ = expect_selected(controls, "gridInput", true).await?;
            let _ = expect_selected(controls, "constellationsInput", false).await?;
            let _ = expect_selected(controls, "horizonInput", false).await?;
            let _ = expect_text_matches(
                controls,
                "selectedLocationTimeLabel",
                &props.selected_location_time_text,
            )
            .await?;
            let _ = expect_text_matches(controls, "centerOnNowButtonContent", &props.center_on_now_text)
                .await?;
            let _ = expect_text_matches(
                controls,
                "playCometImagesContent",
                &props.play_comet_images_text,
            )
            .await?;
            all_visible(controls, &CONTROL_PANEL).await?;
        }

        ctx.checkpoint("Controls open").await?;
        ctx.page.section(CONTROLS)?.click("openCloseButton").await?;
        ctx.checkpoint("Controls closed").await?;
        ctx.page.section(CONTROLS)?.click("openCloseButton").await?;
        Ok(())
    })
}

fn open_video(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        {
            let page = &ctx.page;
            page.section(TOP_CONTENT)?.click("videoIcon").await?;
            expect_visible(page, "videoDialog").await?;
            all_visible(page.section(VIDEO_DIALOG)?, &["video", "closeIcon"]).await?;
        }
        ctx.checkpoint("Video open").await?;

        {
            let page = &ctx.page;
            page.section(VIDEO_DIALOG)?.click("closeIcon").await?;
            expect_not_present(page, "videoDialog").await?;
        }
        ctx.checkpoint("Video closed").await
    })
}

fn info_text(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        {
            let page = &ctx.page;
            page.section(TOP_CONTENT)?.click("textIcon").await?;
            expect_visible(page, "infoSheet").await?;

            let sheet = page.section(INFO_SHEET)?;
            all_visible(sheet, &["closeIcon", "infoTabHeader", "wwtTabHeader", "infoText"]).await?;
            expect_not_present(sheet, "wwtText").await?;
            let _ = expect_count(sheet, "tabHeader", info_sheet_props(sheet)?.tab_count).await?;
        }
        ctx.checkpoint("Info sheet open").await?;

        {
            let page = &ctx.page;
            let props = info_sheet_props(page.section(INFO_SHEET)?)?;
            // The html element spans the viewport, unlike the window size
            let document = page.element_size("documentRoot").await?;
            let content = page.element_size("mainContent").await?;
            let expected_height = props.main_content_height_ratio * document.height;
            if (content.height - expected_height).abs() >= props.size_tolerance_px {
                return Err(ProbeError::assertion(format!(
                    "app/mainContent: expected height {expected_height:.1} (±{}px), got {:.1}",
                    props.size_tolerance_px, content.height
                ))
                .into());
            }
            if (content.width - document.width).abs() >= props.size_tolerance_px {
                return Err(ProbeError::assertion(format!(
                    "app/mainContent: expected width {:.1}, got {:.1}",
                    document.width, content.width
                ))
                .into());
            }

            let sheet = page.section(INFO_SHEET)?;
            sheet.click("wwtTabHeader").await?;
            expect_present(sheet, "infoText").await?;
            expect_not_visible(sheet, "infoText").await?;
        }
        ctx.checkpoint("Info sheet - WWT Tab").await?;

        {
            let sheet = ctx.page.section(INFO_SHEET)?;
            sheet.click("infoTabHeader").await?;
            expect_present(sheet, "wwtText").await?;
            expect_not_visible(sheet, "wwtText").await?;
        }
        ctx.checkpoint("Info sheet - Info Tab").await?;

        {
            let page = &ctx.page;
            page.section(INFO_SHEET)?.click("closeIcon").await?;
            expect_not_present(page, "infoSheet").await?;
        }
        ctx.checkpoint("Info sheet closed").await
    })
}

fn location_selector(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        ctx.page.section(TOP_CONTENT)?.click("mapIcon").await?;
        ctx.checkpoint("Location selector open").await?;

        {
            let page = &ctx.page;
            let dialog = page.section(LOCATION_DIALOG)?;
            let props = location_dialog_props(dialog)?;
            all_visible(dialog, &["useMyLocationButton", "mapContainer"]).await?;
            let _ = expect_text_matches(
                dialog,
                "useMyLocationButtonContent",
                &props.use_my_location_text,
            )
            .await?;
            let _ = expect_text_matches(dialog, "actionText", &props.action_text).await?;

            page.send_keys("documentRoot", &Key::Escape.as_text()).await?;
            expect_not_present(page, "locationDialog").await?;
        }
        ctx.checkpoint("Location selector closed").await
    })
}

fn folder_view(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        {
            let folder = ctx.page.section(FOLDER_VIEW)?;
            let props = folder_view_props(folder)?;
            folder.click("expandRow").await?;
            let _ = expect_count(folder, "folderItem", 0).await?;
            let _ = expect_text_matches(folder, "expandHeader", &props.contracted_header_text).await?;
            let _ = expect_attribute(folder, "expandChevron", "data-icon", "chevron-down").await?;
        }
        ctx.checkpoint("Folder view contracted").await?;

        {
            let folder = ctx.page.section(FOLDER_VIEW)?;
            let props = folder_view_props(folder)?;
            folder.click("expandRow").await?;
            let _ = expect_count(folder, "folderItem", props.folder_image_count).await?;
            let _ = expect_text_matches(folder, "expandHeader", &props.expanded_header_text).await?;
            let _ = expect_attribute(folder, "expandChevron", "data-icon", "chevron-up").await?;
        }
        ctx.checkpoint("Folder view expanded").await
    })
}

fn control_panel(ctx: &mut ScenarioContext) -> BoxFuture<'_, CliResult<()>> {
    Box::pin(async move {
        {
            let controls = ctx.page.section(CONTROLS)?;
            if ctx.is_mobile {
                let _ = expect_attribute(controls, "openCloseButton", "data-icon", "gear").await?;
                all_not_present(controls, &CONTROL_PANEL_CONTENTS).await?;
                controls.click("openCloseButton").await?;
            }
            let _ = expect_attribute(controls, "openCloseButton", "data-icon", "chevron-down").await?;
            all_visible(controls, &CONTROL_PANEL).await?;
        }
        ctx.checkpoint("Control panel open").await?;

        {
            let controls = ctx.page.section(CONTROLS)?;
            controls.click("openCloseButton").await?;
            let _ = expect_attribute(controls, "openCloseButton", "data-icon", "gear").await?;
            all_not_present(controls, &CONTROL_PANEL_CONTENTS).await?;
        }
        ctx.checkpoint("Control panel closed").await
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() {
        let names: Vec<_> = steps().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "Navigation and loading",
                "Initial configuration",
                "Open video",
                "Info text",
                "Location selector",
                "Folder View",
                "Control Panel",
            ]
        );
    }

    #[test]
    fn test_select_keeps_order() {
        let kept = select(steps(), |name| name.contains("View") || name.contains("video"));
        let names: Vec<_> = kept.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Open video", "Folder View"]);
    }

    #[test]
    fn test_select_none() {
        assert!(select(steps(), |_| false).is_empty());
    }

    #[test]
    fn test_panel_contents_exclude_top_row() {
        assert!(!CONTROL_PANEL_CONTENTS.contains(&"topRow"));
        assert!(!CONTROL_PANEL_CONTENTS.contains(&"openCloseButton"));
        assert!(CONTROL_PANEL.contains(&"openCloseButton"));
    }
}
