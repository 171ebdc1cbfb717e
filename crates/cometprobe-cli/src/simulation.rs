//! Simulated GreenComet DOM
//!
//! Populates a [`MockDriver`] from the page object's own resolved locators,
//! so the simulated DOM can never drift from the selectors a real run uses.
//! Clicks and the Escape key are scripted to open and close the dialogs,
//! panels and folder view the way the app does.

use cometprobe::{Key, MockDriver, MockEffect, MockElement, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{DeviceKind, RunConfig};
use crate::error::CliResult;
use crate::greencomet::{
    app_props, bottom_content_props, build_page, folder_view_props, info_sheet_props,
    GreenCometPage, GreenCometSection, BOTTOM_CONTENT, CONTROLS, FOLDER_VIEW, INFO_SHEET,
    LOCATION_DIALOG, READY_ELEMENT, TOP_CONTENT, VIDEO_DIALOG,
};

const EXPANDED_HEADER: &str = "Hide Images";
const CONTRACTED_HEADER: &str = "Show Images";

/// Knobs for the simulated app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Delay after navigation before the main content shows
    pub load_delay: Duration,
    /// The video dialog's close icon does nothing
    pub broken_video_close: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            load_delay: Duration::from_millis(100),
            broken_video_close: false,
        }
    }
}

/// Build the GreenComet page on a freshly populated mock driver
///
/// # Errors
///
/// Page build errors (bad expectation patterns, snapshot directory).
pub fn simulate(
    config: &RunConfig,
    options: SimulationOptions,
) -> CliResult<(Arc<MockDriver>, GreenCometPage)> {
    let mock = Arc::new(MockDriver::new());
    let session: Session = mock.clone();
    let page = build_page(session, config)?;
    populate(&mock, &page, config.device, options)?;
    Ok((mock, page))
}

struct Dom<'a> {
    mock: &'a MockDriver,
}

impl Dom<'_> {
    fn add(
        &self,
        section: &GreenCometSection,
        name: &str,
        shape: impl FnOnce(MockElement) -> MockElement,
    ) -> CliResult<String> {
        let id = format!("{}/{name}", section.path());
        self.add_with_id(section, name, id.clone(), shape)?;
        Ok(id)
    }

    fn add_many(
        &self,
        section: &GreenCometSection,
        name: &str,
        count: usize,
        shape: impl Fn(MockElement) -> MockElement,
    ) -> CliResult<Vec<String>> {
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let id = format!("{}/{name}#{index}", section.path());
            self.add_with_id(section, name, id.clone(), &shape)?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn add_with_id(
        &self,
        section: &GreenCometSection,
        name: &str,
        id: String,
        shape: impl FnOnce(MockElement) -> MockElement,
    ) -> CliResult<()> {
        let selector = section.locator(name)?.selector().clone();
        self.mock.add_element(shape(MockElement::new(id, selector)));
        Ok(())
    }
}

fn attach_all(ids: &[String]) -> impl Iterator<Item = MockEffect> + '_ {
    ids.iter().cloned().map(MockEffect::Attach)
}

fn detach_all(ids: &[String]) -> impl Iterator<Item = MockEffect> + '_ {
    ids.iter().cloned().map(MockEffect::Detach)
}

/// Populate `mock` with the elements `page` declares
///
/// # Errors
///
/// Lookup errors if the page tree lacks an element the simulation scripts.
pub fn populate(
    mock: &MockDriver,
    page: &GreenCometPage,
    device: DeviceKind,
    options: SimulationOptions,
) -> CliResult<()> {
    let dom = Dom { mock };
    let descriptor = device.descriptor();
    let width = f64::from(descriptor.viewport_width);
    let height = f64::from(descriptor.viewport_height);
    mock.set_viewport(width, height);
    mock.set_title(app_props(page)?.title.clone());

    // App root
    let ratio = info_sheet_props(page.section(INFO_SHEET)?)?.main_content_height_ratio;
    let _ = dom.add(page, READY_ELEMENT, |e| {
        e.with_size(width, (ratio * height).round())
            .revealed_after(options.load_delay)
    })?;
    let splash = vec![
        dom.add(page, "splashScreen", |e| e)?,
        dom.add(page, "splashClose", |e| e)?,
    ];
    let app_video = dom.add(page, "videoDialog", MockElement::detached)?;
    let app_location = dom.add(page, "locationDialog", MockElement::detached)?;
    let app_info = dom.add(page, "infoSheet", MockElement::detached)?;
    let _ = dom.add(page, "documentRoot", |e| e.with_size(width, height))?;
    mock.on_click(&splash[1], detach_all(&splash).collect());

    // Bottom bar
    let bottom = page.section(BOTTOM_CONTENT)?;
    let _ = dom.add(bottom, "playPauseIcon", |e| e)?;
    let _ = dom.add(bottom, "slider", |e| e)?;
    let credits = bottom_content_props(bottom)?.credit_icon_count;
    let _ = dom.add_many(bottom, "creditIcon", credits, |e| e)?;

    // Folder view
    let folder = page.section(FOLDER_VIEW)?;
    let images = folder_view_props(folder)?.folder_image_count;
    let items = dom.add_many(folder, "folderItem", images, |e| e)?;
    let expand_row = dom.add(folder, "expandRow", |e| e)?;
    let header = dom.add(folder, "expandHeader", |e| e.with_text(EXPANDED_HEADER))?;
    let chevron = dom.add(folder, "expandChevron", |e| {
        e.with_attribute("data-icon", "chevron-up")
    })?;
    let mut toggle_folder: Vec<MockEffect> =
        items.iter().cloned().map(MockEffect::ToggleAttached).collect();
    toggle_folder.push(MockEffect::ToggleText {
        id: header,
        first: EXPANDED_HEADER.to_string(),
        second: CONTRACTED_HEADER.to_string(),
    });
    toggle_folder.push(MockEffect::ToggleAttribute {
        id: chevron,
        name: "data-icon".to_string(),
        first: "chevron-up".to_string(),
        second: "chevron-down".to_string(),
    });
    mock.on_click(expand_row, toggle_folder);

    // Control panel; phones start with it closed
    let controls = page.section(CONTROLS)?;
    let open = !device.is_mobile();
    let shown = move |e: MockElement| if open { e } else { e.detached() };
    let _ = dom.add(controls, "topRow", |e| e)?;
    let toggle = dom.add(controls, "openCloseButton", |e| {
        e.with_attribute("data-icon", if open { "chevron-down" } else { "gear" })
    })?;
    let panel = vec![
        dom.add(controls, "gridCheckbox", shown)?,
        dom.add(controls, "gridInput", |e| shown(e).selected(true))?,
        dom.add(controls, "constellationsCheckbox", shown)?,
        dom.add(controls, "constellationsInput", shown)?,
        dom.add(controls, "horizonCheckbox", shown)?,
        dom.add(controls, "horizonInput", shown)?,
        dom.add(controls, "selectedLocationTimeLabel", |e| {
            shown(e).with_text("Selected Location Time")
        })?,
        dom.add(controls, "selectedLocationTimeInput", shown)?,
        dom.add(controls, "timeIcon", shown)?,
        dom.add(controls, "centerOnNowButton", shown)?,
        dom.add(controls, "centerOnNowButtonContent", |e| {
            shown(e).with_text("Center on Now")
        })?,
        dom.add(controls, "playCometImagesButton", shown)?,
        dom.add(controls, "playCometImagesContent", |e| {
            shown(e).with_text("Play Comet Images")
        })?,
    ];
    let mut toggle_panel: Vec<MockEffect> =
        panel.iter().cloned().map(MockEffect::ToggleAttached).collect();
    toggle_panel.push(MockEffect::ToggleAttribute {
        id: toggle.clone(),
        name: "data-icon".to_string(),
        first: "chevron-down".to_string(),
        second: "gear".to_string(),
    });
    mock.on_click(toggle, toggle_panel);

    // Video dialog
    let video = page.section(VIDEO_DIALOG)?;
    let video_ids = vec![
        app_video,
        dom.add(video, "video", MockElement::detached)?,
        dom.add(video, "closeIcon", MockElement::detached)?,
    ];
    if !options.broken_video_close {
        mock.on_click(&video_ids[2], detach_all(&video_ids).collect());
    }

    // Info sheet
    let sheet = page.section(INFO_SHEET)?;
    let tab_count = info_sheet_props(sheet)?.tab_count;
    let mut sheet_ids = vec![app_info];
    let sheet_close = dom.add(sheet, "closeIcon", MockElement::detached)?;
    sheet_ids.push(sheet_close.clone());
    sheet_ids.extend(dom.add_many(sheet, "tabHeader", tab_count, MockElement::detached)?);
    let info_tab = dom.add(sheet, "infoTabHeader", MockElement::detached)?;
    let wwt_tab = dom.add(sheet, "wwtTabHeader", MockElement::detached)?;
    let info_body = dom.add(sheet, "infoText", MockElement::detached)?;
    let wwt_body = dom.add(sheet, "wwtText", MockElement::detached)?;
    sheet_ids.extend([info_tab.clone(), wwt_tab.clone(), info_body.clone()]);
    // The WWT tab body only mounts on first visit
    let mut open_sheet: Vec<MockEffect> = attach_all(&sheet_ids).collect();
    open_sheet.extend([
        MockEffect::Show(info_body.clone()),
        MockEffect::Detach(wwt_body.clone()),
    ]);
    let mut close_sheet: Vec<MockEffect> = detach_all(&sheet_ids).collect();
    close_sheet.push(MockEffect::Detach(wwt_body.clone()));
    mock.on_click(
        wwt_tab,
        vec![
            MockEffect::Hide(info_body.clone()),
            MockEffect::Attach(wwt_body.clone()),
            MockEffect::Show(wwt_body.clone()),
        ],
    );
    mock.on_click(
        info_tab,
        vec![MockEffect::Show(info_body), MockEffect::Hide(wwt_body)],
    );
    mock.on_click(sheet_close, close_sheet);

    // Location dialog
    let location = page.section(LOCATION_DIALOG)?;
    let location_ids = vec![
        app_location,
        dom.add(location, "useMyLocationButton", MockElement::detached)?,
        dom.add(location, "useMyLocationButtonContent", |e| {
            e.detached().with_text("Use My Location")
        })?,
        dom.add(location, "mapContainer", MockElement::detached)?,
        dom.add(location, "actionText", |e| {
            e.detached().with_text("Click on the map to select a location")
        })?,
    ];
    mock.on_key(Key::Escape, detach_all(&location_ids).collect());

    // Top bar opens the three dialogs
    let top = page.section(TOP_CONTENT)?;
    let video_icon = dom.add(top, "videoIcon", |e| e)?;
    let text_icon = dom.add(top, "textIcon", |e| e)?;
    let map_icon = dom.add(top, "mapIcon", |e| e)?;
    mock.on_click(video_icon, attach_all(&video_ids).collect());
    mock.on_click(text_icon, open_sheet);
    mock.on_click(map_icon, attach_all(&location_ids).collect());

    debug!(mobile = device.is_mobile(), broken_video = options.broken_video_close, "simulated DOM ready");
    Ok(())
}
