//! Page object scenarios against the mock driver

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use cometprobe::prelude::*;

#[derive(Debug, Clone, Default)]
struct FolderProps {
    folder_image_count: usize,
}

fn controls_fixture() -> (Arc<MockDriver>, Section<FolderProps>) {
    let mock = Arc::new(MockDriver::new());
    mock.add_element(
        MockElement::new("grid", Selector::css("#controls #grid-checkbox")).selected(true),
    );
    mock.add_element(MockElement::new(
        "constellations",
        Selector::css("#controls #constellations-checkbox"),
    ));
    let session: Session = mock.clone();
    let controls = SectionBuilder::new("controls")
        .root(Selector::css("#controls"))
        .element("gridInput", Selector::css("#grid-checkbox"))
        .element("constellationsInput", Selector::css("#constellations-checkbox"))
        .build(&session)
        .unwrap();
    (mock, controls)
}

#[tokio::test]
async fn controls_visible_with_selected_states() {
    let (_, controls) = controls_fixture();
    let result = expect_all_visible(&controls, &["gridInput", "constellationsInput"])
        .await
        .unwrap();
    assert!(result.success(), "{result}");
    assert!(controls.is_selected("gridInput").await.unwrap());
    assert!(!controls.is_selected("constellationsInput").await.unwrap());
}

#[tokio::test]
async fn folder_items_toggle_between_zero_and_twelve() {
    let mock = Arc::new(MockDriver::new());
    let item_selector = Selector::css("#folder-view .folder-item");
    let mut toggle = Vec::new();
    for i in 0..12 {
        let id = format!("item-{i}");
        mock.add_element(MockElement::new(id.clone(), item_selector.clone()));
        toggle.push(MockEffect::ToggleAttached(id));
    }
    mock.add_element(MockElement::new("expand", Selector::css("#folder-view .expand-row")));
    mock.on_click("expand", toggle);

    let session: Session = mock.clone();
    let folder = SectionBuilder::with_props(
        "folderView",
        FolderProps {
            folder_image_count: 12,
        },
    )
    .root(Selector::css("#folder-view"))
    .element("folderItem", Selector::css(".folder-item"))
    .element("expandRow", Selector::css(".expand-row"))
    .build(&session)
    .unwrap();

    let expected = folder.props().folder_image_count;
    assert_eq!(folder.elements("folderItem").await.unwrap().len(), expected);

    folder.click("expandRow").await.unwrap();
    assert!(folder.elements("folderItem").await.unwrap().is_empty());

    folder.click("expandRow").await.unwrap();
    assert_eq!(folder.elements("folderItem").await.unwrap().len(), expected);
}

#[tokio::test]
async fn video_dialog_absent_until_opened_and_after_closing() {
    let mock = Arc::new(MockDriver::new());
    mock.add_element(MockElement::new("video-icon", Selector::css("#top-content .video-icon")));
    mock.add_element(MockElement::new("video", Selector::css("#video-container")).detached());
    mock.add_element(MockElement::new("video-close", Selector::css("#video-container .close")).detached());
    mock.on_click(
        "video-icon",
        vec![
            MockEffect::Attach("video".into()),
            MockEffect::Attach("video-close".into()),
        ],
    );
    mock.on_click(
        "video-close",
        vec![
            MockEffect::Detach("video".into()),
            MockEffect::Detach("video-close".into()),
        ],
    );

    let session: Session = mock.clone();
    let page = PageBuilder::new(
        SectionBuilder::<()>::new("app")
            .element("videoDialog", Selector::css("#video-container"))
            .child(
                SectionBuilder::new("topContent")
                    .root(Selector::css("#top-content"))
                    .element("videoIcon", Selector::css(".video-icon")),
            )
            .child(
                SectionBuilder::new("videoDialog")
                    .root(Selector::css("#video-container"))
                    .element("closeButton", Selector::css(".close")),
            ),
    )
    .build(session)
    .unwrap();

    let before = expect_all_not_present(&page, &["videoDialog"]).await.unwrap();
    assert!(before.success());

    page.section("topContent").unwrap().click("videoIcon").await.unwrap();
    let open = expect_all_not_present(&page, &["videoDialog"]).await.unwrap();
    assert_eq!(open.violated_names(), vec!["videoDialog"]);
    assert_eq!(open.violations[0].actual, ElementState::Present);

    page.section("videoDialog").unwrap().click("closeButton").await.unwrap();
    let after = expect_all_not_present(&page, &["videoDialog"]).await.unwrap();
    assert!(after.success());
}

#[tokio::test]
async fn unknown_names_fail_at_every_depth() {
    let session: Session = Arc::new(MockDriver::new());
    let page = PageBuilder::new(
        SectionBuilder::<()>::new("app").child(
            SectionBuilder::new("bottomContent")
                .root(Selector::css("#bottom-content"))
                .child(SectionBuilder::new("folderView").root(Selector::css("#folder-view"))),
        ),
    )
    .build(session)
    .unwrap();

    let scopes = [
        &*page,
        page.section("bottomContent").unwrap(),
        page.section_path("bottomContent/folderView").unwrap(),
    ];
    for scope in scopes {
        assert!(matches!(
            scope.is_visible("typo").await,
            Err(ProbeError::UnknownElement { .. })
        ));
        assert!(matches!(
            expect_all_visible(scope, &["typo"]).await,
            Err(ProbeError::UnknownElement { .. })
        ));
    }
}
