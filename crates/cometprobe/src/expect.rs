//! Single-element expectations.
//!
//! Unlike the batch utilities these fail hard: a mismatch is
//! [`ProbeError::AssertionFailed`] naming scope, element, expected and
//! actual values. On success each returns the observed value.

use regex::Regex;
use std::fmt::Display;
use tracing::debug;

use crate::page::PageRoot;
use crate::result::{ProbeError, ProbeResult};
use crate::section::Section;

fn check<T: PartialEq + Display>(
    scope: &str,
    subject: &str,
    what: &str,
    actual: T,
    expected: &T,
) -> ProbeResult<T> {
    if &actual == expected {
        debug!(scope, subject, what, %actual, "expectation met");
        Ok(actual)
    } else {
        Err(ProbeError::assertion(format!(
            "{scope}/{subject}: expected {what} {expected}, got {actual}"
        )))
    }
}

/// Exactly `expected` live matches
///
/// # Errors
///
/// `AssertionFailed` on mismatch, plus lookup and driver errors.
pub async fn expect_count<P>(section: &Section<P>, name: &str, expected: usize) -> ProbeResult<usize> {
    let actual = section.count(name).await?;
    check(section.path(), name, "count", actual, &expected)
}

/// Rendered text matches `pattern`
///
/// # Errors
///
/// `AssertionFailed` on mismatch, `ElementNotFound` when absent.
pub async fn expect_text_matches<P>(
    section: &Section<P>,
    name: &str,
    pattern: &Regex,
) -> ProbeResult<String> {
    let text = section.text(name).await?;
    if pattern.is_match(&text) {
        debug!(scope = section.path(), element = name, %text, "text matched");
        Ok(text)
    } else {
        Err(ProbeError::assertion(format!(
            "{}/{name}: expected text matching /{pattern}/, got {text:?}",
            section.path()
        )))
    }
}

/// Attribute equals `expected`; an unset attribute never matches
///
/// # Errors
///
/// `AssertionFailed` on mismatch, `ElementNotFound` when absent.
pub async fn expect_attribute<P>(
    section: &Section<P>,
    name: &str,
    attribute: &str,
    expected: &str,
) -> ProbeResult<String> {
    match section.attribute(name, attribute).await? {
        Some(actual) => check(section.path(), name, attribute, actual, &expected.to_string()),
        None => Err(ProbeError::assertion(format!(
            "{}/{name}: expected {attribute} {expected}, attribute not set",
            section.path()
        ))),
    }
}

/// Checked/selected state
///
/// # Errors
///
/// `AssertionFailed` on mismatch, `ElementNotFound` when absent.
pub async fn expect_selected<P>(section: &Section<P>, name: &str, expected: bool) -> ProbeResult<bool> {
    let actual = section.is_selected(name).await?;
    check(section.path(), name, "selected", actual, &expected)
}

/// Document title
///
/// # Errors
///
/// `AssertionFailed` on mismatch, plus driver errors.
pub async fn expect_title<P>(page: &PageRoot<P>, expected: &str) -> ProbeResult<String> {
    let actual = page.title().await?;
    check(page.path(), "title", "title", actual, &expected.to_string())
}

/// Present and displayed
///
/// # Errors
///
/// `AssertionFailed` when hidden or absent.
pub async fn expect_visible<P>(section: &Section<P>, name: &str) -> ProbeResult<()> {
    let _ = check(section.path(), name, "visible", section.is_visible(name).await?, &true)?;
    Ok(())
}

/// Absent or hidden
///
/// # Errors
///
/// `AssertionFailed` when displayed.
pub async fn expect_not_visible<P>(section: &Section<P>, name: &str) -> ProbeResult<()> {
    let _ = check(section.path(), name, "visible", section.is_visible(name).await?, &false)?;
    Ok(())
}

/// In the DOM
///
/// # Errors
///
/// `AssertionFailed` when absent.
pub async fn expect_present<P>(section: &Section<P>, name: &str) -> ProbeResult<()> {
    let _ = check(section.path(), name, "present", section.is_present(name).await?, &true)?;
    Ok(())
}

/// Not in the DOM
///
/// # Errors
///
/// `AssertionFailed` when present.
pub async fn expect_not_present<P>(section: &Section<P>, name: &str) -> ProbeResult<()> {
    let _ = check(section.path(), name, "present", section.is_present(name).await?, &false)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::Session;
    use crate::locator::Selector;
    use crate::mock::{MockDriver, MockElement};
    use crate::page::PageBuilder;
    use crate::section::SectionBuilder;
    use std::sync::Arc;

    fn controls() -> (Arc<MockDriver>, Section<()>) {
        let mock = Arc::new(MockDriver::new());
        mock.add_element(MockElement::new("grid", Selector::css("#controls #grid")).selected(true));
        mock.add_element(MockElement::new("const", Selector::css("#controls #const")));
        mock.add_element(
            MockElement::new("button", Selector::css("#controls .toggle"))
                .with_attribute("data-icon", "chevron-down")
                .with_text("Hide Images"),
        );
        let session: Session = mock.clone();
        let section = SectionBuilder::new("controls")
            .root(Selector::css("#controls"))
            .element("gridInput", Selector::css("#grid"))
            .element("constellationsInput", Selector::css("#const"))
            .element("toggle", Selector::css(".toggle"))
            .element("missing", Selector::css(".missing"))
            .build(&session)
            .unwrap();
        (mock, section)
    }

    #[tokio::test]
    async fn test_selected_states() {
        let (_, controls) = controls();
        assert!(expect_selected(&controls, "gridInput", true).await.unwrap());
        assert!(!expect_selected(&controls, "constellationsInput", false).await.unwrap());

        let err = expect_selected(&controls, "constellationsInput", true)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: controls/constellationsInput: expected selected true, got false"
        );
    }

    #[tokio::test]
    async fn test_count_and_presence() {
        let (_, controls) = controls();
        assert_eq!(expect_count(&controls, "missing", 0).await.unwrap(), 0);
        assert!(expect_count(&controls, "toggle", 2).await.is_err());
        expect_not_present(&controls, "missing").await.unwrap();
        expect_present(&controls, "toggle").await.unwrap();
        expect_visible(&controls, "toggle").await.unwrap();
        expect_not_visible(&controls, "missing").await.unwrap();
        assert!(expect_visible(&controls, "missing").await.is_err());
    }

    #[tokio::test]
    async fn test_attribute_and_text() {
        let (_, controls) = controls();
        expect_attribute(&controls, "toggle", "data-icon", "chevron-down")
            .await
            .unwrap();
        let err = expect_attribute(&controls, "toggle", "data-prefix", "fas")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("attribute not set"));

        let pattern = Regex::new(r"^(Show|Hide) Images$").unwrap();
        assert_eq!(
            expect_text_matches(&controls, "toggle", &pattern).await.unwrap(),
            "Hide Images"
        );
        let strict = Regex::new(r"^Show Images$").unwrap();
        assert!(expect_text_matches(&controls, "toggle", &strict).await.is_err());
    }

    #[tokio::test]
    async fn test_title() {
        let mock = Arc::new(MockDriver::new());
        mock.set_title("Green Comet");
        let session: Session = mock.clone();
        let page = PageBuilder::new(SectionBuilder::<()>::new("app"))
            .build(session)
            .unwrap();
        expect_title(&page, "Green Comet").await.unwrap();
        assert!(expect_title(&page, "Other").await.is_err());
    }
}
