//! Selectors, locators and the per-scope Locator Registry.
//!
//! # Design Philosophy
//!
//! - **Symbolic names**: test logic refers to `"gridInput"`, never to the
//!   concrete selector, so markup changes touch one declaration.
//! - **Write once**: a registry rejects duplicate names and has no removal.
//! - **Scoped**: a section's locators are composed under the section root.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::result::{ProbeError, ProbeResult};

/// Selector strategy for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "#controls .v-btn")
    Css(String),
    /// XPath expression
    XPath(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Accessibility label (aria-label attribute)
    AriaLabel(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create an accessibility label selector
    #[must_use]
    pub fn aria_label(label: impl Into<String>) -> Self {
        Self::AriaLabel(label.into())
    }

    /// CSS form of this selector, `None` for XPath
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::TestId(id) => Some(format!("[data-testid={id:?}]")),
            Self::AriaLabel(label) => Some(format!("[aria-label={label:?}]")),
            Self::XPath(_) => None,
        }
    }

    /// Strategy name used in logs and reports
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::TestId(_) => "test_id",
            Self::AriaLabel(_) => "aria_label",
        }
    }

    /// Raw selector value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::TestId(s) | Self::AriaLabel(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// An immutable reference to zero, one or many live UI elements.
///
/// A locator is resolved by the driver at query time; declaring one never
/// touches the browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: Selector::Css(selector.into()),
        }
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self { selector }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Compose this locator under a section root.
    ///
    /// CSS-family selectors nest with the descendant combinator. XPath
    /// children must be relative (`./` or `.//`) and are appended to the
    /// root expression. Selector lists (`a, b` in CSS, `a | b` in XPath) on
    /// either side are expanded so every alternative stays under the root.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidLocator`] when the strategies cannot be
    /// combined.
    pub fn within(&self, root: &Selector) -> ProbeResult<Self> {
        let selector = match (root.to_css(), self.selector.to_css()) {
            (Some(root_css), Some(child_css)) => {
                Selector::Css(cross_join(&root_css, &child_css, ',', ", ", |r, c| {
                    Ok(format!("{r} {c}"))
                })?)
            }
            (None, None) => Selector::XPath(cross_join(
                root.value(),
                self.selector.value(),
                '|',
                " | ",
                |r, c| {
                    let relative = c.strip_prefix('.').ok_or_else(|| ProbeError::InvalidLocator {
                        message: format!(
                            "XPath '{c}' must be relative ('./' or './/') to nest under '{r}'"
                        ),
                    })?;
                    Ok(format!("{r}{relative}"))
                },
            )?),
            _ => {
                return Err(ProbeError::InvalidLocator {
                    message: format!("cannot nest {} under {}", self.selector, root),
                })
            }
        };
        Ok(Self { selector })
    }
}

/// Join every alternative of `root` with every alternative of `child`, so a
/// selector list on either side stays inside the root.
fn cross_join(
    root: &str,
    child: &str,
    separator: char,
    joiner: &str,
    join: impl Fn(&str, &str) -> ProbeResult<String>,
) -> ProbeResult<String> {
    let roots = split_top_level(root, separator);
    let children = split_top_level(child, separator);
    let mut parts = Vec::with_capacity(roots.len() * children.len());
    for r in &roots {
        for c in &children {
            parts.push(join(r, c)?);
        }
    }
    Ok(parts.join(joiner))
}

/// Split on `separator` outside brackets, parentheses and quotes
fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, _) if c == separator && depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts.retain(|p| !p.is_empty());
    if parts.is_empty() {
        parts.push(value.trim());
    }
    parts
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::from_selector(selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.selector, f)
    }
}

/// Write-once map from symbolic element names to locators.
#[derive(Debug, Clone, Default)]
pub struct LocatorRegistry {
    scope: String,
    locators: HashMap<String, Locator>,
}

impl LocatorRegistry {
    /// Create an empty registry for the named scope
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            locators: HashMap::new(),
        }
    }

    /// Register a locator under a symbolic name
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::DuplicateName`] if the name is already taken.
    pub fn register(&mut self, name: impl Into<String>, locator: Locator) -> ProbeResult<()> {
        let name = name.into();
        if self.locators.contains_key(&name) {
            return Err(ProbeError::DuplicateName {
                scope: self.scope.clone(),
                name,
            });
        }
        let _ = self.locators.insert(name, locator);
        Ok(())
    }

    /// Resolve a symbolic name
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::UnknownElement`] if the name is not registered.
    pub fn resolve(&self, name: &str) -> ProbeResult<&Locator> {
        self.locators
            .get(name)
            .ok_or_else(|| ProbeError::UnknownElement {
                scope: self.scope.clone(),
                name: name.to_string(),
            })
    }

    /// Whether a name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.locators.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Scope this registry belongs to
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Number of registered names
    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_forms() {
            assert_eq!(Selector::css("#a").to_css().unwrap(), "#a");
            assert_eq!(
                Selector::test_id("play").to_css().unwrap(),
                "[data-testid=\"play\"]"
            );
            assert_eq!(
                Selector::aria_label("Close").to_css().unwrap(),
                "[aria-label=\"Close\"]"
            );
            assert!(Selector::xpath("//div").to_css().is_none());
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("#video").to_string(), "css=#video");
            assert_eq!(Selector::xpath("//video").to_string(), "xpath=//video");
        }
    }

    mod within_tests {
        use super::*;

        #[test]
        fn test_css_nests_with_descendant_combinator() {
            let child = Locator::new(".item");
            let scoped = child.within(&Selector::css("#folder-view")).unwrap();
            assert_eq!(scoped.selector(), &Selector::css("#folder-view .item"));
        }

        #[test]
        fn test_test_id_nests_as_css() {
            let child = Locator::from_selector(Selector::test_id("slider"));
            let scoped = child.within(&Selector::css("#bottom")).unwrap();
            assert_eq!(
                scoped.selector(),
                &Selector::css("#bottom [data-testid=\"slider\"]")
            );
        }

        #[test]
        fn test_relative_xpath_appends() {
            let child = Locator::from_selector(Selector::xpath(".//button"));
            let scoped = child.within(&Selector::xpath("//div[@id='dlg']")).unwrap();
            assert_eq!(
                scoped.selector(),
                &Selector::xpath("//div[@id='dlg']//button")
            );
        }

        #[test]
        fn test_absolute_xpath_rejected() {
            let child = Locator::from_selector(Selector::xpath("//button"));
            let err = child.within(&Selector::xpath("//div")).unwrap_err();
            assert!(matches!(err, ProbeError::InvalidLocator { .. }));
        }

        #[test]
        fn test_child_selector_list_stays_scoped() {
            let child = Locator::new(".close-icon, .close-btn");
            let scoped = child.within(&Selector::css("#info-sheet")).unwrap();
            assert_eq!(
                scoped.selector(),
                &Selector::css("#info-sheet .close-icon, #info-sheet .close-btn")
            );
        }

        #[test]
        fn test_root_selector_list_stays_scoped() {
            let child = Locator::new(".item");
            let scoped = child.within(&Selector::css("#a, #b")).unwrap();
            assert_eq!(scoped.selector(), &Selector::css("#a .item, #b .item"));
        }

        #[test]
        fn test_commas_inside_parens_and_attributes_are_kept() {
            let child = Locator::new("[title=\"a, b\"]");
            let scoped = child.within(&Selector::css("div:is(#a, #b)")).unwrap();
            assert_eq!(
                scoped.selector(),
                &Selector::css("div:is(#a, #b) [title=\"a, b\"]")
            );
        }

        #[test]
        fn test_xpath_union_stays_scoped() {
            let child = Locator::from_selector(Selector::xpath("./span | ./em"));
            let scoped = child
                .within(&Selector::xpath("//div[@id='a'] | //div[@id='b']"))
                .unwrap();
            assert_eq!(
                scoped.selector(),
                &Selector::xpath(
                    "//div[@id='a']/span | //div[@id='a']/em | //div[@id='b']/span | //div[@id='b']/em"
                )
            );
        }

        #[test]
        fn test_xpath_union_with_absolute_part_rejected() {
            let child = Locator::from_selector(Selector::xpath("./span | //em"));
            let err = child.within(&Selector::xpath("//div")).unwrap_err();
            assert!(matches!(err, ProbeError::InvalidLocator { .. }));
        }

        #[test]
        fn test_mixed_strategies_rejected() {
            let child = Locator::from_selector(Selector::xpath("./span"));
            let err = child.within(&Selector::css("#root")).unwrap_err();
            assert!(matches!(err, ProbeError::InvalidLocator { .. }));
        }
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_register_and_resolve() {
            let mut registry = LocatorRegistry::new("controls");
            registry
                .register("gridInput", Locator::new("#grid input"))
                .unwrap();
            assert_eq!(
                registry.resolve("gridInput").unwrap(),
                &Locator::new("#grid input")
            );
            assert!(registry.contains("gridInput"));
            assert_eq!(registry.len(), 1);
        }

        #[test]
        fn test_duplicate_rejected() {
            let mut registry = LocatorRegistry::new("controls");
            registry.register("topRow", Locator::new("#a")).unwrap();
            let err = registry
                .register("topRow", Locator::new("#b"))
                .unwrap_err();
            match err {
                ProbeError::DuplicateName { scope, name } => {
                    assert_eq!(scope, "controls");
                    assert_eq!(name, "topRow");
                }
                other => panic!("unexpected error: {other}"),
            }
            // First registration wins
            assert_eq!(registry.resolve("topRow").unwrap(), &Locator::new("#a"));
        }

        #[test]
        fn test_unknown_name() {
            let registry = LocatorRegistry::new("app");
            assert!(registry.is_empty());
            assert!(matches!(
                registry.resolve("missing"),
                Err(ProbeError::UnknownElement { .. })
            ));
        }

        #[test]
        fn test_names_sorted() {
            let mut registry = LocatorRegistry::new("app");
            registry.register("b", Locator::new("#b")).unwrap();
            registry.register("a", Locator::new("#a")).unwrap();
            assert_eq!(registry.names(), vec!["a", "b"]);
        }
    }
}
