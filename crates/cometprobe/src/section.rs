//! Section Nodes: owned, addressable regions of a page.
//!
//! A [`SectionBuilder`] declares a region (optional root selector, named
//! elements, typed props and child regions). [`SectionBuilder::build`]
//! binds it to a live [`Session`] and scopes every element locator under
//! the section root, so `controls.click("gridInput")` can only ever reach
//! the `gridInput` declared by `controls`.
//!
//! Names resolve locally only. Asking a section for an element declared by
//! its parent or a sibling is an [`UnknownElement`](ProbeError::UnknownElement)
//! error, never a silent miss.

use async_trait::async_trait;
use std::fmt::Write as _;
use tracing::debug;

use crate::driver::{ElementHandle, Session, Size};
use crate::locator::{Locator, LocatorRegistry, Selector};
use crate::result::{ProbeError, ProbeResult};

/// Something batch assertions can evaluate element names against
#[async_trait]
pub trait Scope: Send + Sync {
    /// Name used in reports and errors
    fn scope_name(&self) -> &str;

    /// Whether the named element is present and displayed
    async fn is_visible(&self, name: &str) -> ProbeResult<bool>;

    /// Whether the named element matches anything in the live DOM
    async fn is_present(&self, name: &str) -> ProbeResult<bool>;
}

/// Declarative description of a section, not yet bound to a session
#[derive(Debug, Clone)]
pub struct SectionBuilder<P> {
    name: String,
    root: Option<Selector>,
    elements: Vec<(String, Locator)>,
    props: P,
    children: Vec<SectionBuilder<P>>,
}

impl<P: Default> SectionBuilder<P> {
    /// Start a section with default props
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_props(name, P::default())
    }
}

impl<P> SectionBuilder<P> {
    /// Start a section with the given props
    #[must_use]
    pub fn with_props(name: impl Into<String>, props: P) -> Self {
        Self {
            name: name.into(),
            root: None,
            elements: Vec::new(),
            props,
            children: Vec::new(),
        }
    }

    /// Root selector; element and child locators nest under it
    #[must_use]
    pub fn root(mut self, selector: Selector) -> Self {
        self.root = Some(selector);
        self
    }

    /// Declare a named element
    #[must_use]
    pub fn element(mut self, name: impl Into<String>, locator: impl Into<Locator>) -> Self {
        self.elements.push((name.into(), locator.into()));
        self
    }

    /// Replace the props
    #[must_use]
    pub fn props(mut self, props: P) -> Self {
        self.props = props;
        self
    }

    /// Declare a child section
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Section name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the declared tree to a session.
    ///
    /// # Errors
    ///
    /// [`ProbeError::DuplicateName`] when an element or child name repeats
    /// within one section, [`ProbeError::InvalidLocator`] when a locator
    /// cannot be nested under its section root.
    pub fn build(self, session: &Session) -> ProbeResult<Section<P>> {
        self.build_in(session, None, None)
    }

    fn build_in(
        self,
        session: &Session,
        parent_root: Option<&Selector>,
        parent_path: Option<&str>,
    ) -> ProbeResult<Section<P>> {
        let path = match parent_path {
            Some(parent) => format!("{parent}/{}", self.name),
            None => self.name.clone(),
        };

        let root = match (self.root, parent_root) {
            (Some(own), Some(parent)) => {
                Some(Locator::from_selector(own).within(parent)?.selector().clone())
            }
            (Some(own), None) => Some(own),
            (None, inherited) => inherited.cloned(),
        };

        let mut registry = LocatorRegistry::new(path.clone());
        for (name, locator) in self.elements {
            let scoped = match &root {
                Some(root) => locator.within(root)?,
                None => locator,
            };
            registry.register(name, scoped)?;
        }

        let mut children: Vec<Section<P>> = Vec::with_capacity(self.children.len());
        for child in self.children {
            if children.iter().any(|c| c.name == child.name) {
                return Err(ProbeError::DuplicateName {
                    scope: path,
                    name: child.name,
                });
            }
            children.push(child.build_in(session, root.as_ref(), Some(&path))?);
        }

        debug!(section = %path, elements = registry.len(), children = children.len(), "section built");
        Ok(Section {
            name: self.name,
            path,
            root,
            registry,
            props: self.props,
            children,
            session: session.clone(),
        })
    }
}

/// One addressable region of a page, bound to a live session
#[derive(Debug)]
pub struct Section<P> {
    name: String,
    path: String,
    root: Option<Selector>,
    registry: LocatorRegistry,
    props: P,
    children: Vec<Section<P>>,
    session: Session,
}

impl<P> Section<P> {
    /// Name within the parent
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-separated path from the page root, e.g. `app/bottomContent`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Effective root selector, already nested under ancestor roots
    #[must_use]
    pub const fn root(&self) -> Option<&Selector> {
        self.root.as_ref()
    }

    /// Typed expected values declared for this section
    #[must_use]
    pub const fn props(&self) -> &P {
        &self.props
    }

    /// The session this section queries
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Scoped locator for a registered name
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownElement`] if the name is not declared here.
    pub fn locator(&self, name: &str) -> ProbeResult<&Locator> {
        self.registry.resolve(name)
    }

    /// Registered element names, sorted
    #[must_use]
    pub fn element_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Child section names in declaration order
    #[must_use]
    pub fn section_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name.as_str()).collect()
    }

    /// Direct child section
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownSection`] if no child has that name.
    pub fn section(&self, name: &str) -> ProbeResult<&Self> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ProbeError::UnknownSection {
                scope: self.path.clone(),
                name: name.to_string(),
            })
    }

    /// Descendant section by slash-separated path (`"bottomContent/folderView"`)
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownSection`] naming the first segment that does not resolve.
    pub fn section_path(&self, path: &str) -> ProbeResult<&Self> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |section, segment| section.section(segment))
    }

    /// Every live match for a name; zero matches is not an error
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownElement`] for unregistered names, or a driver error.
    pub async fn elements(&self, name: &str) -> ProbeResult<Vec<ElementHandle>> {
        let locator = self.registry.resolve(name)?;
        let handles = self.session.locate(locator).await?;
        debug!(scope = %self.path, element = name, matches = handles.len(), "located");
        Ok(handles)
    }

    /// First live match for a name, if any
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownElement`] for unregistered names, or a driver error.
    pub async fn try_element(&self, name: &str) -> ProbeResult<Option<ElementHandle>> {
        Ok(self.elements(name).await?.into_iter().next())
    }

    /// First live match for a name, which must exist now
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if nothing matches, plus the errors of
    /// [`Self::try_element`].
    pub async fn element(&self, name: &str) -> ProbeResult<ElementHandle> {
        match self.try_element(name).await? {
            Some(handle) => Ok(handle),
            None => Err(self.not_found(name)),
        }
    }

    fn not_found(&self, name: &str) -> ProbeError {
        ProbeError::ElementNotFound {
            scope: self.path.clone(),
            name: name.to_string(),
            selector: self
                .registry
                .resolve(name)
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }

    /// Number of live matches
    ///
    /// # Errors
    ///
    /// Same as [`Self::elements`].
    pub async fn count(&self, name: &str) -> ProbeResult<usize> {
        Ok(self.elements(name).await?.len())
    }

    /// Click the named element
    ///
    /// # Errors
    ///
    /// Same as [`Self::element`], plus driver errors from the click.
    pub async fn click(&self, name: &str) -> ProbeResult<()> {
        let handle = self.element(name).await?;
        debug!(scope = %self.path, element = name, "click");
        self.session.click(&handle).await
    }

    /// Type text (or [`Key`](crate::Key) code points) into the named element
    ///
    /// # Errors
    ///
    /// Same as [`Self::element`], plus driver errors.
    pub async fn send_keys(&self, name: &str, text: &str) -> ProbeResult<()> {
        let handle = self.element(name).await?;
        debug!(scope = %self.path, element = name, "send_keys");
        self.session.send_keys(&handle, text).await
    }

    /// Whether the first match is displayed; absent elements are not visible
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownElement`] for unregistered names, or a driver error.
    pub async fn is_visible(&self, name: &str) -> ProbeResult<bool> {
        let Some(handle) = self.try_element(name).await? else {
            return Ok(false);
        };
        match self.session.is_displayed(&handle).await {
            // Detached between locate and the display check
            Err(ProbeError::StaleElement { .. }) => Ok(false),
            other => other,
        }
    }

    /// Whether the name matches anything in the live DOM
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnknownElement`] for unregistered names, or a driver error.
    pub async fn is_present(&self, name: &str) -> ProbeResult<bool> {
        let locator = self.registry.resolve(name)?;
        self.session.exists(locator).await
    }

    /// Rendered text of the named element
    ///
    /// # Errors
    ///
    /// Same as [`Self::element`].
    pub async fn text(&self, name: &str) -> ProbeResult<String> {
        let handle = self.element(name).await?;
        self.session.text(&handle).await
    }

    /// Attribute of the named element, `None` when unset
    ///
    /// # Errors
    ///
    /// Same as [`Self::element`].
    pub async fn attribute(&self, name: &str, attribute: &str) -> ProbeResult<Option<String>> {
        let handle = self.element(name).await?;
        self.session.attribute(&handle, attribute).await
    }

    /// Checked/selected state of the named element
    ///
    /// # Errors
    ///
    /// Same as [`Self::element`].
    pub async fn is_selected(&self, name: &str) -> ProbeResult<bool> {
        let handle = self.element(name).await?;
        self.session.is_selected(&handle).await
    }

    /// Rendered size of the named element
    ///
    /// # Errors
    ///
    /// Same as [`Self::element`].
    pub async fn element_size(&self, name: &str) -> ProbeResult<Size> {
        let handle = self.element(name).await?;
        self.session.element_size(&handle).await
    }

    /// Indented listing of this section and its descendants
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = match &self.root {
            Some(root) => writeln!(out, "{indent}{} [{root}]", self.name),
            None => writeln!(out, "{indent}{}", self.name),
        };
        for name in self.registry.names() {
            if let Ok(locator) = self.registry.resolve(name) {
                let _ = writeln!(out, "{indent}  - {name}: {locator}");
            }
        }
        for child in &self.children {
            child.describe_into(out, depth + 1);
        }
    }
}

#[async_trait]
impl<P: Send + Sync> Scope for Section<P> {
    fn scope_name(&self) -> &str {
        &self.path
    }

    async fn is_visible(&self, name: &str) -> ProbeResult<bool> {
        Self::is_visible(self, name).await
    }

    async fn is_present(&self, name: &str) -> ProbeResult<bool> {
        Self::is_present(self, name).await
    }
}
