//! Mock driver over a scripted, in-memory DOM.
//!
//! Elements are matched by selector equality, so a page object built on a
//! `MockDriver` resolves exactly the elements declared with its own
//! (section-scoped) selectors. Clicks and special keys apply scripted
//! [`MockEffect`]s, which is enough to drive dialogs and panels open and
//! closed without a browser.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::driver::{BrowserDriver, ElementHandle, Key, Screenshot, Size};
use crate::locator::{Locator, Selector};
use crate::result::{ProbeError, ProbeResult};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One element of the scripted DOM
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Unique element id
    pub id: String,
    /// Selector that matches this element
    pub selector: Selector,
    /// Whether the element is in the DOM
    pub attached: bool,
    /// Whether the element renders visibly
    pub displayed: bool,
    /// Checked/selected state
    pub selected: bool,
    /// Rendered text
    pub text: String,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// Rendered size
    pub size: Size,
    /// Only visible once this long has passed since the last navigation
    pub reveal_after: Option<Duration>,
}

impl MockElement {
    /// Create an attached, visible element
    #[must_use]
    pub fn new(id: impl Into<String>, selector: Selector) -> Self {
        Self {
            id: id.into(),
            selector,
            attached: true,
            displayed: true,
            selected: false,
            text: String::new(),
            attributes: HashMap::new(),
            size: Size::new(100.0, 20.0),
            reveal_after: None,
        }
    }

    /// Start outside the DOM
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    /// Start attached but hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Set the selected state
    #[must_use]
    pub const fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the rendered size
    #[must_use]
    pub const fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    /// Become visible only after a delay following navigation
    #[must_use]
    pub const fn revealed_after(mut self, delay: Duration) -> Self {
        self.reveal_after = Some(delay);
        self
    }
}

/// A scripted DOM mutation triggered by a click or key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEffect {
    /// Insert the element into the DOM
    Attach(String),
    /// Remove the element from the DOM
    Detach(String),
    /// Insert if absent, remove if present
    ToggleAttached(String),
    /// Make the element visible
    Show(String),
    /// Hide the element
    Hide(String),
    /// Flip the selected state
    ToggleSelected(String),
    /// Set an attribute
    SetAttribute {
        /// Element id
        id: String,
        /// Attribute name
        name: String,
        /// New value
        value: String,
    },
    /// Switch an attribute between two values
    ToggleAttribute {
        /// Element id
        id: String,
        /// Attribute name
        name: String,
        /// Value used unless the attribute currently equals it
        first: String,
        /// Value used when the attribute currently equals `first`
        second: String,
    },
    /// Set the text
    SetText {
        /// Element id
        id: String,
        /// New text
        text: String,
    },
    /// Switch the text between two values
    ToggleText {
        /// Element id
        id: String,
        /// Text used unless the text currently equals it
        first: String,
        /// Text used when the text currently equals `first`
        second: String,
    },
}

#[derive(Debug)]
struct MockState {
    elements: Vec<MockElement>,
    click_effects: HashMap<String, Vec<MockEffect>>,
    key_effects: HashMap<Key, Vec<MockEffect>>,
    typed: HashMap<String, String>,
    title: String,
    url: String,
    viewport: Size,
    navigated_at: Option<Instant>,
    snapshots: Vec<String>,
    call_history: Vec<String>,
    locate_failure: Option<fn() -> ProbeError>,
    closed: bool,
}

impl MockState {
    fn element(&self, id: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    fn attached(&self, handle: &ElementHandle) -> ProbeResult<&MockElement> {
        self.element(&handle.id)
            .filter(|e| e.attached)
            .ok_or_else(|| ProbeError::StaleElement {
                id: handle.id.clone(),
            })
    }

    fn is_displayed(&self, element: &MockElement) -> bool {
        let revealed = match element.reveal_after {
            None => true,
            Some(delay) => self
                .navigated_at
                .is_some_and(|at| at.elapsed() >= delay),
        };
        element.attached && element.displayed && revealed
    }

    fn apply(&mut self, effects: &[MockEffect]) {
        for effect in effects {
            match effect {
                MockEffect::Attach(id) => self.update(id, |e| e.attached = true),
                MockEffect::Detach(id) => self.update(id, |e| e.attached = false),
                MockEffect::ToggleAttached(id) => self.update(id, |e| e.attached = !e.attached),
                MockEffect::Show(id) => self.update(id, |e| e.displayed = true),
                MockEffect::Hide(id) => self.update(id, |e| e.displayed = false),
                MockEffect::ToggleSelected(id) => self.update(id, |e| e.selected = !e.selected),
                MockEffect::SetAttribute { id, name, value } => self.update(id, |e| {
                    let _ = e.attributes.insert(name.clone(), value.clone());
                }),
                MockEffect::ToggleAttribute {
                    id,
                    name,
                    first,
                    second,
                } => self.update(id, |e| {
                    let next = if e.attributes.get(name) == Some(first) {
                        second.clone()
                    } else {
                        first.clone()
                    };
                    let _ = e.attributes.insert(name.clone(), next);
                }),
                MockEffect::SetText { id, text } => self.update(id, |e| e.text = text.clone()),
                MockEffect::ToggleText { id, first, second } => self.update(id, |e| {
                    e.text = if &e.text == first {
                        second.clone()
                    } else {
                        first.clone()
                    };
                }),
            }
        }
    }

    fn update(&mut self, id: &str, f: impl FnOnce(&mut MockElement)) {
        match self.element_mut(id) {
            Some(element) => f(element),
            None => debug!(id, "mock effect targets unknown element"),
        }
    }
}

/// Mock driver for unit testing and harness simulation
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create new mock driver with an empty DOM
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                elements: Vec::new(),
                click_effects: HashMap::new(),
                key_effects: HashMap::new(),
                typed: HashMap::new(),
                title: String::new(),
                url: String::from("about:blank"),
                viewport: Size::new(1920.0, 1080.0),
                navigated_at: None,
                snapshots: Vec::new(),
                call_history: Vec::new(),
                locate_failure: None,
                closed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.state().call_history.push(call);
    }

    /// Add a mock element
    pub fn add_element(&self, element: MockElement) {
        self.state().elements.push(element);
    }

    /// Script effects for clicks on an element
    pub fn on_click(&self, id: impl Into<String>, effects: Vec<MockEffect>) {
        self.state()
            .click_effects
            .entry(id.into())
            .or_default()
            .extend(effects);
    }

    /// Script effects for a special key, wherever it is sent
    pub fn on_key(&self, key: Key, effects: Vec<MockEffect>) {
        self.state().key_effects.entry(key).or_default().extend(effects);
    }

    /// Set the document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.state().title = title.into();
    }

    /// Set the viewport size
    pub fn set_viewport(&self, width: f64, height: f64) {
        self.state().viewport = Size::new(width, height);
    }

    /// Apply effects directly, outside any click
    pub fn apply(&self, effects: &[MockEffect]) {
        self.state().apply(effects);
    }

    /// Snapshot of one element's current state
    #[must_use]
    pub fn element(&self, id: &str) -> Option<MockElement> {
        self.state().element(id).cloned()
    }

    /// Text typed into an element so far
    #[must_use]
    pub fn typed_text(&self, id: &str) -> Option<String> {
        self.state().typed.get(id).cloned()
    }

    /// Labels of captured visual snapshots, in order
    #[must_use]
    pub fn snapshots(&self) -> Vec<String> {
        self.state().snapshots.clone()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Make every `locate` fail with the error `failure` builds; `None` heals
    pub fn fail_locate(&self, failure: Option<fn() -> ProbeError>) {
        self.state().locate_failure = failure;
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn locate(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>> {
        let selector = locator.selector();
        let mut state = self.state();
        state.call_history.push(format!("locate:{selector}"));
        if let Some(failure) = state.locate_failure {
            return Err(failure());
        }
        Ok(state
            .elements
            .iter()
            .filter(|e| e.attached && &e.selector == selector)
            .enumerate()
            .map(|(index, e)| ElementHandle::new(e.id.clone(), selector.clone(), index))
            .collect())
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> ProbeResult<bool> {
        let state = self.state();
        let element = state.attached(handle)?;
        Ok(state.is_displayed(element))
    }

    async fn is_selected(&self, handle: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.state().attached(handle)?.selected)
    }

    async fn click(&self, handle: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        let element = state.attached(handle)?;
        if !state.is_displayed(element) {
            return Err(ProbeError::driver(format!(
                "element '{}' is not interactable",
                handle.id
            )));
        }
        state.call_history.push(format!("click:{}", handle.id));
        let effects = state
            .click_effects
            .get(&handle.id)
            .cloned()
            .unwrap_or_default();
        state.apply(&effects);
        Ok(())
    }

    async fn send_keys(&self, handle: &ElementHandle, text: &str) -> ProbeResult<()> {
        let mut state = self.state();
        let _ = state.attached(handle)?;
        state.call_history.push(format!("send_keys:{}", handle.id));
        for c in text.chars() {
            if let Some(key) = Key::from_code_point(c) {
                let effects = state.key_effects.get(&key).cloned().unwrap_or_default();
                state.apply(&effects);
            } else {
                state.typed.entry(handle.id.clone()).or_default().push(c);
            }
        }
        Ok(())
    }

    async fn attribute(&self, handle: &ElementHandle, name: &str) -> ProbeResult<Option<String>> {
        Ok(self.state().attached(handle)?.attributes.get(name).cloned())
    }

    async fn text(&self, handle: &ElementHandle) -> ProbeResult<String> {
        let state = self.state();
        let element = state.attached(handle)?;
        // Like innerText, hidden elements render no text
        if state.is_displayed(element) {
            Ok(element.text.clone())
        } else {
            Ok(String::new())
        }
    }

    async fn element_size(&self, handle: &ElementHandle) -> ProbeResult<Size> {
        Ok(self.state().attached(handle)?.size)
    }

    async fn viewport_size(&self) -> ProbeResult<Size> {
        Ok(self.state().viewport)
    }

    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.state();
        state.call_history.push(format!("navigate:{url}"));
        state.url = url.to_string();
        state.navigated_at = Some(Instant::now());
        Ok(())
    }

    async fn current_title(&self) -> ProbeResult<String> {
        Ok(self.state().title.clone())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.state().url.clone())
    }

    async fn capture_visual_snapshot(&self, label: &str) -> ProbeResult<Screenshot> {
        let mut state = self.state();
        state.call_history.push(format!("snapshot:{label}"));
        state.snapshots.push(label.to_string());
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(label.as_bytes());
        Ok(Screenshot::new(label, data))
    }

    async fn close(&self) -> ProbeResult<()> {
        self.record("close".to_string());
        self.state().closed = true;
        Ok(())
    }
}
