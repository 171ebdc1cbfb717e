//! Driver capability: the only way Cometprobe talks to a browser.
//!
//! # Architecture
//!
//! ```text
//! BrowserDriver (async trait, shared as Session)
//!  ├── ChromiumDriver   CDP via chromiumoxide (feature "browser")
//!  └── MockDriver       scripted in-memory DOM (unit tests, --simulate)
//! ```
//!
//! Every method is one round-trip. Callers await each call before issuing
//! the next, so operations against a session never reorder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::locator::{Locator, Selector};
use crate::result::ProbeResult;

/// Shared reference to a live browser session.
///
/// The page tree holds clones of this `Arc`; opening and closing the
/// session belongs to whoever created the driver.
pub type Session = Arc<dyn BrowserDriver>;

/// Handle to one live element, as returned by [`BrowserDriver::locate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific identifier
    pub id: String,
    /// Selector the element was located with
    pub selector: Selector,
    /// Position among the selector's matches
    pub index: usize,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, selector: Selector, index: usize) -> Self {
        Self {
            id: id.into(),
            selector,
            index,
        }
    }
}

/// Rendered size in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a new size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Checkpoint label
    pub label: String,
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            data,
            timestamp: std::time::SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Special keys, encoded as WebDriver private-use code points so they can
/// travel inside a `send_keys` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Backspace
    Backspace,
    /// Tab
    Tab,
    /// Enter
    Enter,
    /// Escape
    Escape,
    /// Arrow left
    ArrowLeft,
    /// Arrow right
    ArrowRight,
}

impl Key {
    /// All special keys
    pub const ALL: [Self; 6] = [
        Self::Backspace,
        Self::Tab,
        Self::Enter,
        Self::Escape,
        Self::ArrowLeft,
        Self::ArrowRight,
    ];

    /// WebDriver code point
    #[must_use]
    pub const fn code_point(self) -> char {
        match self {
            Self::Backspace => '\u{E003}',
            Self::Tab => '\u{E004}',
            Self::Enter => '\u{E007}',
            Self::Escape => '\u{E00C}',
            Self::ArrowLeft => '\u{E012}',
            Self::ArrowRight => '\u{E014}',
        }
    }

    /// DOM `KeyboardEvent.key` name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Backspace => "Backspace",
            Self::Tab => "Tab",
            Self::Enter => "Enter",
            Self::Escape => "Escape",
            Self::ArrowLeft => "ArrowLeft",
            Self::ArrowRight => "ArrowRight",
        }
    }

    /// Decode a code point back into a key
    #[must_use]
    pub fn from_code_point(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code_point() == c)
    }

    /// The key as a one-character string for `send_keys`
    #[must_use]
    pub fn as_text(self) -> String {
        self.code_point().to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Browser configuration for driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Emulate a mobile device
    pub is_mobile: bool,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timeout for navigation
    #[serde(with = "duration_ms")]
    pub navigation_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            is_mobile: false,
            user_agent: None,
            navigation_timeout: Duration::from_secs(30),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set browser executable
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Device descriptor for emulation
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Device name
    pub name: &'static str,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Is mobile device
    pub is_mobile: bool,
    /// Default user agent
    pub user_agent: &'static str,
}

impl DeviceDescriptor {
    /// iPhone 14 Pro
    pub const IPHONE_14_PRO: Self = Self {
        name: "iPhone 14 Pro",
        viewport_width: 393,
        viewport_height: 852,
        is_mobile: true,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15",
    };

    /// Desktop 1080p
    pub const DESKTOP_1080P: Self = Self {
        name: "Desktop 1080p",
        viewport_width: 1920,
        viewport_height: 1080,
        is_mobile: false,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0",
    };

    /// Convert to driver config
    #[must_use]
    pub fn to_config(&self) -> DriverConfig {
        let mut config = DriverConfig::default()
            .viewport(self.viewport_width, self.viewport_height)
            .user_agent(self.user_agent);
        config.is_mobile = self.is_mobile;
        config
    }
}

/// Abstract driver trait for browser automation.
///
/// # Implementations
///
/// - `ChromiumDriver` - CDP via chromiumoxide (feature `browser`)
/// - [`MockDriver`](crate::MockDriver) - scripted in-memory DOM
#[async_trait]
pub trait BrowserDriver: fmt::Debug + Send + Sync {
    /// Resolve a locator to every live match, possibly none
    async fn locate(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>>;

    /// Whether a locator currently matches anything
    async fn exists(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(!self.locate(locator).await?.is_empty())
    }

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, handle: &ElementHandle) -> ProbeResult<bool>;

    /// Whether a checkbox, radio or option is selected
    async fn is_selected(&self, handle: &ElementHandle) -> ProbeResult<bool>;

    /// Click the element
    async fn click(&self, handle: &ElementHandle) -> ProbeResult<()>;

    /// Type text into the element; [`Key`] code points press special keys
    async fn send_keys(&self, handle: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Read an attribute
    async fn attribute(&self, handle: &ElementHandle, name: &str) -> ProbeResult<Option<String>>;

    /// Read the rendered text
    async fn text(&self, handle: &ElementHandle) -> ProbeResult<String>;

    /// Rendered element size
    async fn element_size(&self, handle: &ElementHandle) -> ProbeResult<Size>;

    /// Viewport size (excluding browser chrome)
    async fn viewport_size(&self) -> ProbeResult<Size>;

    /// Navigate to URL
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Document title
    async fn current_title(&self) -> ProbeResult<String>;

    /// Current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Capture a labelled visual snapshot of the viewport
    async fn capture_visual_snapshot(&self, label: &str) -> ProbeResult<Screenshot>;

    /// Close the session
    async fn close(&self) -> ProbeResult<()>;
}
