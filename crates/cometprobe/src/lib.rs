//! Cometprobe: page objects and batch assertions for browser acceptance tests
//!
//! A page is declared once as a tree of named sections, each with its own
//! registry of symbolic element names. Test steps then talk in names
//! (`controls.click("openCloseButton")`), and batch utilities check a whole
//! list of names at once, reporting every violation instead of the first.
//!
//! # Architecture
//!
//! ```text
//! Scenario steps
//!   │
//!   ├── PageRoot ── navigate / wait_for_ready / snapshot
//!   │     └── Section ── LocatorRegistry (name -> Locator)
//!   │           └── Section ...
//!   │
//!   ├── expect_all_visible / expect_all_not_present (batch)
//!   └── expect::* (single element, fail hard)
//!                │
//!                ▼
//!        Session = Arc<dyn BrowserDriver>
//!          ├── ChromiumDriver (feature "browser")
//!          └── MockDriver
//! ```
//!
//! # Example
//!
//! ```ignore
//! let page = PageBuilder::new(
//!     SectionBuilder::<()>::new("app")
//!         .element("mainContent", Selector::css("#main-content"))
//!         .child(
//!             SectionBuilder::new("controls")
//!                 .root(Selector::css("#controls"))
//!                 .element("gridInput", Selector::css("#grid-checkbox")),
//!         ),
//! )
//! .url("http://localhost:8080")
//! .ready_when(ReadinessSignal::ElementVisible("mainContent".into()))
//! .build(session)?;
//!
//! let controls = page.section("controls")?;
//! let result = expect_all_visible(controls, &["gridInput"]).await?;
//! assert!(result.success(), "{result}");
//! ```

#![warn(missing_docs)]

mod batch;
#[cfg(feature = "browser")]
mod chromium;
mod driver;
/// Single-element expectations that fail hard
pub mod expect;
mod locator;
mod mock;
mod page;
mod result;
mod section;
mod snapshot;
mod wait;

pub use batch::{
    expect_all, expect_all_not_present, expect_all_visible, BatchAssertionResult, ElementState,
    Predicate, Violation,
};
#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;
pub use driver::{
    BrowserDriver, DeviceDescriptor, DriverConfig, ElementHandle, Key, Screenshot, Session, Size,
};
pub use locator::{Locator, LocatorRegistry, Selector};
pub use mock::{MockDriver, MockEffect, MockElement};
pub use page::{PageBuilder, PageRoot, ReadinessSignal, ReadinessState};
pub use result::{ProbeError, ProbeResult};
pub use section::{Scope, Section, SectionBuilder};
pub use snapshot::{slugify, SnapshotEntry, SnapshotStore, MANIFEST_FILE};
pub use wait::{
    poll, poll_until, WaitOptions, WaitOutcome, WaitResult, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::batch::*;
    #[cfg(feature = "browser")]
    pub use super::chromium::*;
    pub use super::driver::*;
    pub use super::expect::*;
    pub use super::locator::*;
    pub use super::mock::*;
    pub use super::page::*;
    pub use super::result::*;
    pub use super::section::*;
    pub use super::snapshot::*;
    pub use super::wait::*;
}
