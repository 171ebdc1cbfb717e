//! Page Root: the top-level section of one navigable screen.
//!
//! Readiness moves `NotLoaded -> Loading` on [`PageRoot::navigate`] and
//! `Loading -> Ready` once the readiness signal holds. A readiness timeout
//! leaves the page in `Loading`; navigating again starts over.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use tracing::{info, warn};

use crate::driver::{Screenshot, Session};
use crate::result::{ProbeError, ProbeResult};
use crate::section::{Scope, Section, SectionBuilder};
use crate::snapshot::SnapshotStore;
use crate::wait::{poll, WaitOptions, WaitOutcome};

/// Application-defined condition meaning "the screen has loaded"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessSignal {
    /// A root-scope element is displayed
    ElementVisible(String),
    /// A root-scope element is in the DOM
    ElementPresent(String),
}

impl ReadinessSignal {
    /// Element name the signal watches
    #[must_use]
    pub fn element(&self) -> &str {
        match self {
            Self::ElementVisible(name) | Self::ElementPresent(name) => name,
        }
    }
}

impl fmt::Display for ReadinessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementVisible(name) => write!(f, "{name} visible"),
            Self::ElementPresent(name) => write!(f, "{name} present"),
        }
    }
}

/// Page load state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadinessState {
    /// No navigation yet
    #[default]
    NotLoaded,
    /// Navigation issued, readiness not (yet) observed
    Loading,
    /// Readiness signal observed
    Ready,
}

/// Builder for [`PageRoot`]
#[derive(Debug)]
pub struct PageBuilder<P> {
    root: SectionBuilder<P>,
    url: Option<String>,
    signal: Option<ReadinessSignal>,
    wait: WaitOptions,
    snapshots: Option<SnapshotStore>,
}

impl<P> PageBuilder<P> {
    /// Start from the root section declaration
    #[must_use]
    pub fn new(root: SectionBuilder<P>) -> Self {
        Self {
            root,
            url: None,
            signal: None,
            wait: WaitOptions::default(),
            snapshots: None,
        }
    }

    /// Default URL for [`PageRoot::navigate`]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Readiness signal; without one the page is ready as soon as it loads
    #[must_use]
    pub fn ready_when(mut self, signal: ReadinessSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Options used by [`PageRoot::wait_for_ready_default`]
    #[must_use]
    pub const fn wait_options(mut self, options: WaitOptions) -> Self {
        self.wait = options;
        self
    }

    /// Persist every snapshot to this store
    #[must_use]
    pub fn snapshot_store(mut self, store: SnapshotStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// Bind the page to a session
    ///
    /// # Errors
    ///
    /// Build errors of the section tree, or
    /// [`ProbeError::UnknownElement`] when the readiness signal names an
    /// element the root does not declare.
    pub fn build(self, session: Session) -> ProbeResult<PageRoot<P>> {
        let root = self.root.build(&session)?;
        if let Some(signal) = &self.signal {
            let _ = root.locator(signal.element())?;
        }
        Ok(PageRoot {
            root,
            url: self.url,
            signal: self.signal,
            wait: self.wait,
            state: ReadinessState::NotLoaded,
            snapshots: self.snapshots,
        })
    }
}

/// Root of a page object tree, with navigation and readiness
#[derive(Debug)]
pub struct PageRoot<P> {
    root: Section<P>,
    url: Option<String>,
    signal: Option<ReadinessSignal>,
    wait: WaitOptions,
    state: ReadinessState,
    snapshots: Option<SnapshotStore>,
}

impl<P> Deref for PageRoot<P> {
    type Target = Section<P>;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl<P> PageRoot<P> {
    /// Current readiness state
    #[must_use]
    pub const fn state(&self) -> ReadinessState {
        self.state
    }

    /// Default URL, if configured
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Readiness signal, if configured
    #[must_use]
    pub const fn readiness_signal(&self) -> Option<&ReadinessSignal> {
        self.signal.as_ref()
    }

    /// Snapshot store, if configured
    #[must_use]
    pub const fn snapshots(&self) -> Option<&SnapshotStore> {
        self.snapshots.as_ref()
    }

    /// Navigate to `url`, or to the configured default URL
    ///
    /// # Errors
    ///
    /// [`ProbeError::InvalidState`] when neither URL is available, or the
    /// driver's navigation error.
    pub async fn navigate(&mut self, url: Option<&str>) -> ProbeResult<&mut Self> {
        let target = match url.or(self.url.as_deref()) {
            Some(target) => target.to_string(),
            None => {
                return Err(ProbeError::InvalidState {
                    message: format!("page '{}' has no URL to navigate to", self.root.name()),
                })
            }
        };
        info!(page = self.root.name(), url = %target, "navigating");
        self.root.session().navigate(&target).await?;
        self.state = ReadinessState::Loading;
        Ok(self)
    }

    /// Poll the readiness signal until it holds or `options.timeout_ms` elapses
    ///
    /// # Errors
    ///
    /// [`ProbeError::InvalidState`] before any navigation,
    /// [`ProbeError::ReadinessTimeout`] on timeout (state stays `Loading`),
    /// or driver errors.
    pub async fn wait_for_ready(&mut self, options: WaitOptions) -> ProbeResult<&mut Self> {
        if self.state == ReadinessState::NotLoaded {
            return Err(ProbeError::InvalidState {
                message: format!(
                    "wait_for_ready on page '{}' before navigate",
                    self.root.name()
                ),
            });
        }

        if let Some(signal) = &self.signal {
            let description = signal.to_string();
            let root = &self.root;
            let outcome = match signal {
                ReadinessSignal::ElementVisible(name) => {
                    poll(&options, &description, || root.is_visible(name)).await?
                }
                ReadinessSignal::ElementPresent(name) => {
                    poll(&options, &description, || root.is_present(name)).await?
                }
            };
            match outcome {
                WaitOutcome::Satisfied(waited) => {
                    info!(page = root.name(), signal = %description, elapsed = ?waited.elapsed, "page ready");
                }
                WaitOutcome::TimedOut { elapsed, .. } => {
                    warn!(page = root.name(), signal = %description, ?elapsed, "page not ready");
                    return Err(ProbeError::ReadinessTimeout {
                        page: root.name().to_string(),
                        ms: options.timeout_ms,
                        signal: description,
                    });
                }
            }
        }

        self.state = ReadinessState::Ready;
        Ok(self)
    }

    /// [`Self::wait_for_ready`] with the page's configured options
    ///
    /// # Errors
    ///
    /// Same as [`Self::wait_for_ready`].
    pub async fn wait_for_ready_default(&mut self) -> ProbeResult<&mut Self> {
        let options = self.wait;
        self.wait_for_ready(options).await
    }

    /// Document title
    ///
    /// # Errors
    ///
    /// Driver errors.
    pub async fn title(&self) -> ProbeResult<String> {
        self.root.session().current_title().await
    }

    /// Capture a labelled visual checkpoint, persisting it when a store is set
    ///
    /// # Errors
    ///
    /// Driver or store errors.
    pub async fn snapshot(&mut self, label: &str) -> ProbeResult<Screenshot> {
        let screenshot = self.root.session().capture_visual_snapshot(label).await?;
        match &mut self.snapshots {
            Some(store) => {
                let _ = store.save(&screenshot)?;
            }
            None => info!(label, bytes = screenshot.size_bytes(), "snapshot captured"),
        }
        Ok(screenshot)
    }
}

#[async_trait]
impl<P: Send + Sync> Scope for PageRoot<P> {
    fn scope_name(&self) -> &str {
        self.root.path()
    }

    async fn is_visible(&self, name: &str) -> ProbeResult<bool> {
        self.root.is_visible(name).await
    }

    async fn is_present(&self, name: &str) -> ProbeResult<bool> {
        self.root.is_present(name).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::{MockDriver, MockElement};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn page(mock: &Arc<MockDriver>) -> PageRoot<()> {
        let session: Session = mock.clone();
        PageBuilder::new(
            SectionBuilder::new("GreenComet")
                .element("mainContent", Selector::css("#main-content"))
                .child(
                    SectionBuilder::new("controls")
                        .root(Selector::css("#controls"))
                        .element("gridInput", Selector::css("#grid")),
                ),
        )
        .url("http://localhost:8080")
        .ready_when(ReadinessSignal::ElementVisible("mainContent".into()))
        .build(session)
        .unwrap()
    }

    mod build_tests {
        use super::*;

        #[test]
        fn test_signal_must_name_root_element() {
            let session: Session = Arc::new(MockDriver::new());
            let err = PageBuilder::new(SectionBuilder::<()>::new("app"))
                .ready_when(ReadinessSignal::ElementVisible("missing".into()))
                .build(session)
                .unwrap_err();
            assert!(matches!(err, ProbeError::UnknownElement { .. }));
        }

        #[test]
        fn test_deref_to_root_section() {
            let mock = Arc::new(MockDriver::new());
            let page = page(&mock);
            assert_eq!(page.state(), ReadinessState::NotLoaded);
            assert_eq!(page.section("controls").unwrap().path(), "GreenComet/controls");
            assert_eq!(page.url(), Some("http://localhost:8080"));
        }
    }

    mod readiness_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_before_navigate_is_invalid() {
            let mock = Arc::new(MockDriver::new());
            let mut page = page(&mock);
            let err = page.wait_for_ready(WaitOptions::new()).await.unwrap_err();
            assert!(matches!(err, ProbeError::InvalidState { .. }));
            assert_eq!(page.state(), ReadinessState::NotLoaded);
        }

        #[tokio::test]
        async fn test_navigate_uses_default_or_override() {
            let mock = Arc::new(MockDriver::new());
            let mut page = page(&mock);
            let _ = page.navigate(None).await.unwrap();
            assert_eq!(page.state(), ReadinessState::Loading);
            let _ = page.navigate(Some("http://localhost:9000/")).await.unwrap();
            assert_eq!(
                mock.history(),
                vec![
                    "navigate:http://localhost:8080".to_string(),
                    "navigate:http://localhost:9000/".to_string()
                ]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_ready_after_reveal() {
            let mock = Arc::new(MockDriver::new());
            mock.add_element(
                MockElement::new("main", Selector::css("#main-content"))
                    .revealed_after(Duration::from_millis(120)),
            );
            let mut page = page(&mock);
            let options = WaitOptions::new().with_timeout(1000).with_poll_interval(50);
            let _ = page
                .navigate(None)
                .await
                .unwrap()
                .wait_for_ready(options)
                .await
                .unwrap();
            assert_eq!(page.state(), ReadinessState::Ready);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_bounds_and_state() {
            let mock = Arc::new(MockDriver::new());
            let mut page = page(&mock);
            let _ = page.navigate(None).await.unwrap();

            let options = WaitOptions::new().with_timeout(300).with_poll_interval(70);
            let start = Instant::now();
            let err = page.wait_for_ready(options).await.unwrap_err();
            let elapsed = start.elapsed();

            match err {
                ProbeError::ReadinessTimeout { page, ms, signal } => {
                    assert_eq!(page, "GreenComet");
                    assert_eq!(ms, 300);
                    assert_eq!(signal, "mainContent visible");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(elapsed >= Duration::from_millis(300));
            assert!(elapsed <= Duration::from_millis(370));
            assert_eq!(page.state(), ReadinessState::Loading);
        }

        #[tokio::test(start_paused = true)]
        async fn test_driver_timeout_is_not_a_readiness_timeout() {
            let mock = Arc::new(MockDriver::new());
            let mut page = page(&mock);
            let _ = page.navigate(None).await.unwrap();
            mock.fail_locate(Some(|| ProbeError::Timeout {
                ms: 5,
                waited_for: "locate round-trip".to_string(),
            }));

            let err = page
                .wait_for_ready(WaitOptions::new().with_timeout(300))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 5, .. }), "{err}");
            assert_eq!(page.state(), ReadinessState::Loading);
        }

        #[tokio::test]
        async fn test_no_signal_ready_immediately() {
            let session: Session = Arc::new(MockDriver::new());
            let mut page = PageBuilder::new(SectionBuilder::<()>::new("bare"))
                .url("about:blank")
                .build(session)
                .unwrap();
            let _ = page.navigate(None).await.unwrap();
            let _ = page.wait_for_ready_default().await.unwrap();
            assert_eq!(page.state(), ReadinessState::Ready);
        }

        #[tokio::test]
        async fn test_navigate_without_url() {
            let session: Session = Arc::new(MockDriver::new());
            let mut page = PageBuilder::new(SectionBuilder::<()>::new("bare"))
                .build(session)
                .unwrap();
            assert!(matches!(
                page.navigate(None).await,
                Err(ProbeError::InvalidState { .. })
            ));
        }
    }

    mod snapshot_tests {
        use super::*;
        use tempfile::TempDir;

        #[tokio::test]
        async fn test_snapshot_persists_to_store() {
            let tmp = TempDir::new().unwrap();
            let mock = Arc::new(MockDriver::new());
            mock.set_title("Green Comet");
            let session: Session = mock.clone();
            let mut page = PageBuilder::new(SectionBuilder::<()>::new("app"))
                .snapshot_store(SnapshotStore::create(tmp.path()).unwrap())
                .build(session)
                .unwrap();

            let _ = page.snapshot("Splash screen").await.unwrap();
            assert_eq!(page.title().await.unwrap(), "Green Comet");
            let store = page.snapshots().unwrap();
            assert_eq!(store.entries().len(), 1);
            assert_eq!(store.entries()[0].file, "001-splash-screen.png");
            assert_eq!(mock.snapshots(), vec!["Splash screen".to_string()]);
        }
    }
}
