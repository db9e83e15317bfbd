//! Rotating single-item display.
//!
//! A ticker owns a container on the page and shows one of its items at a
//! time, fading to the next every period. Rotation runs on a tokio task that
//! holds only a weak handle, so a ticker nobody references winds down on its
//! own.

mod registry;

pub use registry::TickerRegistry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use signage_core::config::TickerConfig;
use signage_core::constants::{DEFAULT_TICKER_FADE_MS, DEFAULT_TICKER_PERIOD_MS};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::page::{NodeId, Selector, SharedPage};

/// Timing of a ticker's rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerOptions {
    pub period: Duration,
    /// Pause between hiding one item and showing the next.
    pub fade: Duration,
}

impl Default for TickerOptions {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(DEFAULT_TICKER_PERIOD_MS),
            fade: Duration::from_millis(DEFAULT_TICKER_FADE_MS),
        }
    }
}

impl From<&TickerConfig> for TickerOptions {
    fn from(config: &TickerConfig) -> Self {
        Self {
            period: config.period(),
            fade: config.fade(),
        }
    }
}

#[derive(Debug, Default)]
struct TickerState {
    items: Vec<String>,
    /// Page fragment of each item; `None` when the container was gone.
    nodes: Vec<Option<NodeId>>,
    current: usize,
    interval: Option<JoinHandle<()>>,
    height: f64,
    schedules: u64,
}

#[derive(Debug)]
struct TickerInner {
    selector: Selector,
    page: SharedPage,
    options: TickerOptions,
    state: Mutex<TickerState>,
}

/// Handle to a ticker. Clones share the same ticker.
///
/// Locking order is ticker state, then page. Neither lock is held across an
/// `.await`.
#[derive(Debug, Clone)]
pub struct Ticker {
    inner: Arc<TickerInner>,
}

impl Ticker {
    /// Creates an unregistered ticker over the container `selector`.
    #[must_use]
    pub fn new(page: SharedPage, selector: Selector, options: TickerOptions) -> Self {
        let ticker = Self {
            inner: Arc::new(TickerInner {
                selector,
                page,
                options,
                state: Mutex::new(TickerState::default()),
            }),
        };
        ticker.set_size();
        ticker
    }

    /// Creates a ticker and registers it, stopping any ticker previously
    /// registered for the same container.
    #[must_use]
    pub fn create(
        registry: &TickerRegistry,
        page: SharedPage,
        selector: Selector,
        options: TickerOptions,
    ) -> Self {
        let ticker = Self::new(page, selector, options);
        registry.register(ticker.clone());
        ticker
    }

    fn state(&self) -> MutexGuard<'_, TickerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.inner.selector
    }

    #[must_use]
    pub fn options(&self) -> TickerOptions {
        self.inner.options
    }

    #[must_use]
    pub fn items(&self) -> Vec<String> {
        self.state().items.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the item currently shown.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state().current
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state().interval.is_some()
    }

    /// Number of rotation tasks this ticker has ever scheduled.
    #[must_use]
    pub fn schedule_count(&self) -> u64 {
        self.state().schedules
    }

    /// Height last computed by [`Ticker::set_size`].
    #[must_use]
    pub fn height(&self) -> f64 {
        self.state().height
    }

    /// Whether both handles refer to the same ticker.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// ## Summary
    /// Appends an item and makes sure the ticker is rotating.
    ///
    /// The first item of an empty ticker is shown at once; later items start
    /// hidden. The container is resized, and rotation is started unless it
    /// already runs.
    pub fn add_item(&self, html: impl Into<String>) {
        let html = html.into();
        let selector = &self.inner.selector;

        let running = {
            let mut state = self.state();
            let first = state.items.is_empty();
            let node = self.inner.page.with(|page| {
                let container = page.select(selector)?;
                let node = page.append_html(container, &html)?;
                page.set_visible(node, first);
                Some(node)
            });
            if node.is_none() {
                tracing::debug!(selector = %selector, "Ticker container is gone");
            }
            state.items.push(html);
            state.nodes.push(node);
            state.interval.is_some()
        };

        self.set_size();
        if !running {
            self.start();
        }
    }

    /// ## Summary
    /// Starts rotating, replacing any running rotation.
    ///
    /// The first rotation happens one period from now. Starting twice leaves
    /// exactly one rotation task alive. Outside a tokio runtime nothing is
    /// scheduled.
    pub fn start(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(selector = %self.inner.selector, "No runtime to rotate ticker on");
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.options.period;
        let mut state = self.state();
        if let Some(previous) = state.interval.take() {
            previous.abort();
        }
        state.schedules += 1;
        state.interval = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !(Self { inner }).rotate_once().await {
                    break;
                }
            }
        }));
        tracing::trace!(selector = %self.inner.selector, "Ticker started");
    }

    /// Stops rotating. A no-op when not running.
    pub fn stop(&self) {
        if let Some(handle) = self.state().interval.take() {
            handle.abort();
            tracing::trace!(selector = %self.inner.selector, "Ticker stopped");
        }
    }

    /// ## Summary
    /// Advances to the next item.
    ///
    /// With two or more items the current item is hidden, the fade is
    /// awaited, and the next item (wrapping around) is shown. With fewer the
    /// sole item, if any, is shown and the ticker stops.
    pub async fn rotate(&self) {
        self.rotate_once().await;
    }

    /// One rotation step; `false` once the ticker has stopped itself.
    async fn rotate_once(&self) -> bool {
        let (outgoing, count) = {
            let state = self.state();
            (
                state.nodes.get(state.current).copied().flatten(),
                state.items.len(),
            )
        };

        if count < 2 {
            if let Some(node) = outgoing {
                self.inner.page.with(|page| page.set_visible(node, true));
            }
            self.stop();
            return false;
        }

        if let Some(node) = outgoing {
            self.inner.page.with(|page| page.set_visible(node, false));
        }
        tokio::time::sleep(self.inner.options.fade).await;

        let mut state = self.state();
        if state.items.is_empty() {
            return false;
        }
        state.current = (state.current + 1) % state.items.len();
        if let Some(node) = state.nodes.get(state.current).copied().flatten() {
            self.inner.page.with(|page| page.set_visible(node, true));
        }
        true
    }

    /// ## Summary
    /// Fits the container into the space its siblings leave.
    ///
    /// The height is the parent's outer height minus the outer heights of
    /// the container's siblings minus its own vertical padding, never less
    /// than zero. Images in the items are rendered at that height. Returns
    /// the height, or zero when the container is not on the page.
    pub fn set_size(&self) -> f64 {
        let mut state = self.state();
        let height = self
            .inner
            .page
            .with(|page| {
                let container = page.select(&self.inner.selector)?;
                let parent = page.parent(container)?;
                let siblings: f64 = page
                    .siblings(container)
                    .into_iter()
                    .map(|sibling| page.outer_height(sibling))
                    .sum();
                let padding = page.padding(container).vertical();
                let height = (page.outer_height(parent) - siblings - padding).max(0.0);
                page.set_media_height(container, height);
                Some(height)
            })
            .unwrap_or_default();
        state.height = height;
        height
    }
}
