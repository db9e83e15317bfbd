//! The display context: one page and everything that writes to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use signage_core::config::Settings;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::layout::{Exclusions, LayoutTree, Placement, interpret, load_data};
use crate::page::{Metrics, Page, SharedPage, Viewport};
use crate::presenter::Presenter;
use crate::ticker::{TickerOptions, TickerRegistry};
use crate::video::VideoPlayer;

/// Key of the data reload queued on the video player.
const DATA_RELOAD_KEY: &str = "data-reload";

/// Owns the page, the ticker registry, the video player and the installed
/// layout.
///
/// Presenters and the video player are cheap handles onto the same state;
/// hand clones of them to layout loaders.
#[derive(Debug)]
pub struct Display {
    page: SharedPage,
    tickers: TickerRegistry,
    video: VideoPlayer,
    presenter: Presenter,
    tree: Mutex<Option<Arc<LayoutTree>>>,
}

impl Display {
    #[must_use]
    pub fn new(viewport: Viewport, metrics: Metrics, options: TickerOptions) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let page = SharedPage::new(Page::new(viewport, metrics));
            let tickers = TickerRegistry::new();
            let video = VideoPlayer::new(page.clone());
            let presenter = Presenter::new(page.clone(), tickers.clone(), options);

            let display = weak.clone();
            video.on_refresh(Arc::new(move || {
                if let Some(display) = display.upgrade() {
                    display.reload();
                }
            }));

            Self {
                page,
                tickers,
                video,
                presenter,
                tree: Mutex::new(None),
            }
        })
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Arc<Self> {
        Self::new(
            Viewport {
                width: settings.display.width,
                height: settings.display.height,
            },
            Metrics {
                heading_height: settings.display.heading_height,
                font_size: settings.display.font_size,
            },
            TickerOptions::from(&settings.ticker),
        )
    }

    fn tree(&self) -> MutexGuard<'_, Option<Arc<LayoutTree>>> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    #[must_use]
    pub fn tickers(&self) -> &TickerRegistry {
        &self.tickers
    }

    #[must_use]
    pub fn video(&self) -> &VideoPlayer {
        &self.video
    }

    #[must_use]
    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Installs `tree`, builds the page from it and loads every panel.
    pub fn install(&self, tree: LayoutTree) -> Placement {
        *self.tree() = Some(Arc::new(tree));
        self.reload().unwrap_or_default()
    }

    /// ## Summary
    /// Rebuilds the page from scratch and loads every panel.
    ///
    /// Every ticker is stopped and the video player forgotten before the
    /// page is cleared, so nothing from the old page keeps running. Returns
    /// `None` when no layout is installed.
    #[tracing::instrument(skip(self))]
    pub fn reload(&self) -> Option<Placement> {
        let tree = self.tree().clone()?;

        self.tickers.stop_all();
        self.video.reset();
        let placement = self.page.with(|page| {
            page.reset();
            interpret(page, &tree)
        });
        let loaded = load_data(&tree, Exclusions::none());
        tracing::info!(panels = loaded.len(), "Display reloaded");
        Some(placement)
    }

    /// Runs the loaders of every panel not in `exclude`.
    pub fn load_data(&self, exclude: impl Into<Exclusions>) -> Vec<String> {
        let Some(tree) = self.tree().clone() else {
            return Vec::new();
        };
        load_data(&tree, exclude)
    }

    /// ## Summary
    /// Reloads panel data once the current clip ends.
    ///
    /// Without a mounted video player there is no clip to wait for and the
    /// reload runs at once. A reload still waiting is replaced, not repeated.
    pub fn queue_data_reload(self: &Arc<Self>, exclude: Exclusions) {
        if self.video.is_mounted() {
            let display = Arc::downgrade(self);
            let queued = self.video.queue_keyed(DATA_RELOAD_KEY, move || {
                if let Some(display) = display.upgrade() {
                    display.load_data(exclude);
                }
            });
            tracing::debug!(replaced = !queued, "Data reload queued");
        } else {
            self.load_data(exclude);
        }
    }

    /// ## Summary
    /// Rebuilds the whole display once the current clip ends.
    ///
    /// Without a mounted video player the rebuild runs at once.
    pub fn request_refresh(&self, reason: &str) {
        tracing::info!(reason = %reason, "Display refresh requested");
        if self.video.is_mounted() {
            self.video.queue_refresh();
        } else {
            self.reload();
        }
    }

    /// ## Summary
    /// Queues a data reload every `every`, skipping `exclude`.
    ///
    /// The first reload comes one interval from now. A reload still queued
    /// from the previous tick means no clip end arrived for a whole
    /// interval; the deferred work then runs on the spot. The task ends on
    /// its own once the display is dropped.
    pub fn spawn_periodic_reload(
        self: &Arc<Self>,
        every: Duration,
        exclude: Exclusions,
    ) -> JoinHandle<()> {
        let display = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(display) = display.upgrade() else {
                    break;
                };
                let stale = display.video.is_queued(DATA_RELOAD_KEY);
                display.queue_data_reload(exclude.clone());
                if stale {
                    tracing::warn!("No clip end for a whole interval, running deferred work");
                    display.video.run_deferred();
                }
            }
        })
    }

    /// The page as served to the browser.
    #[must_use]
    pub fn render_document(&self, refresh_secs: u32) -> String {
        self.page.render_document(refresh_secs)
    }
}
