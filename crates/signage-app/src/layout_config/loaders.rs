use std::sync::Arc;

use chrono_tz::Tz;
use signage_core::config::Settings;
use signage_core::types::{DateRange, ReloadRequest};
use signage_display::{Display, Loader, Presenter, Selector, VideoOptions, VideoPlayer};
use signage_provider::client::http_client;
use signage_provider::{
    EventProvider, GoogleCalendar, MenuFeed, Merged, MovieLookup, RetryPolicy, Retrying,
    SharedProvider,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use super::{ContentSpec, PresenterKind};
use crate::error::{AppError, AppResult};

/// Everything a panel loader needs: where to write and where to fetch from.
#[derive(Debug, Clone)]
pub struct LoaderContext {
    presenter: Presenter,
    video: VideoPlayer,
    client: reqwest::Client,
    tz: Tz,
    menu_url: String,
    calendar_base_url: String,
    calendar_api_key: Option<String>,
    policy: RetryPolicy,
    movies: Option<MovieLookup>,
    escalate: Option<UnboundedSender<ReloadRequest>>,
}

impl LoaderContext {
    /// ## Summary
    /// Builds the context for `display` from the provider settings.
    ///
    /// ## Errors
    /// Returns an error if the timezone is unknown or the HTTP client cannot
    /// be built.
    pub fn new(display: &Display, settings: &Settings) -> AppResult<Self> {
        let providers = &settings.providers;
        let client = http_client(providers.timeout())?;
        let movies = providers.movie_lookup_url.as_ref().map(|url| {
            MovieLookup::new(
                client.clone(),
                url.clone(),
                providers.movie_lookup_key.clone(),
            )
        });

        Ok(Self {
            presenter: display.presenter().clone(),
            video: display.video().clone(),
            client,
            tz: settings.display.tz()?,
            menu_url: providers.menu_url.clone(),
            calendar_base_url: providers.calendar_base_url.clone(),
            calendar_api_key: providers.calendar_api_key.clone(),
            policy: RetryPolicy {
                max_retries: providers.max_retries,
            },
            movies,
            escalate: None,
        })
    }

    /// Fetches that run out of retries send a reload request on `tx`.
    #[must_use]
    pub fn escalate_to(mut self, tx: UnboundedSender<ReloadRequest>) -> Self {
        self.escalate = Some(tx);
        self
    }

    /// ## Summary
    /// The loader for the leaf panel `panel` filled with `content`.
    ///
    /// ## Errors
    /// Returns an error if a calendar panel lists no calendars.
    pub fn loader(&self, panel: &str, content: &ContentSpec) -> AppResult<Loader> {
        let loader: Loader = match content {
            ContentSpec::Video { path, list } => {
                let video = self.video.clone();
                let options = VideoOptions {
                    path: path.clone(),
                    list: list.clone(),
                    panel: panel.to_string(),
                };
                Arc::new(move || video.play_videos(options.clone()))
            }
            ContentSpec::Html { html } => {
                let presenter = self.presenter.clone();
                let selector = Selector::content_of(panel);
                let html = html.clone();
                Arc::new(move || presenter.write_html(&selector, &html))
            }
            ContentSpec::Menu { range, format } => {
                let menu = MenuFeed::new(self.client.clone(), self.menu_url.clone(), self.tz);
                let feed = self.feed(panel, *range, format.clone(), PresenterKind::Table, menu);
                Arc::new(move || feed.spawn_refresh())
            }
            ContentSpec::Calendar {
                calendars,
                range,
                format,
                presenter,
            } => {
                let source = self.calendars(panel, calendars)?;
                let feed = self.feed(panel, *range, format.clone(), *presenter, source);
                Arc::new(move || feed.spawn_refresh())
            }
        };
        Ok(loader)
    }

    /// Merges every listed calendar into one source.
    fn calendars(&self, panel: &str, calendars: &[String]) -> AppResult<SharedProvider> {
        let mut sources = calendars.iter().map(|id| -> SharedProvider {
            Arc::new(GoogleCalendar::new(
                self.client.clone(),
                self.calendar_base_url.clone(),
                id.clone(),
                self.calendar_api_key.clone(),
                self.tz,
            ))
        });
        let first = sources.next().ok_or_else(|| {
            AppError::InvalidLayout(format!("calendar panel '{panel}' lists no calendars"))
        })?;
        Ok(sources.fold(first, |merged, next| -> SharedProvider {
            Arc::new(Merged::new(merged, next))
        }))
    }

    fn feed(
        &self,
        panel: &str,
        range: DateRange,
        format: Option<String>,
        kind: PresenterKind,
        source: impl EventProvider + 'static,
    ) -> Arc<PanelFeed> {
        let mut retrying = Retrying::new(source, self.policy).named(panel);
        if let Some(tx) = &self.escalate {
            retrying = retrying.escalate_to(tx.clone());
        }
        Arc::new(PanelFeed {
            panel: panel.to_string(),
            selector: Selector::content_of(panel),
            range,
            format,
            kind,
            provider: Arc::new(retrying),
            presenter: self.presenter.clone(),
            movies: self.movies.clone(),
        })
    }
}

/// A panel filled from an event provider.
///
/// Each load fetches in the background and writes whatever comes back.
/// Nothing cancels a fetch in flight; a reply for a panel that has since
/// been rebuilt lands on a container that is no longer on the page.
#[derive(Clone)]
pub struct PanelFeed {
    panel: String,
    selector: Selector,
    range: DateRange,
    format: Option<String>,
    kind: PresenterKind,
    provider: SharedProvider,
    presenter: Presenter,
    movies: Option<MovieLookup>,
}

impl std::fmt::Debug for PanelFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelFeed")
            .field("panel", &self.panel)
            .field("range", &self.range)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl PanelFeed {
    #[must_use]
    pub fn panel(&self) -> &str {
        &self.panel
    }

    /// Starts a fetch on the current runtime.
    pub fn spawn_refresh(self: &Arc<Self>) {
        match Handle::try_current() {
            Ok(handle) => {
                let feed = Arc::clone(self);
                handle.spawn(async move { feed.refresh().await });
            }
            Err(err) => {
                tracing::warn!(panel = %self.panel, error = %err, "No async runtime, panel not loaded");
            }
        }
    }

    /// ## Summary
    /// Fetches the panel's events and writes them.
    ///
    /// A failed fetch leaves the panel as it was; the retry layer has
    /// already asked for a reload by then.
    #[tracing::instrument(skip(self), fields(panel = %self.panel, range = %self.range.as_str()))]
    pub async fn refresh(&self) {
        let events = match self.provider.fetch(self.range).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Panel fetch failed");
                return;
            }
        };
        tracing::debug!(count = events.len(), "Panel events fetched");

        let format = self.format.as_deref();
        match self.kind {
            PresenterKind::Table => self.presenter.write_table(&events, &self.selector, format),
            PresenterKind::Ticker => {
                if self
                    .presenter
                    .write_ticker(&events, &self.selector, format)
                    .is_none()
                {
                    tracing::debug!("No ticker started");
                }
            }
            PresenterKind::Movies => {
                let events = match &self.movies {
                    Some(lookup) => lookup.enrich_all(events).await,
                    None => events,
                };
                if self
                    .presenter
                    .write_ticker(&events, &self.selector, format)
                    .is_none()
                {
                    tracing::debug!("No ticker started");
                }
            }
        }
    }
}
