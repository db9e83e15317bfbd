//! Writers that put events on the page.

use signage_core::constants::NO_EVENTS;
use signage_format::{Event, derive_format, expand_ticker, render_table};

use crate::page::{Selector, SharedPage};
use crate::ticker::{Ticker, TickerOptions, TickerRegistry};

/// Writes events into panel containers as tables or tickers.
///
/// A container that is no longer on the page (a reload happened while the
/// data was in flight) is skipped without error.
#[derive(Debug, Clone)]
pub struct Presenter {
    page: SharedPage,
    tickers: TickerRegistry,
    options: TickerOptions,
}

impl Presenter {
    #[must_use]
    pub fn new(page: SharedPage, tickers: TickerRegistry, options: TickerOptions) -> Self {
        Self {
            page,
            tickers,
            options,
        }
    }

    /// Replaces the container's contents with a table of `events`, or with
    /// `No events` when there are none.
    pub fn write_table(&self, events: &[Event], selector: &Selector, format: Option<&str>) {
        let html = render_table(events, format);
        let written = self.page.with(|page| {
            let container = page.select(selector)?;
            page.set_html(container, &html)
        });
        if written.is_none() {
            tracing::debug!(selector = %selector, "Table container is gone");
        }
    }

    /// ## Summary
    /// Replaces the container's contents with a ticker over `events`.
    ///
    /// Any ticker already rotating in the container is stopped first. With
    /// no events the container shows `No events` and no ticker is created.
    /// Returns the new ticker.
    pub fn write_ticker(
        &self,
        events: &[Event],
        selector: &Selector,
        format: Option<&str>,
    ) -> Option<Ticker> {
        let found = self.page.with(|page| {
            let container = page.select(selector)?;
            page.add_class(container, "ticker");
            page.clear(container);
            if events.is_empty() {
                page.set_html(container, NO_EVENTS);
            }
            Some(container)
        });

        if events.is_empty() {
            self.tickers.remove(selector);
            return None;
        }
        if found.is_none() {
            tracing::debug!(selector = %selector, "Ticker container is gone");
            return None;
        }

        let derived = derive_format(format);
        let ticker = Ticker::create(
            &self.tickers,
            self.page.clone(),
            selector.clone(),
            self.options,
        );
        for event in events {
            ticker.add_item(expand_ticker(
                event,
                &derived.format,
                &derived.start_spec,
                &derived.end_spec,
            ));
        }
        tracing::debug!(selector = %selector, items = events.len(), "Ticker written");
        Some(ticker)
    }

    /// Replaces the container's contents with literal HTML.
    pub fn write_html(&self, selector: &Selector, html: &str) {
        self.page.with(|page| {
            if let Some(container) = page.select(selector) {
                page.set_html(container, html);
            }
        });
    }
}
