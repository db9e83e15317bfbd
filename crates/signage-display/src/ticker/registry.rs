use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::page::Selector;
use crate::ticker::Ticker;

/// Live tickers, at most one per container.
///
/// Replacing a ticker stops the old one before the new one is recorded, so a
/// container never has two rotations fighting over it.
#[derive(Debug, Clone, Default)]
pub struct TickerRegistry {
    tickers: Arc<Mutex<HashMap<Selector, Ticker>>>,
}

impl TickerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tickers(&self) -> MutexGuard<'_, HashMap<Selector, Ticker>> {
        self.tickers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `ticker` for its container, stopping and returning the ticker
    /// it replaces.
    pub fn register(&self, ticker: Ticker) -> Option<Ticker> {
        let mut tickers = self.tickers();
        let previous = tickers.remove(ticker.selector());
        if let Some(previous) = &previous
            && !previous.same_as(&ticker)
        {
            tracing::debug!(selector = %ticker.selector(), "Replacing ticker");
            previous.stop();
        }
        tickers.insert(ticker.selector().clone(), ticker);
        previous
    }

    #[must_use]
    pub fn get(&self, selector: &Selector) -> Option<Ticker> {
        self.tickers().get(selector).cloned()
    }

    /// Stops and forgets the ticker for `selector`.
    pub fn remove(&self, selector: &Selector) -> Option<Ticker> {
        let removed = self.tickers().remove(selector);
        if let Some(ticker) = &removed {
            ticker.stop();
        }
        removed
    }

    /// Stops and forgets every ticker.
    pub fn stop_all(&self) {
        let drained: Vec<Ticker> = self.tickers().drain().map(|(_, t)| t).collect();
        for ticker in &drained {
            ticker.stop();
        }
        tracing::debug!(stopped = drained.len(), "Stopped all tickers");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tickers().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickers().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::page::{Metrics, Page, SharedPage, Viewport};
    use crate::ticker::TickerOptions;

    fn page() -> SharedPage {
        let mut page = Page::new(
            Viewport {
                width: 400.0,
                height: 300.0,
            },
            Metrics::default(),
        );
        let body = page.body();
        if let Some(panel) = page.create_child(body, "div") {
            page.set_id(panel, "events");
            if let Some(content) = page.create_child(panel, "div") {
                page.add_class(content, "content");
            }
        }
        SharedPage::new(page)
    }

    fn options() -> TickerOptions {
        TickerOptions {
            period: Duration::from_millis(500),
            fade: Duration::from_millis(50),
        }
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn replacement_stops_the_predecessor() {
        let page = page();
        let registry = TickerRegistry::new();
        let selector = Selector::content_of("events");

        let first = Ticker::create(&registry, page.clone(), selector.clone(), options());
        first.add_item("a");
        first.add_item("b");
        assert!(first.is_running());

        let second = Ticker::create(&registry, page.clone(), selector.clone(), options());
        assert!(!first.is_running());
        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .get(&selector)
                .is_some_and(|current| current.same_as(&second))
        );

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(first.current_index(), 0);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn remove_and_stop_all_stop_tickers() {
        let page = page();
        let registry = TickerRegistry::new();
        let events = Selector::content_of("events");
        let other = Selector::id("other");

        let a = Ticker::create(&registry, page.clone(), events.clone(), options());
        a.add_item("x");
        let b = Ticker::create(&registry, page.clone(), other, options());
        b.add_item("y");
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(&events).is_some());
        assert!(!a.is_running());
        assert_eq!(registry.len(), 1);

        registry.stop_all();
        assert!(!b.is_running());
        assert!(registry.is_empty());
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn registering_the_same_ticker_twice_keeps_it_running() {
        let page = page();
        let registry = TickerRegistry::new();
        let ticker = Ticker::create(&registry, page, Selector::content_of("events"), options());
        ticker.add_item("a");
        ticker.add_item("b");
        registry.register(ticker.clone());
        assert!(ticker.is_running());
    }
}
