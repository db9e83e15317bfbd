use std::sync::Arc;

use futures::future::BoxFuture;
use signage_core::types::DateRange;
use signage_format::Event;

use crate::error::ProviderResult;

/// A source of events for a date range.
///
/// Each call to [`EventProvider::fetch`] resolves exactly once, with either
/// the events or the error that ended the fetch.
pub trait EventProvider: Send + Sync {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>>;
}

/// A provider shared between loaders.
pub type SharedProvider = Arc<dyn EventProvider>;

impl<P: EventProvider + ?Sized> EventProvider for Arc<P> {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        (**self).fetch(range)
    }
}

impl<P: EventProvider + ?Sized> EventProvider for Box<P> {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        (**self).fetch(range)
    }
}
