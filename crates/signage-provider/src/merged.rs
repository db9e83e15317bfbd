use futures::future::{BoxFuture, try_join};
use signage_core::types::DateRange;
use signage_format::{Event, sort_by_time};

use crate::error::ProviderResult;
use crate::provider::EventProvider;

/// Two providers fetched concurrently and shown as one, ordered by start
/// time.
#[derive(Debug)]
pub struct Merged<A, B> {
    first: A,
    second: B,
}

impl<A: EventProvider, B: EventProvider> Merged<A, B> {
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: EventProvider, B: EventProvider> EventProvider for Merged<A, B> {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let (mut events, more) =
                try_join(self.first.fetch(range), self.second.fetch(range)).await?;
            events.extend(more);
            sort_by_time(&mut events);
            Ok(events)
        })
    }
}
