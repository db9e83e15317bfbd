//! Event sources: the calendar, the menu feed and the movie lookup, plus
//! the combinators (retry, merge) the display composes them with.

pub mod client;
pub mod error;
pub mod gcal;
pub mod menu;
pub mod merged;
pub mod movie;
pub mod provider;
pub mod retry;

pub use error::{ProviderError, ProviderResult};
pub use gcal::GoogleCalendar;
pub use menu::MenuFeed;
pub use merged::Merged;
pub use movie::MovieLookup;
pub use provider::{EventProvider, SharedProvider};
pub use retry::{RetryPolicy, Retrying};
