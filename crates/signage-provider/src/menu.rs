//! Daily menu feed.
//!
//! The feed answers a month at a time, keyed by `yyyy/MM/dd`, each day an
//! object of meal name to description:
//!
//! ```json
//! { "data": { "2011/12/05": { "BREAKFAST": "Pancakes", "LUNCH": "Soup" } } }
//! ```

use chrono::{Datelike, Days, NaiveDate};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use serde_json::Value;
use signage_core::types::DateRange;
use signage_format::html::capitalize_words;
use signage_format::{Event, sort_by_mealtime};

use crate::client::{get_json, today_in, url_with_params};
use crate::error::ProviderResult;
use crate::provider::EventProvider;

#[derive(Debug, Clone)]
pub struct MenuFeed {
    client: reqwest::Client,
    url: String,
    tz: Tz,
}

impl MenuFeed {
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>, tz: Tz) -> Self {
        Self {
            client,
            url: url.into(),
            tz,
        }
    }

    /// ## Summary
    /// The feed URL for the month containing `day`.
    ///
    /// ## Errors
    /// Returns an error if the configured URL does not parse.
    pub fn query_url(&self, day: NaiveDate) -> ProviderResult<reqwest::Url> {
        url_with_params(
            &self.url,
            [
                ("format", "json".to_string()),
                ("month", day.month().to_string()),
                ("year", day.year().to_string()),
            ],
        )
    }
}

/// The day a menu range refers to. Only today and tomorrow have menus;
/// anything else means today.
#[must_use]
pub fn menu_day(range: DateRange, today: NaiveDate) -> NaiveDate {
    match range {
        DateRange::Tomorrow => today + Days::new(1),
        DateRange::Today | DateRange::Week | DateRange::Upcoming => today,
    }
}

/// ## Summary
/// Turns the feed body into one event per meal served on `day`.
///
/// Meal names are title-cased and the meals put in serving order. A day
/// missing from the feed has no meals; a description that is not a string
/// is shown empty.
#[must_use]
pub fn events_for_day(body: &Value, day: NaiveDate) -> Vec<Event> {
    let key = day.format("%Y/%m/%d").to_string();
    let Some(meals) = body
        .get("data")
        .and_then(|data| data.get(&key))
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    let mut events: Vec<Event> = meals
        .iter()
        .map(|(meal, description)| {
            Event::titled(capitalize_words(&meal.to_lowercase()))
                .description(description.as_str().unwrap_or_default())
                .build_on(day)
        })
        .collect();
    sort_by_mealtime(&mut events);
    events
}

impl EventProvider for MenuFeed {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let day = menu_day(range, today_in(self.tz));
            let body: Value = get_json(&self.client, self.query_url(day)?).await?;
            let events = events_for_day(&body, day);
            tracing::debug!(day = %day, meals = events.len(), "Menu fetched");
            Ok(events)
        })
    }
}
