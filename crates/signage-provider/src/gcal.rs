//! Google Calendar v3 events feed.

use chrono::{NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use serde::Deserialize;
use signage_core::types::{DateRange, RangeWindow, day_start};
use signage_format::Event;

use crate::client::{get_json, today_in};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::EventProvider;

#[derive(Debug, Default, Deserialize)]
pub struct CalendarResponse {
    #[serde(default)]
    pub items: Vec<CalendarItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarItem {
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl EventTime {
    /// Wall-clock time of the entry.
    ///
    /// Timed entries are read from the first 19 characters of `dateTime`,
    /// which drops the UTC offset. All-day entries start at midnight.
    #[must_use]
    pub fn wall_clock(&self) -> Option<NaiveDateTime> {
        if let Some(date_time) = &self.date_time {
            let local = date_time.get(..19).unwrap_or(date_time);
            return NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S").ok();
        }
        let date = self.date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(day_start)
    }
}

/// One public calendar.
#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    client: reqwest::Client,
    base_url: String,
    calendar_id: String,
    api_key: Option<String>,
    tz: Tz,
}

impl GoogleCalendar {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        calendar_id: impl Into<String>,
        api_key: Option<String>,
        tz: Tz,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            calendar_id: calendar_id.into(),
            api_key,
            tz,
        }
    }

    #[must_use]
    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// ## Summary
    /// The events URL for `window`.
    ///
    /// Window bounds are wall-clock times in the calendar's timezone and are
    /// sent as UTC. An unbounded window sends no `timeMax`.
    ///
    /// ## Errors
    /// Returns an error if the base URL does not parse or cannot take path
    /// segments.
    pub fn query_url(&self, window: &RangeWindow) -> ProviderResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeMin", &utc_timestamp(window.start, self.tz));
            if let Some(end) = window.end {
                query.append_pair("timeMax", &utc_timestamp(end, self.tz));
            }
            query
                .append_pair("singleEvents", "true")
                .append_pair("orderBy", "startTime");
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        Ok(url)
    }
}

/// RFC 3339 UTC form of a wall-clock time in `tz`.
fn utc_timestamp(local: NaiveDateTime, tz: Tz) -> String {
    tz.from_local_datetime(&local)
        .earliest()
        .map_or_else(|| local.and_utc(), |dt| dt.with_timezone(&Utc))
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// ## Summary
/// Maps a calendar response to events.
///
/// Missing text fields become empty strings and missing or unreadable
/// times fall back to the bounds of `day`.
#[must_use]
pub fn events_from_response(response: CalendarResponse, day: NaiveDate) -> Vec<Event> {
    response
        .items
        .into_iter()
        .map(|item| {
            let mut draft = Event::titled(item.summary.unwrap_or_default())
                .location(item.location.unwrap_or_default())
                .description(item.description.unwrap_or_default());
            draft.start = item.start.as_ref().and_then(EventTime::wall_clock);
            draft.end = item.end.as_ref().and_then(EventTime::wall_clock);
            draft.build_on(day)
        })
        .collect()
}

impl EventProvider for GoogleCalendar {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let window = range.window(today_in(self.tz));
            let url = self.query_url(&window)?;
            let response: CalendarResponse = get_json(&self.client, url).await?;
            let events = events_from_response(response, window.first_day());
            tracing::debug!(
                calendar = %self.calendar_id,
                range = %range,
                events = events.len(),
                "Calendar fetched"
            );
            Ok(events)
        })
    }
}
