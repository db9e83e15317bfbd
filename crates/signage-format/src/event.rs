//! Unified event record shared by every provider and presenter.

use std::cmp::Ordering;

use chrono::{Local, NaiveDate, NaiveDateTime};
use signage_core::types::{day_end, day_start};

/// A single displayable item: a calendar entry, a meal, a movie showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub location: String,
    pub description: String,
    /// Image reference (URL) shown alongside the event in a ticker.
    pub attachment: Option<String>,
}

impl Event {
    /// Starts a draft with only the title set.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> EventDraft {
        EventDraft {
            title: Some(title.into()),
            ..EventDraft::default()
        }
    }
}

/// Partial field set an [`Event`] is constructed from.
///
/// ## Summary
/// Unset times default to the bounds of the current day, unset text fields
/// to the empty string. A missing title is not an error: the event simply
/// carries an empty title and callers wanting stricter validation must do it
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub attachment: Option<String>,
}

impl EventDraft {
    #[must_use]
    pub fn start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    /// Builds the event, defaulting times to the local current day.
    #[must_use]
    pub fn build(self) -> Event {
        self.build_on(Local::now().date_naive())
    }

    /// Builds the event, defaulting times to the bounds of `day`.
    #[must_use]
    pub fn build_on(self, day: NaiveDate) -> Event {
        Event {
            title: self.title.unwrap_or_default(),
            start: self.start.unwrap_or_else(|| day_start(day)),
            end: self.end.unwrap_or_else(|| day_end(day)),
            location: self.location.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            attachment: self.attachment,
        }
    }
}

/// Orders events ascending by start time.
///
/// Used with a stable sort, events sharing a start keep their input order.
#[must_use]
pub fn by_time(a: &Event, b: &Event) -> Ordering {
    a.start.cmp(&b.start)
}

/// Stable sort by start time.
pub fn sort_by_time(events: &mut [Event]) {
    events.sort_by(by_time);
}

/// Known meals, in serving order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mealtime {
    Breakfast,
    Lunch,
    Dinner,
}

impl Mealtime {
    /// Matches a title case-insensitively; anything else is not a meal.
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        match title.to_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            _ => None,
        }
    }
}

/// Orders breakfast before lunch before dinner.
///
/// Any comparison involving a title that is not a known meal is `Equal`.
/// This is a weak order, not a total one: with `lunch`, `other`,
/// `breakfast` the relation is not transitive. Never hand it to
/// `slice::sort_by` directly; use [`sort_by_mealtime`].
#[must_use]
pub fn by_mealtime(a: &Event, b: &Event) -> Ordering {
    match (Mealtime::from_title(&a.title), Mealtime::from_title(&b.title)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// ## Summary
/// Sorts meals into serving order without disturbing other events.
///
/// Events whose titles are known meals are stably reordered among the slots
/// known meals already occupy; every other event stays exactly where it was.
pub fn sort_by_mealtime(events: &mut [Event]) {
    let slots: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| Mealtime::from_title(&event.title).is_some())
        .map(|(idx, _)| idx)
        .collect();

    let mut meals: Vec<Event> = slots.iter().map(|&idx| events[idx].clone()).collect();
    meals.sort_by_key(|event| Mealtime::from_title(&event.title));

    for (slot, meal) in slots.into_iter().zip(meals) {
        events[slot] = meal;
    }
}
