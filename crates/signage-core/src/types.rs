use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::CoreError;

/// Direction in which a layout branch lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Children side by side, left to right. Children are sized by width.
    Horizontal,
    /// Children stacked top to bottom. Children are sized by height.
    Vertical,
}

impl Orientation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    /// CSS class marking a container's flow direction.
    #[must_use]
    pub const fn box_class(self) -> &'static str {
        match self {
            Self::Horizontal => "hbox",
            Self::Vertical => "vbox",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(CoreError::InvalidInput(format!(
                "unknown orientation: {other}"
            ))),
        }
    }
}

/// Range selector accepted by every event provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Tomorrow,
    Week,
    Upcoming,
}

impl DateRange {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Week => "week",
            Self::Upcoming => "upcoming",
        }
    }

    /// ## Summary
    /// Resolves the selector against `today` into a concrete time window.
    ///
    /// - `today`: midnight to 23:59:59 of `today`
    /// - `tomorrow`: the same window shifted by one day
    /// - `week`: midnight of `today` to 23:59:59 seven days later
    /// - `upcoming`: midnight of `today`, unbounded
    #[must_use]
    pub fn window(self, today: NaiveDate) -> RangeWindow {
        match self {
            Self::Today => RangeWindow::whole_day(today),
            Self::Tomorrow => RangeWindow::whole_day(today + Days::new(1)),
            Self::Week => RangeWindow {
                start: day_start(today),
                end: Some(day_end(today + Days::new(7))),
            },
            Self::Upcoming => RangeWindow {
                start: day_start(today),
                end: None,
            },
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "tomorrow" => Ok(Self::Tomorrow),
            "week" => Ok(Self::Week),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(CoreError::InvalidInput(format!("unknown range: {other}"))),
        }
    }
}

/// Wall-clock window a provider is asked to cover. `end` is `None` when the
/// window is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl RangeWindow {
    #[must_use]
    pub fn whole_day(day: NaiveDate) -> Self {
        Self {
            start: day_start(day),
            end: Some(day_end(day)),
        }
    }

    /// The calendar day the window starts on.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }
}

/// Midnight at the start of `day`.
#[must_use]
pub fn day_start(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// 23:59:59 of `day`.
#[must_use]
pub fn day_end(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| day_start(day))
}

/// A request for the whole display to tear down and rebuild itself.
///
/// Raised when a provider exhausts its retries; the display has no in-page
/// error state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    pub reason: String,
}

impl ReloadRequest {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn today_covers_the_whole_day() {
        let window = DateRange::Today.window(date(2011, 12, 5));
        assert_eq!(window.start.to_string(), "2011-12-05 00:00:00");
        assert_eq!(
            window.end.map(|e| e.to_string()).as_deref(),
            Some("2011-12-05 23:59:59")
        );
    }

    #[test]
    fn tomorrow_is_shifted_by_one_day() {
        let window = DateRange::Tomorrow.window(date(2011, 12, 31));
        assert_eq!(window.first_day(), date(2012, 1, 1));
        assert_eq!(
            window.end.map(|e| e.to_string()).as_deref(),
            Some("2012-01-01 23:59:59")
        );
    }

    #[test]
    fn week_ends_seven_days_later() {
        let window = DateRange::Week.window(date(2011, 12, 5));
        assert_eq!(window.start.to_string(), "2011-12-05 00:00:00");
        assert_eq!(
            window.end.map(|e| e.to_string()).as_deref(),
            Some("2011-12-12 23:59:59")
        );
    }

    #[test]
    fn upcoming_is_unbounded() {
        let window = DateRange::Upcoming.window(date(2011, 12, 5));
        assert_eq!(window.end, None);
    }

    #[test]
    fn parses_selectors() {
        assert_eq!("week".parse::<DateRange>().ok(), Some(DateRange::Week));
        assert!("fortnight".parse::<DateRange>().is_err());
        assert_eq!(
            "horizontal".parse::<Orientation>().ok(),
            Some(Orientation::Horizontal)
        );
        assert_eq!(Orientation::Vertical.box_class(), "vbox");
    }
}
