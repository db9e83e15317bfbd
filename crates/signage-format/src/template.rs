//! Expansion of format strings against events.

use signage_core::constants::{DEFAULT_FORMAT, DEFAULT_TIME_PATTERN, NO_EVENTS};

use crate::directive::{Directive, DirectiveSet, Segment, scan, time_patterns};
use crate::event::Event;
use crate::html::{escape, newlines_to_breaks};
use crate::pattern::format_datetime;

const CELL_BOUNDARY: &str = "</td><td>";

/// A format string together with the date patterns for its `s()`/`e()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFormat {
    pub format: String,
    pub start_spec: String,
    pub end_spec: String,
}

/// ## Summary
/// Derives the date patterns a format string's time directives use.
///
/// With no format, returns [`DEFAULT_FORMAT`] with [`DEFAULT_TIME_PATTERN`]
/// for both times. Otherwise the payloads of the first `s(...)` and `e(...)`
/// become the patterns (empty when absent) and the format is returned
/// unchanged, directives still in place for per-event expansion.
#[must_use]
pub fn derive_format(raw: Option<&str>) -> DerivedFormat {
    let Some(format) = raw else {
        return DerivedFormat {
            format: DEFAULT_FORMAT.to_string(),
            start_spec: DEFAULT_TIME_PATTERN.to_string(),
            end_spec: DEFAULT_TIME_PATTERN.to_string(),
        };
    };

    let (start, end) = time_patterns(format);
    DerivedFormat {
        format: format.to_string(),
        start_spec: start.unwrap_or_default().to_string(),
        end_spec: end.unwrap_or_default().to_string(),
    }
}

/// ## Summary
/// Renders one ticker item.
///
/// The first `s(...)` and `e(...)` in `format` are replaced by the event's
/// start and end formatted with `start_spec`/`end_spec`, and newlines become
/// `<br/>`. The result is the item's time block; title and description get
/// blocks of their own, preceded by the attachment image when there is one.
#[must_use]
pub fn expand_ticker(item: &Event, format: &str, start_spec: &str, end_spec: &str) -> String {
    let mut time = String::new();
    for segment in scan(format, DirectiveSet::TIMES) {
        match segment {
            Segment::Literal(text) => time.push_str(text),
            Segment::Directive(Directive::Start(_)) => {
                time.push_str(&format_datetime(&item.start, start_spec));
            }
            Segment::Directive(Directive::End(_)) => {
                time.push_str(&format_datetime(&item.end, end_spec));
            }
            Segment::Directive(Directive::Title | Directive::Description) => {}
        }
    }

    let mut html = String::from("<div class='item'>");
    if let Some(attachment) = item.attachment.as_deref().filter(|a| !a.is_empty()) {
        html.push_str("<img src='");
        html.push_str(&escape(attachment));
        html.push_str("' />");
    }
    html.push_str("<div class='title'>");
    html.push_str(&newlines_to_breaks(&escape(&item.title)));
    html.push_str("</div><div class='time'>");
    html.push_str(&newlines_to_breaks(&time));
    html.push_str("</div><div class='description'>");
    html.push_str(&newlines_to_breaks(&escape(&item.description)));
    html.push_str("</div></div>");
    html
}

/// ## Summary
/// Renders one table row.
///
/// Substitutes the first `s(...)`, `e(...)`, `t()` and `d()`; newlines become
/// `<br/>` and `|` becomes a cell boundary. Boundaries are only taken from
/// the format string and formatted times, never from the event's own text.
#[must_use]
pub fn expand_table(item: &Event, format: &str, start_spec: &str, end_spec: &str) -> String {
    let mut row = String::from("<tr><td>");
    for segment in scan(format, DirectiveSet::ALL) {
        match segment {
            Segment::Literal(text) => push_cells(&mut row, text),
            Segment::Directive(Directive::Start(_)) => {
                push_cells(&mut row, &format_datetime(&item.start, start_spec));
            }
            Segment::Directive(Directive::End(_)) => {
                push_cells(&mut row, &format_datetime(&item.end, end_spec));
            }
            Segment::Directive(Directive::Title) => {
                row.push_str(&newlines_to_breaks(&escape(&item.title)));
            }
            Segment::Directive(Directive::Description) => {
                row.push_str(&newlines_to_breaks(&escape(&item.description)));
            }
        }
    }
    row.push_str("</td></tr>");
    row
}

fn push_cells(row: &mut String, text: &str) {
    row.push_str(&newlines_to_breaks(text).replace('|', CELL_BOUNDARY));
}

/// ## Summary
/// Renders a whole table for `events`.
///
/// An empty slice renders the literal [`NO_EVENTS`] rather than an empty
/// table.
#[must_use]
pub fn render_table(events: &[Event], raw_format: Option<&str>) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }

    let derived = derive_format(raw_format);
    tracing::trace!(events = events.len(), format = %derived.format, "Rendering event table");
    let mut html = String::from("<table>");
    for item in events {
        html.push_str(&expand_table(
            item,
            &derived.format,
            &derived.start_spec,
            &derived.end_spec,
        ));
    }
    html.push_str("</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 12, 5)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2011, 12, 5).expect("valid date")
    }

    fn cells(row: &str) -> Vec<&str> {
        row.strip_prefix("<tr><td>")
            .and_then(|r| r.strip_suffix("</td></tr>"))
            .expect("row wrapper")
            .split(CELL_BOUNDARY)
            .collect()
    }

    #[test]
    fn derive_without_input_uses_defaults() {
        let derived = derive_format(None);
        assert_eq!(derived.format, DEFAULT_FORMAT);
        assert_eq!(derived.start_spec, "h:mm");
        assert_eq!(derived.end_spec, "h:mm");
    }

    #[test]
    fn derive_extracts_patterns_and_keeps_format() {
        let raw = "s(dddd) - e(h:mm)|t()";
        let derived = derive_format(Some(raw));
        assert_eq!(derived.start_spec, "dddd");
        assert_eq!(derived.end_spec, "h:mm");
        assert_eq!(derived.format, raw);
    }

    #[test]
    fn derive_without_time_directives_has_empty_patterns() {
        let derived = derive_format(Some("t()|-|d()"));
        assert_eq!(derived.start_spec, "");
        assert_eq!(derived.end_spec, "");
    }

    #[test]
    fn table_row_splits_cells_in_order() {
        let event = Event::titled("Breakfast")
            .description("Pancakes")
            .build_on(day());
        let row = expand_table(&event, "t()|-|d()", "", "");
        assert_eq!(cells(&row), ["Breakfast", "-", "Pancakes"]);
    }

    #[test]
    fn table_row_formats_times() {
        let event = Event::titled("Chapel")
            .start(at(19, 0))
            .end(at(21, 0))
            .build_on(day());
        let derived = derive_format(Some("s(h:mm) - e(h:mm tt)|-|t()"));
        let row = expand_table(&event, &derived.format, &derived.start_spec, &derived.end_spec);
        assert_eq!(cells(&row), ["7:00 - 9:00 PM", "-", "Chapel"]);
    }

    #[test]
    fn table_row_does_not_split_on_pipes_in_event_text() {
        let event = Event::titled("A|B").build_on(day());
        let row = expand_table(&event, "t()", "", "");
        assert_eq!(cells(&row), ["A|B"]);
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let event = Event::titled("see d()")
            .description("Pancakes")
            .build_on(day());
        let row = expand_table(&event, "t()|d()", "", "");
        assert_eq!(cells(&row), ["see d()", "Pancakes"]);
    }

    #[test]
    fn repeated_directive_is_expanded_once() {
        let event = Event::titled("Chapel").start(at(7, 0)).build_on(day());
        let row = expand_table(&event, "s(h) s(h)", "h", "");
        assert_eq!(cells(&row), ["7 s(h)"]);
    }

    #[test]
    fn empty_table_is_no_events_literal() {
        assert_eq!(render_table(&[], Some("t()|-|d()")), NO_EVENTS);
        assert_eq!(render_table(&[], None), NO_EVENTS);
    }

    #[test]
    fn table_wraps_one_row_per_event() {
        let events = vec![
            Event::titled("Breakfast").description("Eggs").build_on(day()),
            Event::titled("Lunch").description("Soup").build_on(day()),
        ];
        let html = render_table(&events, Some("t()|-|d()"));
        assert!(html.starts_with("<table><tr>"));
        assert!(html.ends_with("</tr></table>"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn ticker_item_has_blocks_and_breaks() {
        let event = Event::titled("The Matrix")
            .start(at(19, 0))
            .end(at(21, 0))
            .description("Red pill")
            .attachment("http://img/poster.jpg")
            .build_on(day());
        let derived = derive_format(Some("s(dddd, MMMM d\nh:mm tt) - e(h:mm tt)"));
        let html = expand_ticker(&event, &derived.format, &derived.start_spec, &derived.end_spec);
        assert_eq!(
            html,
            "<div class='item'><img src='http://img/poster.jpg' />\
             <div class='title'>The Matrix</div>\
             <div class='time'>Monday, December 5<br/>7:00 PM - 9:00 PM</div>\
             <div class='description'>Red pill</div></div>"
        );
    }

    #[test]
    fn ticker_item_without_attachment_has_no_image() {
        let event = Event::titled("Chapel").build_on(day());
        let html = expand_ticker(&event, "s(h:mm)", "h:mm", "");
        assert!(!html.contains("<img"));
        assert!(html.contains("<div class='time'>12:00</div>"));
    }

    #[test]
    fn ticker_leaves_title_directive_literal() {
        let event = Event::titled("Chapel").build_on(day());
        let html = expand_ticker(&event, "t()", "", "");
        assert!(html.contains("<div class='time'>t()</div>"));
    }
}
