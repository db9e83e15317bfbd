//! Event model and the format-string engine that turns events into HTML.
//!
//! ## Format strings
//!
//! | directive   | expands to                                   |
//! |-------------|----------------------------------------------|
//! | `s(pattern)`| the start time formatted with `pattern`      |
//! | `e(pattern)`| the end time formatted with `pattern`        |
//! | `t()`       | the title                                    |
//! | `d()`       | the description                              |
//! | newline     | `<br/>`                                      |
//! | `\|`        | a table cell boundary (tables only)          |
//!
//! Only the first occurrence of each directive is expanded.

pub mod directive;
pub mod event;
pub mod html;
pub mod pattern;
pub mod template;

pub use event::{Event, EventDraft, Mealtime, by_mealtime, by_time, sort_by_mealtime, sort_by_time};
pub use template::{DerivedFormat, derive_format, expand_table, expand_ticker, render_table};
