//! Small HTML text helpers.

use std::borrow::Cow;

/// Escapes text for use in element content or a quoted attribute.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Replaces every newline with `<br/>`. A preceding carriage return is
/// dropped along with it.
#[must_use]
pub fn newlines_to_breaks(text: &str) -> Cow<'_, str> {
    if text.contains('\n') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\n', "<br/>"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Upper-cases the first letter of every whitespace-separated word.
///
/// `"BREAKFAST".to_lowercase()` followed by this gives `"Breakfast"`.
#[must_use]
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start && c.is_ascii_lowercase() {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}
