//! Single-pass scanner for format-string directives.
//!
//! The scanner walks the format string once, left to right, and captures the
//! first occurrence of each directive kind. A repeated directive is left in
//! the output as literal text: substitution is first-occurrence-only.

/// A directive recognised in a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `s(pattern)`
    Start(&'a str),
    /// `e(pattern)`
    End(&'a str),
    /// `t()`
    Title,
    /// `d()`
    Description,
}

impl Directive<'_> {
    const fn kind(self) -> usize {
        match self {
            Self::Start(_) => 0,
            Self::End(_) => 1,
            Self::Title => 2,
            Self::Description => 3,
        }
    }
}

/// A piece of a scanned format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Directive(Directive<'a>),
}

/// Which directive kinds the caller wants expanded.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveSet {
    pub times: bool,
    pub fields: bool,
}

impl DirectiveSet {
    /// `s(...)`, `e(...)`, `t()` and `d()`.
    pub const ALL: Self = Self {
        times: true,
        fields: true,
    };

    /// Only `s(...)` and `e(...)`.
    pub const TIMES: Self = Self {
        times: true,
        fields: false,
    };
}

/// Matches a directive at the start of `rest`, returning it and its length.
fn match_directive(rest: &str, set: DirectiveSet) -> Option<(Directive<'_>, usize)> {
    if set.fields {
        if rest.starts_with("t()") {
            return Some((Directive::Title, 3));
        }
        if rest.starts_with("d()") {
            return Some((Directive::Description, 3));
        }
    }
    if !set.times {
        return None;
    }
    if let Some(after) = rest.strip_prefix("s(") {
        let close = after.find(')')?;
        return Some((Directive::Start(&after[..close]), close + 3));
    }
    if let Some(after) = rest.strip_prefix("e(") {
        let close = after.find(')')?;
        return Some((Directive::End(&after[..close]), close + 3));
    }
    None
}

/// ## Summary
/// Splits `format` into literal text and directives.
///
/// Only the first occurrence of each directive kind becomes a
/// [`Segment::Directive`]; later occurrences stay inside literals. An opening
/// `s(`/`e(` with no closing parenthesis is literal text.
#[must_use]
pub fn scan(format: &str, set: DirectiveSet) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut seen = [false; 4];
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < format.len() {
        let rest = &format[pos..];
        if let Some((directive, len)) = match_directive(rest, set)
            && !seen[directive.kind()]
        {
            seen[directive.kind()] = true;
            if literal_start < pos {
                segments.push(Segment::Literal(&format[literal_start..pos]));
            }
            segments.push(Segment::Directive(directive));
            pos += len;
            literal_start = pos;
            continue;
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }

    if literal_start < format.len() {
        segments.push(Segment::Literal(&format[literal_start..]));
    }

    segments
}

/// Payloads of the first `s(...)` and `e(...)` in `format`, if present.
#[must_use]
pub fn time_patterns(format: &str) -> (Option<&str>, Option<&str>) {
    let mut start = None;
    let mut end = None;
    for segment in scan(format, DirectiveSet::TIMES) {
        match segment {
            Segment::Directive(Directive::Start(pattern)) => start = Some(pattern),
            Segment::Directive(Directive::End(pattern)) => end = Some(pattern),
            _ => {}
        }
    }
    (start, end)
}
