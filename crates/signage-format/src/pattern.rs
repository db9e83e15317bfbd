//! Date pattern formatting.
//!
//! Patterns use the DateJS specifier set the display's layouts are written
//! in. A run of the same specifier letter selects the variant; runs longer
//! than the longest variant are split. A backslash emits the next character
//! verbatim, and every other character is copied as-is.
//!
//! | spec   | output                        |
//! |--------|-------------------------------|
//! | `yyyy` | four-digit year               |
//! | `yy`   | two-digit year                |
//! | `MMMM` | `December`                    |
//! | `MMM`  | `Dec`                         |
//! | `MM`   | `01`-`12`                     |
//! | `M`    | `1`-`12`                      |
//! | `dddd` | `Monday`                      |
//! | `ddd`  | `Mon`                         |
//! | `dd`   | `01`-`31`                     |
//! | `d`    | `1`-`31`                      |
//! | `HH`/`H` | 24-hour, padded / unpadded  |
//! | `hh`/`h` | 12-hour, padded / unpadded  |
//! | `mm`/`m` | minutes                     |
//! | `ss`/`s` | seconds                     |
//! | `tt`   | `AM`/`PM`                     |
//! | `t`    | `A`/`P`                       |

use std::borrow::Cow;

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Longest run each specifier letter understands.
const fn max_run(spec: char) -> usize {
    match spec {
        'y' | 'M' | 'd' => 4,
        'H' | 'h' | 'm' | 's' | 't' => 2,
        _ => 0,
    }
}

/// Formats `dt` according to `pattern`.
#[must_use]
pub fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }

        let max = max_run(c);
        if max == 0 {
            out.push(c);
            continue;
        }

        let mut run = 1;
        while run < max && chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        write_spec(&mut out, dt, c, run);
    }

    out
}

fn write_spec(out: &mut String, dt: &NaiveDateTime, spec: char, run: usize) {
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    let pm = dt.hour() >= 12;

    let token: Cow<'static, str> = match (spec, run) {
        ('y', 1 | 2) => format!("{:02}", dt.year().rem_euclid(100)).into(),
        ('y', _) => format!("{:04}", dt.year()).into(),
        ('M', 1) => dt.month().to_string().into(),
        ('M', 2) => format!("{:02}", dt.month()).into(),
        ('M', 3) => dt.format("%b").to_string().into(),
        ('M', _) => dt.format("%B").to_string().into(),
        ('d', 1) => dt.day().to_string().into(),
        ('d', 2) => format!("{:02}", dt.day()).into(),
        ('d', 3) => dt.format("%a").to_string().into(),
        ('d', _) => dt.format("%A").to_string().into(),
        ('H', 1) => dt.hour().to_string().into(),
        ('H', _) => format!("{:02}", dt.hour()).into(),
        ('h', 1) => hour12.to_string().into(),
        ('h', _) => format!("{hour12:02}").into(),
        ('m', 1) => dt.minute().to_string().into(),
        ('m', _) => format!("{:02}", dt.minute()).into(),
        ('s', 1) => dt.second().to_string().into(),
        ('s', _) => format!("{:02}", dt.second()).into(),
        ('t', 1) => (if pm { "P" } else { "A" }).into(),
        ('t', _) => (if pm { "PM" } else { "AM" }).into(),
        _ => Cow::Borrowed(""),
    };
    out.push_str(&token);
}
