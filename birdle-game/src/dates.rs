//! Day-stamp helpers for the `YYYY-MM-DD` strings used throughout the game.

use chrono::{Datelike, Local, NaiveDate};

/// Format used by puzzle keys, published answer tables, and share text.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Today's date as `YYYY-MM-DD` in local time.
///
/// The puzzle day rolls over at local midnight, not UTC midnight.
#[must_use]
pub fn today_string() -> String {
    Local::now().date_naive().format(DAY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` day stamp.
#[must_use]
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DAY_FORMAT).ok()
}

/// Render a day stamp for display, e.g. `June 8, 2025`.
///
/// Falls back to the raw string when it is not a valid day stamp.
#[must_use]
pub fn format_for_display(value: &str) -> String {
    parse_day(value).map_or_else(
        || value.to_string(),
        |date| format!("{} {}, {}", month_name(date.month()), date.day(), date.year()),
    )
}

const fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}
