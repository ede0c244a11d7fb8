//! Spreadsheet serial dates and ambiguous date-string parsing.
//!
//! Spreadsheets store dates as day counts from an epoch chosen so that the
//! historical 1900 leap-year bug cancels out: anchoring day 0 at 1899-12-30
//! makes serial 45000 come out as 2023-03-15, matching what every major
//! spreadsheet displays.

use chrono::{Duration, NaiveDate};

/// Plausible serial-date range: 20 000 = 1954-10-03, 65 000 = 2077-12-16.
/// Wide enough for anything a bank exports, narrow enough that ordinary
/// monetary amounts below 20 000 are not misread as dates.
pub const SERIAL_DATE_MIN: f64 = 20_000.0;
pub const SERIAL_DATE_MAX: f64 = 65_000.0;

/// When both non-year components of a slash/dot date are <= 12 the first
/// component is read as the month. Documented misclassification source:
/// `03/04/2020` is March 4th under this policy even if the exporter meant
/// April 3rd. Kept as an explicit constant so the behavior is tested, not
/// assumed.
pub const PREFER_MONTH_FIRST: bool = true;

/// True for numeric, integral values inside the plausible serial range.
pub fn is_serial_date(value: f64) -> bool {
    value.fract() == 0.0 && (SERIAL_DATE_MIN..=SERIAL_DATE_MAX).contains(&value)
}

/// Convert a spreadsheet day serial to canonical `YYYY-MM-DD`. Never fails:
/// anything that cannot be converted comes back in its original textual form.
pub fn serial_to_canonical(serial: f64) -> String {
    let fallback = || {
        if serial.fract() == 0.0 {
            format!("{}", serial as i64)
        } else {
            serial.to_string()
        }
    };
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return fallback();
    };
    let Some(days) = Duration::try_days(serial as i64) else {
        return fallback();
    };
    match epoch.checked_add_signed(days) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => fallback(),
    }
}

/// Parse a date string of unknown convention. ISO wins outright; otherwise
/// slash- or dot-delimited triples are resolved with [`PREFER_MONTH_FIRST`].
/// A component > 12 is unambiguously the day, a 4-digit leading component is
/// a year, and 2-digit years widen to 2000+.
pub fn parse_ambiguous(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }

    let parts: Vec<&str> = text.split(['/', '.']).map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    if parts[0].len() == 4 {
        let year: i32 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        let day: u32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let year_raw: i32 = parts[2].parse().ok()?;
    let year = if year_raw < 100 { 2000 + year_raw } else { year_raw };

    let (month, day) = if first > 12 {
        (second, first)
    } else if second > 12 {
        (first, second)
    } else if PREFER_MONTH_FIRST {
        (first, second)
    } else {
        (second, first)
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    Us,
    Eu,
    Iso,
}

/// Render a canonical date in the requested regional style.
pub fn format_canonical(date: NaiveDate, style: DateStyle) -> String {
    let pattern = match style {
        DateStyle::Us => "%m/%d/%Y",
        DateStyle::Eu => "%d/%m/%Y",
        DateStyle::Iso => "%Y-%m-%d",
    };
    date.format(pattern).to_string()
}
