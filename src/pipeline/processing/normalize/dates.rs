//! Best-effort resolution of listing date text into a UTC instant.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]+)\.?\s+(\d{1,2})\b").expect("valid month/day regex"));

// Tried in this order with the current year appended
const NUMERIC_MONTH_DAY_FORMATS: &[&str] = &["%m/%d", "%m-%d", "%d/%m", "%d-%m"];

pub struct DateStrategy {
    pub name: &'static str,
    pub resolve: fn(&str, DateTime<Utc>) -> Option<NaiveDateTime>,
}

pub const DATE_STRATEGIES: &[DateStrategy] = &[
    DateStrategy {
        name: "iso_timestamp",
        resolve: iso_timestamp,
    },
    DateStrategy {
        name: "month_name_day",
        resolve: month_name_day,
    },
    DateStrategy {
        name: "full_numeric_date",
        resolve: full_numeric_date,
    },
    DateStrategy {
        name: "numeric_month_day",
        resolve: numeric_month_day,
    },
];

/// Resolve against the current instant.
pub fn resolve_date(raw: &str) -> String {
    resolve_date_at(raw, Utc::now())
}

/// First strategy that yields a date wins; otherwise `now`. Never fails.
pub fn resolve_date_at(raw: &str, now: DateTime<Utc>) -> String {
    let raw = raw.trim();
    if !raw.is_empty() {
        for strategy in DATE_STRATEGIES {
            if let Some(naive) = (strategy.resolve)(raw, now) {
                return format_utc(naive.and_utc());
            }
        }
    }
    format_utc(now)
}

pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `2024-08-15T20:00:00Z`, `2024-08-15T20:00:00.5`, `2024-08-15T22:00:00+02:00`
pub fn iso_timestamp(raw: &str, _now: DateTime<Utc>) -> Option<NaiveDateTime> {
    if !raw.contains('T') {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc).naive_utc());
    }
    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// `Aug 15`, `September 3`, `Sat: Sep 1 (9pm-2am)`
pub fn month_name_day(raw: &str, now: DateTime<Utc>) -> Option<NaiveDateTime> {
    let year = now.year();
    MONTH_DAY.captures_iter(raw).find_map(|caps| {
        let candidate = format!("{} {} {}", &caps[1], &caps[2], year);
        NaiveDate::parse_from_str(&candidate, "%B %d %Y")
            .or_else(|_| NaiveDate::parse_from_str(&candidate, "%b %d %Y"))
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// `2024/09/01` or `2024-09-01`, the form the listing cell carries
pub fn full_numeric_date(raw: &str, _now: DateTime<Utc>) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `08/15`, `8-15`, `15/08`, `15-8` with the current year
pub fn numeric_month_day(raw: &str, now: DateTime<Utc>) -> Option<NaiveDateTime> {
    let year = now.year();
    NUMERIC_MONTH_DAY_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&format!("{}/{}", raw, year), &format!("{}/%Y", fmt))
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}
