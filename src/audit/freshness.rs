//! Timestamp parsing and age classification.
//!
//! Calendar days are compared in UTC: the publisher stamps UTC and runs on a
//! UTC cron, so "today" means the current UTC date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use std::fmt::Display;

/// Data older than this (and not from today) must not be shown.
pub const STALE_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// Published today.
    Fresh,
    /// Not from today but within the stale window; usable with a warning.
    Stale,
    /// Too old or unparseable.
    Rejected,
}

impl Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Freshness::Fresh => "fresh",
                Freshness::Stale => "stale",
                Freshness::Rejected => "rejected",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    IsoFractional,
    Iso,
    NumericFractional,
    DatePrefix,
}

type Parser = fn(&str) -> Option<DateTime<Utc>>;

/// Tried in order; the first that parses wins.
const PARSERS: [(TimestampFormat, Parser); 4] = [
    (TimestampFormat::IsoFractional, parse_iso_fractional),
    (TimestampFormat::Iso, parse_iso),
    (TimestampFormat::NumericFractional, parse_numeric_fractional),
    (TimestampFormat::DatePrefix, parse_date_prefix),
];

fn has_iso_separator(raw: &str) -> bool {
    raw.as_bytes().get(10) == Some(&b'T')
}

fn parse_iso_fractional(raw: &str) -> Option<DateTime<Utc>> {
    if !has_iso_separator(raw) || !raw.contains('.') {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if !has_iso_separator(raw) || raw.contains('.') {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn parse_numeric_fractional(raw: &str) -> Option<DateTime<Utc>> {
    // yyyy-mm-dd hh:mm:ss.ffffff
    if raw.len() != 26 {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.6f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_date_prefix(raw: &str) -> Option<DateTime<Utc>> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Parses `raw`, reporting which format matched.
pub fn parse_timestamp(raw: &str) -> Option<(TimestampFormat, DateTime<Utc>)> {
    let raw = raw.trim();
    PARSERS
        .iter()
        .find_map(|(format, parse)| parse(raw).map(|instant| (*format, instant)))
}

pub fn parse_last_update(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(raw).map(|(_, instant)| instant)
}

pub fn classify_instant(instant: DateTime<Utc>, now: DateTime<Utc>) -> Freshness {
    if instant.date_naive() == now.date_naive() {
        Freshness::Fresh
    } else if now - instant <= TimeDelta::hours(STALE_WINDOW_HOURS) {
        Freshness::Stale
    } else {
        Freshness::Rejected
    }
}

/// Classifies a raw `last_update` string; unparseable input is `Rejected`.
pub fn classify(raw: &str, now: DateTime<Utc>) -> Freshness {
    parse_last_update(raw).map_or(Freshness::Rejected, |instant| classify_instant(instant, now))
}
