//! Weekly working-hours schedules: parsing, normalization, capacity.
//!
//! Providers store their hours as loosely-typed JSON — either an object
//! keyed by lowercase day name or an array of per-day records, with
//! `start`/`startTime`/`start_time` key spellings all seen in the wild.
//! [`normalize_schedule`] folds every accepted shape into one canonical
//! [`WorkDay`] list at the boundary, so the search code only ever sees
//! one shape.
//!
//! Malformed data degrades, it never fails: an unparseable payload
//! normalizes to an empty list, and an enabled day whose times do not
//! parse contributes zero capacity for that day. One bad configuration
//! entry must not block the whole search.

use std::collections::BTreeMap;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

// ── WorkDay ─────────────────────────────────────────────────────────────────

/// One weekday's working-hours configuration, post-normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDay {
    pub day: Weekday,
    pub enabled: bool,
    /// `None` when the stored time string was absent or malformed.
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl WorkDay {
    /// The working window as minutes-since-midnight `(start, end)`.
    ///
    /// `None` when the day is disabled or its times did not parse.
    /// An end numerically earlier than the start spans past midnight,
    /// so the end is pushed out by 24 hours.
    pub fn window_minutes(&self) -> Option<(i64, i64)> {
        if !self.enabled {
            return None;
        }
        let start = self.start?;
        let end = self.end?;
        let start_m = i64::from(start.hour()) * 60 + i64::from(start.minute());
        let mut end_m = i64::from(end.hour()) * 60 + i64::from(end.minute());
        if end_m < start_m {
            end_m += 24 * 60;
        }
        Some((start_m, end_m))
    }
}

// ── Time Parser ─────────────────────────────────────────────────────────────

/// Parse a stored time-of-day string: `"14:30"`, `"02:30 PM"`, `"9:00"`.
///
/// Case-insensitively strips an `AM`/`PM` suffix; the remainder must be
/// `H:MM` or `HH:MM`. `PM` with hour < 12 adds 12; `AM` with hour 12
/// becomes 0.
///
/// Returns `None` on any malformed input — callers treat `None` as
/// "no capacity", never as an error.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let compact = s.trim().to_lowercase().replace(' ', "");

    let (time_part, meridiem) = if let Some(rest) = compact.strip_suffix("pm") {
        (rest, Some(true))
    } else if let Some(rest) = compact.strip_suffix("am") {
        (rest, Some(false))
    } else {
        (compact.as_str(), None)
    };

    let (hour_str, minute_str) = time_part.split_once(':')?;
    if hour_str.is_empty() || hour_str.len() > 2 || minute_str.len() != 2 {
        return None;
    }
    let hour: u32 = hour_str.parse().ok()?;
    let minute: u32 = minute_str.parse().ok()?;

    let hour = match (meridiem, hour) {
        (Some(true), h) if h < 12 => h + 12,
        (Some(false), 12) => 0,
        (_, h) => h,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse a weekday name (case-insensitive, full and abbreviated).
fn parse_day_name(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

// ── Schedule Normalizer ─────────────────────────────────────────────────────

/// One raw per-day record as stored. Tolerates the key spellings seen
/// across schedule payloads.
#[derive(Debug, Clone, Deserialize)]
struct RawDay {
    #[serde(default)]
    day: Option<String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default, alias = "startTime", alias = "start_time")]
    start: Option<String>,
    #[serde(default, alias = "endTime", alias = "end_time")]
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSchedule {
    /// `{"monday": {...}, "tuesday": {...}}` — the key names the day.
    ByDay(BTreeMap<String, RawDay>),
    /// `[{"day": "monday", ...}, ...]` — each record names its day.
    List(Vec<RawDay>),
}

/// Normalize a raw schedule payload into a canonical [`WorkDay`] list,
/// ordered Monday first.
///
/// Accepts the object and array shapes described in [`RawSchedule`].
/// Unparseable or absent payloads normalize to an empty list — the
/// downstream capacity check turns that into a precondition failure,
/// not a crash. Entries whose day name is unrecognized are dropped.
pub fn normalize_schedule(raw: &serde_json::Value) -> Vec<WorkDay> {
    let parsed: RawSchedule = match serde_json::from_value(raw.clone()) {
        Ok(parsed) => parsed,
        Err(_) => return Vec::new(),
    };

    let mut days: Vec<WorkDay> = match parsed {
        RawSchedule::ByDay(entries) => entries
            .into_iter()
            .filter_map(|(name, raw)| Some(work_day(parse_day_name(&name)?, raw)))
            .collect(),
        RawSchedule::List(entries) => entries
            .into_iter()
            .filter_map(|raw| {
                let day = parse_day_name(raw.day.as_deref()?)?;
                Some(work_day(day, raw))
            })
            .collect(),
    };

    days.sort_by_key(|d| d.day.num_days_from_monday());
    days
}

fn work_day(day: Weekday, raw: RawDay) -> WorkDay {
    WorkDay {
        day,
        enabled: raw.enabled,
        start: raw.start.as_deref().and_then(parse_time_of_day),
        end: raw.end.as_deref().and_then(parse_time_of_day),
    }
}

// ── Capacity Validator ──────────────────────────────────────────────────────

/// The provider's single longest contiguous working block, in minutes.
///
/// Only enabled days with parseable times count. Returns 0 when no day
/// qualifies. Invariant under reordering of the list.
///
/// Used as a fast precondition: a service longer than this can never be
/// placed, so searching would be pointless.
pub fn max_daily_minutes(schedule: &[WorkDay]) -> i64 {
    schedule
        .iter()
        .filter_map(WorkDay::window_minutes)
        .map(|(start, end)| end - start)
        .max()
        .unwrap_or(0)
}

// ── Tests ───────────────────────────────────────────────────────────────────
