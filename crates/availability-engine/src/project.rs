//! Multi-sitting project orchestration.
//!
//! Drives the slot finder once per required sitting, advancing the
//! search pointer by the booking cadence between sittings. Each found
//! slot is appended to a request-local busy list before the next search
//! runs — without that, a weekly cadence with gaps shorter than the
//! service duration could propose sittings that overlap each other.
//!
//! The orchestrator is synchronous and side-effect-free: the busy
//! accumulator is local to one call, so concurrent requests need no
//! locking. Persisting the proposed dates (and re-checking them at
//! write time, see [`crate::guard`]) is the booking workflow's job.

use chrono::{DateTime, Duration, LocalResult, Months, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::interval::AppointmentInterval;
use crate::schedule::{max_daily_minutes, WorkDay};
use crate::slot::find_next_slot;

// ── Request / result aggregates ─────────────────────────────────────────────

/// Cadence between consecutive sittings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One sitting only; behaves like [`Frequency::Consecutive`] if the
    /// caller asks for more anyway.
    Single,
    /// Next sitting from the following calendar day.
    Consecutive,
    Weekly,
    Biweekly,
    /// Calendar-month arithmetic; the day of month is clamped to the
    /// target month's length (Jan 31 → Feb 28).
    Monthly,
}

impl Frequency {
    /// Whole days to the next sitting's earliest start, `None` for the
    /// calendar-month advance.
    fn advance_days(self) -> Option<i64> {
        match self {
            Self::Single | Self::Consecutive => Some(1),
            Self::Weekly => Some(7),
            Self::Biweekly => Some(14),
            Self::Monthly => None,
        }
    }
}

/// Everything the engine needs to plan one multi-sitting project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAvailabilityRequest {
    pub service_duration_minutes: u32,
    pub sittings: u32,
    pub frequency: Frequency,
    /// Earliest instant to begin searching; a past value is clamped to
    /// the caller's "now".
    pub start_date: DateTime<Utc>,
    pub work_schedule: Vec<WorkDay>,
    /// Assumed already filtered to this provider from `start_date` on.
    pub existing_appointments: Vec<AppointmentInterval>,
    /// IANA identifier for the provider's timezone.
    pub time_zone: String,
    /// Per-sitting price; the engine only multiplies it out.
    pub sitting_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAvailabilityResult {
    /// One start instant per sitting, strictly increasing.
    pub proposed_dates: Vec<DateTime<Utc>>,
    /// `sitting_price × sittings`.
    pub total_cost: f64,
}

// ── Orchestrator ────────────────────────────────────────────────────────────

/// Compute one proposed start per sitting.
///
/// Preconditions run before any scan: the request must ask for at least
/// one sitting of at least one minute, the timezone must parse, the
/// schedule must have usable hours, and the service must fit the
/// longest working day. Failing fast here keeps a hopeless request from
/// burning a one-year search.
///
/// # Errors
///
/// * [`EngineError::InvalidRequest`] — zero sittings or duration
/// * [`EngineError::InvalidTimezone`] — unknown IANA name
/// * [`EngineError::InvalidScheduleConfiguration`] — no usable hours
/// * [`EngineError::ServiceExceedsCapacity`] — duration longer than the
///   longest working day
/// * [`EngineError::SlotSearchExhausted`] — a sitting found no slot
///   within a year; carries the 1-based sitting index and near-miss
///   diagnostics
pub fn compute_project_dates(
    request: &ProjectAvailabilityRequest,
    now: DateTime<Utc>,
) -> Result<ProjectAvailabilityResult> {
    if request.service_duration_minutes == 0 {
        return Err(EngineError::InvalidRequest(
            "service duration must be at least one minute".to_string(),
        ));
    }
    if request.sittings == 0 {
        return Err(EngineError::InvalidRequest(
            "at least one sitting is required".to_string(),
        ));
    }
    let tz = parse_timezone(&request.time_zone)?;

    let longest = max_daily_minutes(&request.work_schedule);
    if longest == 0 {
        return Err(EngineError::InvalidScheduleConfiguration);
    }
    if i64::from(request.service_duration_minutes) > longest {
        return Err(EngineError::ServiceExceedsCapacity {
            requested_minutes: request.service_duration_minutes,
            longest_window_minutes: longest,
        });
    }

    let duration = Duration::minutes(i64::from(request.service_duration_minutes));
    let mut temp_busy = request.existing_appointments.clone();
    let mut proposed = Vec::with_capacity(request.sittings as usize);
    let mut pointer = request.start_date;

    for sitting in 1..=request.sittings {
        let slot = find_next_slot(
            pointer,
            now,
            request.service_duration_minutes,
            &request.work_schedule,
            &temp_busy,
            tz,
        )
        .map_err(|failure| EngineError::SlotSearchExhausted {
            sitting,
            near_misses: failure.near_misses,
        })?;

        debug!(sitting, slot = %slot, "sitting placed");

        // Later sittings of this request must not collide with this one.
        temp_busy.push(AppointmentInterval::new(slot, slot + duration));
        proposed.push(slot);
        pointer = advance_pointer(slot, request.frequency, tz);
    }

    Ok(ProjectAvailabilityResult {
        proposed_dates: proposed,
        total_cost: request.sitting_price * f64::from(request.sittings),
    })
}

/// Parse an IANA timezone string into `Tz`.
fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{s}'")))
}

// ── Cadence advancement ─────────────────────────────────────────────────────

/// The next sitting's earliest start: the found slot pushed forward by
/// the cadence, preserving local wall-clock time in the provider's
/// timezone. The pointer is deliberately not reset to midnight — the
/// finder seeks the next valid window from wherever it lands.
fn advance_pointer(from: DateTime<Utc>, frequency: Frequency, tz: Tz) -> DateTime<Utc> {
    let local = from.with_timezone(&tz);
    let date = local.date_naive();

    let next_date = match frequency.advance_days() {
        Some(days) => date + Duration::days(days),
        None => date.checked_add_months(Months::new(1)).unwrap_or(date),
    };

    resolve_local(next_date.and_time(local.time()), tz)
}

/// Resolve a local wall-clock datetime to an instant. A fold takes the
/// earlier occurrence; a spring-forward gap shifts one hour later
/// (DST gaps are at most an hour for the zones chrono-tz ships).
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    dt.with_timezone(&Utc)
                }
                LocalResult::None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_time_of_day;
    use chrono::{NaiveDate, TimeZone, Weekday};

    fn naive(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(day: Weekday, start: &str, end: &str) -> WorkDay {
        WorkDay {
            day,
            enabled: true,
            start: parse_time_of_day(start),
            end: parse_time_of_day(end),
        }
    }

    fn weekday_schedule() -> Vec<WorkDay> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .map(|d| day(d, "09:00", "17:00"))
        .collect()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn request(sittings: u32, frequency: Frequency) -> ProjectAvailabilityRequest {
        ProjectAvailabilityRequest {
            service_duration_minutes: 60,
            sittings,
            frequency,
            start_date: utc(2026, 3, 2, 8, 0), // Monday
            work_schedule: weekday_schedule(),
            existing_appointments: Vec::new(),
            time_zone: "UTC".to_string(),
            sitting_price: 150.0,
        }
    }

    fn early_now() -> DateTime<Utc> {
        utc(2026, 1, 1, 0, 0)
    }

    // ── precondition tests ──────────────────────────────────────────────

    #[test]
    fn test_zero_duration_rejected() {
        let mut req = request(1, Frequency::Single);
        req.service_duration_minutes = 0;
        assert!(matches!(
            compute_project_dates(&req, early_now()),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_zero_sittings_rejected() {
        let req = request(0, Frequency::Single);
        assert!(matches!(
            compute_project_dates(&req, early_now()),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut req = request(1, Frequency::Single);
        req.time_zone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(
            compute_project_dates(&req, early_now()),
            Err(EngineError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_empty_schedule_rejected_before_search() {
        let mut req = request(1, Frequency::Single);
        req.work_schedule = Vec::new();
        assert!(matches!(
            compute_project_dates(&req, early_now()),
            Err(EngineError::InvalidScheduleConfiguration)
        ));
    }

    #[test]
    fn test_all_days_disabled_rejected_before_search() {
        let mut req = request(1, Frequency::Single);
        for d in &mut req.work_schedule {
            d.enabled = false;
        }
        assert!(matches!(
            compute_project_dates(&req, early_now()),
            Err(EngineError::InvalidScheduleConfiguration)
        ));
    }

    #[test]
    fn test_service_longer_than_longest_day_rejected() {
        let mut req = request(1, Frequency::Single);
        req.work_schedule = vec![day(Weekday::Sat, "10:00", "12:00")];
        req.service_duration_minutes = 180;
        match compute_project_dates(&req, early_now()) {
            Err(EngineError::ServiceExceedsCapacity {
                requested_minutes,
                longest_window_minutes,
            }) => {
                assert_eq!(requested_minutes, 180);
                assert_eq!(longest_window_minutes, 120);
            }
            other => panic!("expected ServiceExceedsCapacity, got {other:?}"),
        }
    }

    // ── orchestration tests ─────────────────────────────────────────────

    #[test]
    fn test_single_sitting_earliest_fit() {
        let result = compute_project_dates(&request(1, Frequency::Single), early_now()).unwrap();
        assert_eq!(result.proposed_dates, vec![utc(2026, 3, 2, 9, 0)]);
    }

    #[test]
    fn test_consecutive_sittings_on_following_days() {
        let result =
            compute_project_dates(&request(3, Frequency::Consecutive), early_now()).unwrap();
        assert_eq!(
            result.proposed_dates,
            vec![
                utc(2026, 3, 2, 9, 0),
                utc(2026, 3, 3, 9, 0),
                utc(2026, 3, 4, 9, 0),
            ]
        );
    }

    #[test]
    fn test_weekly_sittings_seven_days_apart() {
        let result = compute_project_dates(&request(3, Frequency::Weekly), early_now()).unwrap();
        assert_eq!(
            result.proposed_dates,
            vec![
                utc(2026, 3, 2, 9, 0),
                utc(2026, 3, 9, 9, 0),
                utc(2026, 3, 16, 9, 0),
            ]
        );
    }

    #[test]
    fn test_sittings_never_overlap_each_other() {
        // Tiny schedule: only Monday 09:00–10:00, weekly cadence, and a
        // service filling the whole window. Each sitting claims the one
        // slot of its week; the accumulator keeps them disjoint.
        let mut req = request(2, Frequency::Weekly);
        req.work_schedule = vec![day(Weekday::Mon, "09:00", "10:00")];
        let result = compute_project_dates(&req, early_now()).unwrap();
        assert_eq!(
            result.proposed_dates,
            vec![utc(2026, 3, 2, 9, 0), utc(2026, 3, 9, 9, 0)]
        );
    }

    #[test]
    fn test_failure_carries_one_based_sitting_index() {
        // Second sitting cannot fit: everything after the first slot
        // is blocked for two years.
        let mut req = request(2, Frequency::Consecutive);
        req.existing_appointments = vec![AppointmentInterval::new(
            utc(2026, 3, 2, 10, 0),
            utc(2028, 3, 2, 10, 0),
        )];
        match compute_project_dates(&req, early_now()) {
            Err(EngineError::SlotSearchExhausted { sitting, near_misses }) => {
                assert_eq!(sitting, 2);
                assert!(!near_misses.is_empty());
                assert!(near_misses.len() <= 5);
            }
            other => panic!("expected SlotSearchExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_total_cost_multiplies_price_by_sittings() {
        let result = compute_project_dates(&request(3, Frequency::Weekly), early_now()).unwrap();
        assert_eq!(result.total_cost, 450.0);
    }

    #[test]
    fn test_proposed_dates_strictly_increasing() {
        let result = compute_project_dates(&request(4, Frequency::Biweekly), early_now()).unwrap();
        for pair in result.proposed_dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    // ── advance_pointer tests ───────────────────────────────────────────

    #[test]
    fn test_advance_weekly_preserves_wall_clock() {
        let from = utc(2026, 3, 2, 14, 30);
        assert_eq!(
            advance_pointer(from, Frequency::Weekly, chrono_tz::UTC),
            utc(2026, 3, 9, 14, 30)
        );
    }

    #[test]
    fn test_advance_across_spring_forward_keeps_local_time() {
        // New York springs forward on 2026-03-08. Advancing a Saturday
        // 14:00 EST slot by one day must land on Sunday 14:00 EDT
        // (18:00 UTC, not 19:00).
        let from = utc(2026, 3, 7, 19, 0); // Sat 14:00 EST
        let next = advance_pointer(from, Frequency::Consecutive, chrono_tz::America::New_York);
        assert_eq!(next, utc(2026, 3, 8, 18, 0)); // Sun 14:00 EDT
    }

    #[test]
    fn test_advance_monthly_clamps_day_of_month() {
        // Jan 31 + 1 month clamps to Feb 28 (2026 is not a leap year).
        let from = utc(2026, 1, 31, 10, 0);
        assert_eq!(
            advance_pointer(from, Frequency::Monthly, chrono_tz::UTC),
            utc(2026, 2, 28, 10, 0)
        );
    }

    #[test]
    fn test_advance_monthly_across_year_end() {
        let from = utc(2026, 12, 15, 10, 0);
        assert_eq!(
            advance_pointer(from, Frequency::Monthly, chrono_tz::UTC),
            utc(2027, 1, 15, 10, 0)
        );
    }

    #[test]
    fn test_checked_add_months_matches_expectation() {
        assert_eq!(
            naive(2026, 1, 31).checked_add_months(Months::new(1)),
            Some(naive(2026, 2, 28))
        );
        assert_eq!(
            naive(2026, 3, 31).checked_add_months(Months::new(1)),
            Some(naive(2026, 4, 30))
        );
    }
}
