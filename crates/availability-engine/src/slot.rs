//! Earliest-fit slot search over a one-year horizon.
//!
//! The search is a linear scan on a 30-minute grid: from the requested
//! start (clamped to the caller-supplied "now"), advance half an hour at
//! a time until a candidate falls inside an enabled working window and
//! collides with nothing. The product requirement is "soonest
//! available", not "most efficient use of calendar", so the trivially
//! correct scan wins over cleverer packing. The one-year bound doubles
//! as the termination guarantee.
//!
//! Working-hour comparison always happens in the provider's timezone:
//! a provider's "Sunday 09:00" is a wall-clock fact, and an instant
//! stored as Saturday 23:00 UTC can be Sunday morning locally. The
//! pointer's weekday and minutes-since-midnight are therefore computed
//! from its `DateTime<Tz>` projection, never from the raw UTC value.
//!
//! No system clock is read here — the caller passes the `now` anchor,
//! keeping the search a pure function of its inputs.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{NearMiss, SkipReason};
use crate::interval::{conflicts_with, AppointmentInterval};
use crate::schedule::WorkDay;

/// All appointments and searches snap to this grid. Not configurable.
pub const SLOT_GRID_MINUTES: i64 = 30;

/// How far past the (clamped) start the search looks before giving up.
pub const SEARCH_HORIZON_DAYS: i64 = 365;

/// How many rejected candidates are kept for diagnostics.
const MAX_NEAR_MISSES: usize = 5;

/// The one-year horizon was exhausted without finding a slot.
///
/// Carries example rejected candidates so support can tell "every day
/// was disabled" apart from "everything collided".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSearchFailure {
    pub near_misses: Vec<NearMiss>,
}

/// Find the earliest collision-free, working-hours start time.
///
/// # Arguments
///
/// * `start` — earliest instant to consider; clamped to `now` if past
/// * `now` — the caller's "now" anchor (the engine never reads a clock)
/// * `duration_minutes` — service length; the candidate interval is
///   `[pointer, pointer + duration)`
/// * `schedule` — normalized weekly working hours
/// * `busy` — existing busy intervals, half-open overlap semantics
/// * `tz` — the provider's timezone, used for all wall-clock checks
///
/// # Errors
///
/// Returns [`SlotSearchFailure`] when no candidate inside
/// [`SEARCH_HORIZON_DAYS`] fits.
pub fn find_next_slot(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    duration_minutes: u32,
    schedule: &[WorkDay],
    busy: &[AppointmentInterval],
    tz: Tz,
) -> Result<DateTime<Utc>, SlotSearchFailure> {
    let duration = Duration::minutes(i64::from(duration_minutes));
    let mut pointer = round_up_to_grid(start.max(now));
    let horizon = pointer + Duration::days(SEARCH_HORIZON_DAYS);

    debug!(%pointer, %tz, duration_minutes, "slot search started");

    let mut near_misses: Vec<NearMiss> = Vec::new();

    while pointer <= horizon {
        let local = pointer.with_timezone(&tz);

        match window_for(schedule, local.weekday()) {
            None => record(&mut near_misses, pointer, SkipReason::DayOff),
            Some((window_start, window_end)) => {
                let minute_of_day =
                    i64::from(local.hour()) * 60 + i64::from(local.minute());
                let latest_start = window_end - i64::from(duration_minutes);

                if minute_of_day < window_start || minute_of_day > latest_start {
                    record(&mut near_misses, pointer, SkipReason::OutsideHours);
                } else if conflicts_with(busy, pointer, pointer + duration) {
                    record(&mut near_misses, pointer, SkipReason::Collision);
                } else {
                    debug!(slot = %pointer, "slot search succeeded");
                    return Ok(pointer);
                }
            }
        }

        pointer += Duration::minutes(SLOT_GRID_MINUTES);
    }

    debug!(%horizon, "slot search exhausted");
    Err(SlotSearchFailure { near_misses })
}

/// The enabled working window for `weekday`, as minutes-since-midnight.
fn window_for(schedule: &[WorkDay], weekday: Weekday) -> Option<(i64, i64)> {
    schedule
        .iter()
        .find(|d| d.day == weekday)
        .and_then(WorkDay::window_minutes)
}

/// Round up to the next 30-minute boundary, zeroing seconds.
/// An instant already on the grid is left alone.
fn round_up_to_grid(instant: DateTime<Utc>) -> DateTime<Utc> {
    let grid = SLOT_GRID_MINUTES * 60;
    let secs = instant.timestamp();
    let rem = secs.rem_euclid(grid);
    let bump = if rem == 0 && instant.timestamp_subsec_nanos() == 0 {
        0
    } else {
        grid - rem
    };
    DateTime::from_timestamp(secs + bump, 0).unwrap_or(instant)
}

fn record(near_misses: &mut Vec<NearMiss>, candidate: DateTime<Utc>, reason: SkipReason) {
    if near_misses.len() < MAX_NEAR_MISSES {
        near_misses.push(NearMiss { candidate, reason });
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
