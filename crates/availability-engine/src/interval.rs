//! Busy intervals and half-open overlap detection.
//!
//! Every collision check in the crate goes through the same rule:
//! two intervals overlap when `a.start < b.end && b.start < a.end`.
//! Adjacent intervals (one ends exactly when another starts) are NOT
//! overlapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque busy window on a provider's calendar.
///
/// Instants are UTC-anchored; interpretation against the provider's
/// working hours happens elsewhere, in the provider's timezone.
/// Invariant: `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AppointmentInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open interval overlap. Excludes the adjacent case where
    /// one interval ends exactly when the other starts.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// True when `[start, end)` overlaps any interval in `busy`.
pub fn conflicts_with(
    busy: &[AppointmentInterval],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    let candidate = AppointmentInterval::new(start, end);
    busy.iter().any(|b| b.overlaps(&candidate))
}

// ── Tests ───────────────────────────────────────────────────────────────────
