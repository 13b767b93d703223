//! Error types for availability-engine operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Why a candidate instant was rejected during slot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The candidate's weekday has no enabled working window.
    DayOff,
    /// The candidate's local time-of-day falls outside the working window.
    OutsideHours,
    /// The candidate interval collides with an existing busy interval.
    Collision,
}

/// A rejected candidate kept for support diagnostics.
///
/// At most five are retained per search, so an exhausted one-year scan
/// still produces a bounded, readable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NearMiss {
    /// The candidate start instant that was rejected.
    pub candidate: DateTime<Utc>,
    /// Why it was rejected.
    pub reason: SkipReason,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("work schedule has no usable working hours")]
    InvalidScheduleConfiguration,

    #[error(
        "service of {requested_minutes} minutes exceeds the longest working day \
         ({longest_window_minutes} minutes)"
    )]
    ServiceExceedsCapacity {
        requested_minutes: u32,
        longest_window_minutes: i64,
    },

    #[error("no free slot within one year for sitting {sitting}")]
    SlotSearchExhausted {
        /// 1-based index of the sitting that could not be placed.
        sitting: u32,
        /// Example rejected candidates (at most five).
        near_misses: Vec<NearMiss>,
    },

    #[error("slot no longer available at commit time")]
    OverlapAtCommit,

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
