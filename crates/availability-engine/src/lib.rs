//! # availability-engine
//!
//! Deterministic multi-sitting booking availability for independent
//! service providers.
//!
//! Given a service duration, a number of required sittings, a booking
//! cadence, a provider's weekly working hours, and the provider's
//! already-booked intervals, the engine computes one collision-free
//! start time per sitting — each inside working hours in the provider's
//! timezone, spaced by the cadence.
//!
//! The engine is pure: no I/O, no system clock (the caller passes the
//! "now" anchor), no shared state. It may be invoked concurrently
//! without locking; the write-time race against persistence is handled
//! at the boundary by [`guard`].
//!
//! ## Modules
//!
//! - [`schedule`] — working-hours parsing, normalization, and capacity
//! - [`interval`] — busy intervals and half-open overlap detection
//! - [`slot`] — earliest-fit slot search over a one-year horizon
//! - [`project`] — one slot per sitting, spaced by the booking cadence
//! - [`guard`] — write-time overlap protection for the booking workflow
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```
//! use availability_engine::{
//!     compute_project_dates, normalize_schedule, Frequency,
//!     ProjectAvailabilityRequest,
//! };
//! use chrono::{TimeZone, Utc};
//! use serde_json::json;
//!
//! let schedule = normalize_schedule(&json!({
//!     "monday": {"enabled": true, "start": "09:00", "end": "17:00"},
//!     "wednesday": {"enabled": true, "start": "09:00", "end": "17:00"},
//! }));
//!
//! let request = ProjectAvailabilityRequest {
//!     service_duration_minutes: 120,
//!     sittings: 2,
//!     frequency: Frequency::Weekly,
//!     start_date: Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
//!     work_schedule: schedule,
//!     existing_appointments: Vec::new(),
//!     time_zone: "America/New_York".to_string(),
//!     sitting_price: 200.0,
//! };
//!
//! let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
//! let result = compute_project_dates(&request, now).unwrap();
//! assert_eq!(result.proposed_dates.len(), 2);
//! assert_eq!(result.total_cost, 400.0);
//! ```

pub mod error;
pub mod guard;
pub mod interval;
pub mod project;
pub mod schedule;
pub mod slot;

pub use error::{EngineError, NearMiss, Result, SkipReason};
pub use guard::{AppointmentStore, OverlapGuard};
pub use interval::{conflicts_with, AppointmentInterval};
pub use project::{
    compute_project_dates, Frequency, ProjectAvailabilityRequest, ProjectAvailabilityResult,
};
pub use schedule::{max_daily_minutes, normalize_schedule, parse_time_of_day, WorkDay};
pub use slot::{find_next_slot, SlotSearchFailure, SEARCH_HORIZON_DAYS, SLOT_GRID_MINUTES};
