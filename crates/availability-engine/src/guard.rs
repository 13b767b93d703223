//! Write-time overlap protection for the booking workflow.
//!
//! The engine searches against a snapshot of existing appointments; the
//! gap between that snapshot and the eventual insert is an unprotected
//! race window. Two concurrent requests can both see the same slot as
//! free. The guard converts a lost race into a user-visible
//! [`EngineError::OverlapAtCommit`] instead of a silent double-booking:
//! every write path re-validates immediately before insert, and the
//! store's [`AppointmentStore::insert_if_free`] is expected to make the
//! final check-then-insert atomic (a conditional insert or exclusion
//! constraint at the storage layer).

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::interval::{conflicts_with, AppointmentInterval};

/// Persistence seam for appointment reads and guarded writes. The
/// engine owns no storage; the booking workflow supplies an
/// implementation backed by its appointment store.
pub trait AppointmentStore {
    /// Busy intervals for `provider_id` intersecting `[from, to)`.
    fn busy_between(
        &self,
        provider_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AppointmentInterval>>;

    /// Persist `interval` for `provider_id` unless it overlaps an
    /// existing appointment, atomically at the store. Returns `false`
    /// when the insert was refused because of an overlap.
    fn insert_if_free(
        &mut self,
        provider_id: &str,
        interval: AppointmentInterval,
    ) -> Result<bool>;
}

/// Last-instant overlap check wrapped around an [`AppointmentStore`].
pub struct OverlapGuard<S> {
    store: S,
}

impl<S: AppointmentStore> OverlapGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Point check used as a precondition before creating a single
    /// ad-hoc appointment: does `[start, end)` collide with anything
    /// already persisted for this provider?
    pub fn has_overlap(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let busy = self.store.busy_between(provider_id, start, end)?;
        Ok(conflicts_with(&busy, start, end))
    }

    /// Re-validate and persist one proposed interval.
    ///
    /// # Errors
    ///
    /// [`EngineError::OverlapAtCommit`] when either the re-check or the
    /// store's atomic insert finds a collision the search-time snapshot
    /// missed. Retryable: the caller re-runs the search for this
    /// sitting and commits again.
    pub fn commit(&mut self, provider_id: &str, interval: AppointmentInterval) -> Result<()> {
        if self.has_overlap(provider_id, interval.start, interval.end)? {
            debug!(provider_id, start = %interval.start, "overlap found at commit");
            return Err(EngineError::OverlapAtCommit);
        }
        if !self.store.insert_if_free(provider_id, interval)? {
            debug!(provider_id, start = %interval.start, "store refused insert");
            return Err(EngineError::OverlapAtCommit);
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
