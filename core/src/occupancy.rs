//! Desk occupancy tracking.
//!
//! Assignment records are the source of truth: a desk's load is the number
//! of its unreleased assignments. `Desk::queue_occupancy` is a cache that is
//! refreshed from that count on every admission and decremented when an open
//! ticket is edited.

use crate::environment::Clock;
use crate::error::{HelpdeskError, Result};
use crate::metrics::AdmissionMetrics;
use crate::repository::{AssignmentRepository, DeskRepository, HelpdeskStore};
use crate::types::{Assignment, Desk, DeskId, Ticket};
use std::sync::Arc;

/// Counts and adjusts desk occupancy.
#[derive(Clone)]
pub struct OccupancyTracker<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: HelpdeskStore> OccupancyTracker<S> {
    /// Create a tracker over the given store.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Number of active assignments for the desk.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Storage`] if the count query fails.
    pub async fn count_active(&self, desk_id: DeskId) -> Result<u32> {
        Ok(AssignmentRepository::count_open_by_desk(&self.store, desk_id).await?)
    }

    /// Reserve a desk slot for a persisted ticket and refresh the desk cache.
    ///
    /// The slot is taken once the assignment is written. A failed cache
    /// refresh is logged and leaves the cached occupancy stale until the
    /// next admission on the desk.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Storage`] if the assignment write fails.
    /// The ticket is not rolled back.
    #[tracing::instrument(skip(self, desk, ticket), fields(desk_id = %desk.id, ticket_id = %ticket.id))]
    pub async fn record_admission(&self, desk: &Desk, ticket: &Ticket) -> Result<Assignment> {
        let assignment = AssignmentRepository::save(
            &self.store,
            Assignment::new(ticket.id, desk.id, self.clock.now()),
        )
        .await?;

        match self.refresh_cache(desk).await {
            Ok(active) => tracing::debug!(active, "Desk occupancy refreshed"),
            Err(err) => tracing::warn!(error = %err, "Desk occupancy cache left stale"),
        }
        Ok(assignment)
    }

    async fn refresh_cache(&self, desk: &Desk) -> Result<u32> {
        let active = self.count_active(desk.id).await?;
        let mut cached = DeskRepository::find_by_id(&self.store, desk.id)
            .await?
            .unwrap_or_else(|| desk.clone());
        cached.queue_occupancy = active;
        DeskRepository::save(&self.store, cached).await?;
        Ok(active)
    }

    /// Take one unit off the desk's cached occupancy.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::DeskNotFound`] if the desk does not exist
    /// - [`HelpdeskError::InvalidState`] if the occupancy is already zero
    /// - [`HelpdeskError::Storage`] if the store fails
    #[tracing::instrument(skip(self), fields(desk_id = %desk_id))]
    pub async fn decrement(&self, desk_id: DeskId) -> Result<Desk> {
        let mut desk = DeskRepository::find_by_id(&self.store, desk_id)
            .await?
            .ok_or(HelpdeskError::DeskNotFound(desk_id))?;

        if desk.queue_occupancy == 0 {
            tracing::warn!("Refusing to decrement an empty desk queue");
            return Err(HelpdeskError::InvalidState(format!(
                "the queue of desk {desk_id} is already empty"
            )));
        }

        desk.queue_occupancy -= 1;
        Ok(DeskRepository::save(&self.store, desk).await?)
    }

    /// Give back the slot held by an open ticket.
    ///
    /// Only a ticket with an active assignment has a slot to give back.
    /// The desk is decremented before the assignment is released, so a
    /// rejected decrement leaves the assignment untouched.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::InvalidState`] if the ticket holds no active
    ///   assignment, or the desk queue is already empty
    /// - [`HelpdeskError::DeskNotFound`] if the desk does not exist
    /// - [`HelpdeskError::Storage`] if the store fails
    #[tracing::instrument(skip(self, ticket), fields(ticket_id = %ticket.id, desk_id = %ticket.desk_id()))]
    pub async fn release(&self, ticket: &Ticket) -> Result<Desk> {
        if AssignmentRepository::find_active_by_ticket(&self.store, ticket.id)
            .await?
            .is_none()
        {
            tracing::warn!("Ticket holds no desk slot to release");
            return Err(HelpdeskError::InvalidState(format!(
                "ticket {} holds no slot on desk {}",
                ticket.id,
                ticket.desk_id()
            )));
        }

        let desk = self.decrement(ticket.desk_id()).await?;

        let released =
            AssignmentRepository::release_for_ticket(&self.store, ticket.id, self.clock.now())
                .await?;
        if !released {
            tracing::warn!("Assignment was released concurrently");
        }

        AdmissionMetrics::record_release();
        Ok(desk)
    }
}
