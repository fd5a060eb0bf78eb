//! Ticket edits.
//!
//! Any edit of an `Open` ticket frees its desk slot, whatever status the
//! edit sets. Callers are expected to move an open ticket forward when they
//! edit it.

use crate::error::{HelpdeskError, Result};
use crate::occupancy::OccupancyTracker;
use crate::repository::{HelpdeskStore, TicketRepository};
use crate::types::{Ticket, TicketChanges, TicketId};

/// Applies edits to existing tickets.
#[derive(Clone)]
pub struct LifecycleManager<S> {
    store: S,
    occupancy: OccupancyTracker<S>,
}

impl<S: HelpdeskStore> LifecycleManager<S> {
    /// Create a manager sharing the admission engine's tracker.
    #[must_use]
    pub const fn new(store: S, occupancy: OccupancyTracker<S>) -> Self {
        Self { store, occupancy }
    }

    /// Overwrite a ticket's mutable fields.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::InvalidInput`]: `changes` absent
    /// - [`HelpdeskError::NotFound`]: no ticket with that id
    /// - [`HelpdeskError::InvalidState`]: the ticket is open but no longer holds
    ///   a desk slot, or its desk queue is empty
    /// - [`HelpdeskError::Storage`]: the store failed
    #[tracing::instrument(skip(self, changes), fields(ticket_id = %id))]
    pub async fn edit_ticket(&self, id: TicketId, changes: Option<TicketChanges>) -> Result<Ticket> {
        let changes = changes
            .ok_or_else(|| HelpdeskError::InvalidInput("ticket changes are required".to_string()))?;

        let mut ticket = TicketRepository::find_by_id(&self.store, id)
            .await?
            .ok_or_else(|| HelpdeskError::ticket_not_found(id))?;

        if ticket.is_open() {
            self.occupancy.release(&ticket).await?;
        }

        let previous = ticket.status;
        ticket.apply_changes(changes);
        let ticket = TicketRepository::save(&self.store, ticket).await?;

        tracing::info!(from = %previous, to = %ticket.status, "Ticket updated");
        Ok(ticket)
    }
}
