//! Ticket operations exposed to the transport layer.

use crate::admission::AdmissionEngine;
use crate::config::AdmissionConfig;
use crate::environment::Clock;
use crate::error::{HelpdeskError, Result};
use crate::lifecycle::LifecycleManager;
use crate::occupancy::OccupancyTracker;
use crate::repository::{HelpdeskStore, TicketRepository};
use crate::types::{CreateTicketRequest, CustomerId, Ticket, TicketChanges, TicketId};
use std::sync::Arc;

/// Facade over admission, lifecycle, and ticket queries.
#[derive(Clone)]
pub struct TicketService<S> {
    store: S,
    admission: AdmissionEngine<S>,
    lifecycle: LifecycleManager<S>,
}

impl<S: HelpdeskStore> TicketService<S> {
    /// Wire the engine, the lifecycle manager, and a shared occupancy tracker.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, config: AdmissionConfig) -> Self {
        let admission = AdmissionEngine::new(store.clone(), clock, config);
        let lifecycle = LifecycleManager::new(store.clone(), admission.occupancy().clone());
        Self {
            store,
            admission,
            lifecycle,
        }
    }

    /// Occupancy tracker shared by admission and lifecycle.
    #[must_use]
    pub const fn occupancy(&self) -> &OccupancyTracker<S> {
        self.admission.occupancy()
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        self.admission.config()
    }

    /// See [`AdmissionEngine::create_ticket`].
    ///
    /// # Errors
    ///
    /// See [`AdmissionEngine::create_ticket`].
    pub async fn create_ticket(&self, request: Option<CreateTicketRequest>) -> Result<Ticket> {
        self.admission.create_ticket(request).await
    }

    /// See [`LifecycleManager::edit_ticket`].
    ///
    /// # Errors
    ///
    /// See [`LifecycleManager::edit_ticket`].
    pub async fn edit_ticket(&self, id: TicketId, changes: Option<TicketChanges>) -> Result<Ticket> {
        self.lifecycle.edit_ticket(id, changes).await
    }

    /// A single ticket.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::NotFound`]: no ticket with that id
    /// - [`HelpdeskError::Storage`]: the store failed
    pub async fn ticket_details(&self, id: TicketId) -> Result<Ticket> {
        TicketRepository::find_by_id(&self.store, id)
            .await?
            .ok_or_else(|| HelpdeskError::ticket_not_found(id))
    }

    /// One zero-based page of tickets. `size` is capped at the configured maximum.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::InvalidInput`]: `size` is zero
    /// - [`HelpdeskError::Storage`]: the store failed
    pub async fn list_tickets(&self, page: u32, size: u32) -> Result<Vec<Ticket>> {
        if size == 0 {
            return Err(HelpdeskError::InvalidInput(
                "page size must be greater than 0".to_string(),
            ));
        }
        let size = size.min(self.config().max_page_size);
        Ok(TicketRepository::find_paginated(&self.store, page, size).await?)
    }

    /// Every ticket filed for the customer.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::NotFound`]: the customer has no tickets
    /// - [`HelpdeskError::Storage`]: the store failed
    pub async fn list_tickets_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Ticket>> {
        let tickets = TicketRepository::find_by_customer_id(&self.store, customer_id).await?;
        if tickets.is_empty() {
            return Err(HelpdeskError::NotFound {
                resource: "Tickets for customer",
                id: customer_id.get(),
            });
        }
        Ok(tickets)
    }
}
