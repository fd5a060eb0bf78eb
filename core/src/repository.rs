//! Store capabilities consumed by the engine.
//!
//! The engine never talks to a database directly. Adapters implement these
//! traits:
//!
//! - `InMemoryHelpdeskStore` (in `helpdesk-testing`): fast, deterministic tests
//! - `PostgresHelpdeskStore` (in `helpdesk-postgres`): production storage
//!
//! # Dyn Compatibility
//!
//! Methods return `impl Future + Send` so services stay generic over the
//! store and their futures remain `Send` for axum handlers. Implementors may
//! write plain `async fn`.
//!
//! # Method Names
//!
//! The three traits share method names (`save`, `find_by_id`, ...). A single
//! adapter usually implements all of them, so call sites use fully qualified
//! syntax, e.g. `DeskRepository::find_by_id(&store, id)`.

use crate::error::StoreError;
use crate::types::{Assignment, CustomerId, Desk, DeskId, Ticket, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Desk registry.
pub trait DeskRepository: Send + Sync {
    /// All desks, ordered by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Desk>, StoreError>> + Send;

    /// Desk by identity, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_id(&self, id: DeskId)
    -> impl Future<Output = Result<Option<Desk>, StoreError>> + Send;

    /// Desks that have served the customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> impl Future<Output = Result<Vec<Desk>, StoreError>> + Send;

    /// Insert (unassigned id) or overwrite a desk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save(&self, desk: Desk) -> impl Future<Output = Result<Desk, StoreError>> + Send;
}

/// Ticket store.
pub trait TicketRepository: Send + Sync {
    /// All tickets, ordered by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Ticket>, StoreError>> + Send;

    /// Ticket by identity, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_id(
        &self,
        id: TicketId,
    ) -> impl Future<Output = Result<Option<Ticket>, StoreError>> + Send;

    /// Tickets filed for the customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> impl Future<Output = Result<Vec<Ticket>, StoreError>> + Send;

    /// Most recent ticket for the serial number, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_serial(
        &self,
        serial_number: &str,
    ) -> impl Future<Output = Result<Option<Ticket>, StoreError>> + Send;

    /// Tickets handled by the agent in the given status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_agent_and_status(
        &self,
        agent: &str,
        status: TicketStatus,
    ) -> impl Future<Output = Result<Vec<Ticket>, StoreError>> + Send;

    /// One page of tickets ordered by identity. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_paginated(
        &self,
        page: u32,
        size: u32,
    ) -> impl Future<Output = Result<Vec<Ticket>, StoreError>> + Send;

    /// Insert (unassigned id) or overwrite a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save(&self, ticket: Ticket) -> impl Future<Output = Result<Ticket, StoreError>> + Send;
}

/// Desk-occupancy records.
pub trait AssignmentRepository: Send + Sync {
    /// Insert an assignment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save(
        &self,
        assignment: Assignment,
    ) -> impl Future<Output = Result<Assignment, StoreError>> + Send;

    /// Number of unreleased assignments for the desk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn count_open_by_desk(
        &self,
        desk_id: DeskId,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// The ticket's unreleased assignment, if it holds one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_active_by_ticket(
        &self,
        ticket_id: TicketId,
    ) -> impl Future<Output = Result<Option<Assignment>, StoreError>> + Send;

    /// Release the ticket's active assignment. Returns `false` if it had none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn release_for_ticket(
        &self,
        ticket_id: TicketId,
        released_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Everything the services need from one backing store.
pub trait HelpdeskStore:
    DeskRepository + TicketRepository + AssignmentRepository + Clone + 'static
{
}

impl<T> HelpdeskStore for T where
    T: DeskRepository + TicketRepository + AssignmentRepository + Clone + 'static
{
}
