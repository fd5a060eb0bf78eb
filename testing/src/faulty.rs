//! Store wrapper that fails selected operations on demand.

use chrono::{DateTime, Utc};
use helpdesk_core::error::StoreError;
use helpdesk_core::repository::{AssignmentRepository, DeskRepository, TicketRepository};
use helpdesk_core::types::{Assignment, CustomerId, Desk, DeskId, Ticket, TicketId, TicketStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Desk reads.
    DeskLookup,
    /// Desk writes.
    DeskSave,
    /// Ticket writes.
    TicketSave,
    /// Assignment writes.
    AssignmentSave,
    /// Active-assignment counts.
    AssignmentCount,
}

#[derive(Debug, Default)]
struct Switches {
    desk_lookup: AtomicBool,
    desk_save: AtomicBool,
    ticket_save: AtomicBool,
    assignment_save: AtomicBool,
    assignment_count: AtomicBool,
}

impl Switches {
    const fn flag(&self, fault: Fault) -> &AtomicBool {
        match fault {
            Fault::DeskLookup => &self.desk_lookup,
            Fault::DeskSave => &self.desk_save,
            Fault::TicketSave => &self.ticket_save,
            Fault::AssignmentSave => &self.assignment_save,
            Fault::AssignmentCount => &self.assignment_count,
        }
    }
}

/// Delegates to an inner store unless a fault is switched on.
///
/// # Example
///
/// ```
/// use helpdesk_testing::{Fault, FaultyStore, InMemoryHelpdeskStore};
///
/// let store = FaultyStore::new(InMemoryHelpdeskStore::new());
/// store.fail(Fault::AssignmentSave);
/// assert!(store.is_failing(Fault::AssignmentSave));
/// ```
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    switches: Arc<Switches>,
}

impl<S> FaultyStore<S> {
    /// Wrap a store with every fault off.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            switches: Arc::new(Switches::default()),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Make `fault` fail from now on.
    pub fn fail(&self, fault: Fault) {
        self.switches.flag(fault).store(true, Ordering::SeqCst);
    }

    /// Let `fault` succeed again.
    pub fn heal(&self, fault: Fault) {
        self.switches.flag(fault).store(false, Ordering::SeqCst);
    }

    /// Whether `fault` is switched on.
    #[must_use]
    pub fn is_failing(&self, fault: Fault) -> bool {
        self.switches.flag(fault).load(Ordering::SeqCst)
    }

    fn check(&self, fault: Fault) -> Result<(), StoreError> {
        if self.is_failing(fault) {
            Err(StoreError::Unavailable(format!("injected fault: {fault:?}")))
        } else {
            Ok(())
        }
    }
}

impl<S: DeskRepository> DeskRepository for FaultyStore<S> {
    async fn find_all(&self) -> Result<Vec<Desk>, StoreError> {
        self.check(Fault::DeskLookup)?;
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: DeskId) -> Result<Option<Desk>, StoreError> {
        self.check(Fault::DeskLookup)?;
        self.inner.find_by_id(id).await
    }

    async fn find_by_customer_id(&self, customer_id: CustomerId) -> Result<Vec<Desk>, StoreError> {
        self.check(Fault::DeskLookup)?;
        self.inner.find_by_customer_id(customer_id).await
    }

    async fn save(&self, desk: Desk) -> Result<Desk, StoreError> {
        self.check(Fault::DeskSave)?;
        self.inner.save(desk).await
    }
}

impl<S: TicketRepository> TicketRepository for FaultyStore<S> {
    async fn find_all(&self) -> Result<Vec<Ticket>, StoreError> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Ticket>, StoreError> {
        self.inner.find_by_customer_id(customer_id).await
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Ticket>, StoreError> {
        self.inner.find_by_serial(serial_number).await
    }

    async fn find_by_agent_and_status(
        &self,
        agent: &str,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, StoreError> {
        self.inner.find_by_agent_and_status(agent, status).await
    }

    async fn find_paginated(&self, page: u32, size: u32) -> Result<Vec<Ticket>, StoreError> {
        self.inner.find_paginated(page, size).await
    }

    async fn save(&self, ticket: Ticket) -> Result<Ticket, StoreError> {
        self.check(Fault::TicketSave)?;
        self.inner.save(ticket).await
    }
}

impl<S: AssignmentRepository> AssignmentRepository for FaultyStore<S> {
    async fn save(&self, assignment: Assignment) -> Result<Assignment, StoreError> {
        self.check(Fault::AssignmentSave)?;
        self.inner.save(assignment).await
    }

    async fn count_open_by_desk(&self, desk_id: DeskId) -> Result<u32, StoreError> {
        self.check(Fault::AssignmentCount)?;
        self.inner.count_open_by_desk(desk_id).await
    }

    async fn find_active_by_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<Assignment>, StoreError> {
        self.inner.find_active_by_ticket(ticket_id).await
    }

    async fn release_for_ticket(
        &self,
        ticket_id: TicketId,
        released_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.inner.release_for_ticket(ticket_id, released_at).await
    }
}
