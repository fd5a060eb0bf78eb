//! In-memory store.
//!
//! Implements every store capability over one set of tables guarded by a
//! single lock, so each call is atomic on its own. Used by tests and by the
//! server's `memory` storage mode.

use chrono::{DateTime, Utc};
use helpdesk_core::error::StoreError;
use helpdesk_core::repository::{AssignmentRepository, DeskRepository, TicketRepository};
use helpdesk_core::types::{
    Assignment, AssignmentId, CustomerId, Desk, DeskId, Ticket, TicketId, TicketStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    desks: BTreeMap<DeskId, Desk>,
    tickets: BTreeMap<TicketId, Ticket>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    last_desk_id: i64,
    last_ticket_id: i64,
    last_assignment_id: i64,
}

/// In-memory help desk store for fast, deterministic testing.
///
/// # Example
///
/// ```
/// use helpdesk_testing::InMemoryHelpdeskStore;
/// use helpdesk_core::{Desk, DeskRepository};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryHelpdeskStore::new();
/// let desk = DeskRepository::save(&store, Desk::new("Ana")).await?;
/// assert_eq!(desk.id.get(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryHelpdeskStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryHelpdeskStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every assignment ever recorded, released ones included.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn assignments(&self) -> Result<Vec<Assignment>, StoreError> {
        Ok(self.read()?.assignments.values().cloned().collect())
    }

    /// Number of stored tickets.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn ticket_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.tickets.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

fn page_bounds(page: u32, size: u32) -> (usize, usize) {
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    let skip = usize::try_from(page).unwrap_or(usize::MAX).saturating_mul(size);
    (skip, size)
}

impl DeskRepository for InMemoryHelpdeskStore {
    async fn find_all(&self) -> Result<Vec<Desk>, StoreError> {
        Ok(self.read()?.desks.values().cloned().collect())
    }

    async fn find_by_id(&self, id: DeskId) -> Result<Option<Desk>, StoreError> {
        Ok(self.read()?.desks.get(&id).cloned())
    }

    async fn find_by_customer_id(&self, customer_id: CustomerId) -> Result<Vec<Desk>, StoreError> {
        let tables = self.read()?;
        let desk_ids: BTreeSet<DeskId> = tables
            .tickets
            .values()
            .filter(|ticket| ticket.customer_id == customer_id)
            .map(Ticket::desk_id)
            .collect();
        Ok(desk_ids
            .iter()
            .filter_map(|id| tables.desks.get(id).cloned())
            .collect())
    }

    async fn save(&self, mut desk: Desk) -> Result<Desk, StoreError> {
        let mut tables = self.write()?;
        if desk.id.is_unassigned() {
            tables.last_desk_id += 1;
            desk.id = DeskId::new(tables.last_desk_id);
        }
        tables.desks.insert(desk.id, desk.clone());
        Ok(desk)
    }
}

impl TicketRepository for InMemoryHelpdeskStore {
    async fn find_all(&self) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.read()?.tickets.values().cloned().collect())
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.read()?.tickets.get(&id).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .read()?
            .tickets
            .values()
            .filter(|ticket| ticket.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .read()?
            .tickets
            .values()
            .rev()
            .find(|ticket| ticket.serial_number == serial_number)
            .cloned())
    }

    async fn find_by_agent_and_status(
        &self,
        agent: &str,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .read()?
            .tickets
            .values()
            .filter(|ticket| ticket.agent == agent && ticket.status == status)
            .cloned()
            .collect())
    }

    async fn find_paginated(&self, page: u32, size: u32) -> Result<Vec<Ticket>, StoreError> {
        let (skip, take) = page_bounds(page, size);
        Ok(self
            .read()?
            .tickets
            .values()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn save(&self, mut ticket: Ticket) -> Result<Ticket, StoreError> {
        let mut tables = self.write()?;
        if ticket.id.is_unassigned() {
            tables.last_ticket_id += 1;
            ticket.id = TicketId::new(tables.last_ticket_id);
        }
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }
}

impl AssignmentRepository for InMemoryHelpdeskStore {
    async fn save(&self, mut assignment: Assignment) -> Result<Assignment, StoreError> {
        let mut tables = self.write()?;
        tables.last_assignment_id += 1;
        assignment.id = AssignmentId::new(tables.last_assignment_id);
        tables.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn count_open_by_desk(&self, desk_id: DeskId) -> Result<u32, StoreError> {
        let count = self
            .read()?
            .assignments
            .values()
            .filter(|assignment| assignment.desk_id == desk_id && assignment.is_active())
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn find_active_by_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .read()?
            .assignments
            .values()
            .find(|assignment| assignment.ticket_id == ticket_id && assignment.is_active())
            .cloned())
    }

    async fn release_for_ticket(
        &self,
        ticket_id: TicketId,
        released_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let active = tables
            .assignments
            .values_mut()
            .find(|assignment| assignment.ticket_id == ticket_id && assignment.is_active());
        Ok(active.map_or(false, |assignment| {
            assignment.released_at = Some(released_at);
            true
        }))
    }
}
