//! Ticket admission.
//!
//! Decides whether a new ticket may be created and routes it to a desk.
//!
//! # Flow
//!
//! ```text
//! request ─► validate ─► agent free? ─► desk exists? ─► desk has room?
//!                                                           │
//!        ticket ◄─ assignment saved ◄─ ticket saved ◄─ serial clear?
//! ```
//!
//! Nothing is written until every check has passed. The ticket and its
//! assignment are two separate writes: if the assignment fails, the ticket
//! stays persisted and the caller receives [`HelpdeskError::Storage`].

use crate::config::{AdmissionConfig, SerialConflictPolicy};
use crate::environment::Clock;
use crate::error::{HelpdeskError, ResourceRef, Result};
use crate::locks::DeskLocks;
use crate::metrics::AdmissionMetrics;
use crate::occupancy::OccupancyTracker;
use crate::repository::{DeskRepository, HelpdeskStore, TicketRepository};
use crate::types::{CreateTicketRequest, CustomerId, Desk, DeskId, Ticket, TicketStatus};
use std::sync::Arc;
use std::time::Instant;

/// Decide whether an existing ticket on the same serial blocks a new one.
///
/// - same customer: governed by `policy`
/// - different customer: blocked unless the existing ticket is `Resolved`
#[must_use]
pub fn serial_conflict(
    existing: &Ticket,
    customer_id: CustomerId,
    policy: SerialConflictPolicy,
) -> Option<HelpdeskError> {
    let resource = ResourceRef::Ticket(existing.id);

    if existing.customer_id == customer_id {
        let blocked = match policy {
            SerialConflictPolicy::Literal => existing.status != TicketStatus::Open,
            SerialConflictPolicy::WhileOpen => existing.status == TicketStatus::Open,
        };
        blocked.then(|| HelpdeskError::Conflict {
            message: format!(
                "a ticket already exists for serial {}",
                existing.serial_number
            ),
            resource,
        })
    } else if existing.status == TicketStatus::Resolved {
        None
    } else {
        Some(HelpdeskError::Forbidden {
            message: format!(
                "serial {} is already in service for another customer",
                existing.serial_number
            ),
            resource,
        })
    }
}

/// Admits tickets to desks under capacity and exclusivity rules.
#[derive(Clone)]
pub struct AdmissionEngine<S> {
    store: S,
    occupancy: OccupancyTracker<S>,
    clock: Arc<dyn Clock>,
    config: AdmissionConfig,
    locks: DeskLocks,
}

impl<S: HelpdeskStore> AdmissionEngine<S> {
    /// Create an engine.
    ///
    /// The capacity limit and conflict policy come from `config`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, config: AdmissionConfig) -> Self {
        Self {
            occupancy: OccupancyTracker::new(store.clone(), Arc::clone(&clock)),
            store,
            clock,
            config,
            locks: DeskLocks::new(),
        }
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Tracker used for capacity decisions.
    #[must_use]
    pub const fn occupancy(&self) -> &OccupancyTracker<S> {
        &self.occupancy
    }

    /// Admit a new ticket.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::InvalidInput`]: request absent or malformed
    /// - [`HelpdeskError::AgentBusy`]: agent already has an open ticket
    /// - [`HelpdeskError::DeskNotFound`]: desk missing or unreadable
    /// - [`HelpdeskError::DeskFull`]: desk at capacity
    /// - [`HelpdeskError::Conflict`] / [`HelpdeskError::Forbidden`]: serial in use
    /// - [`HelpdeskError::Storage`]: a write failed
    #[tracing::instrument(skip(self, request), name = "create_ticket")]
    pub async fn create_ticket(&self, request: Option<CreateTicketRequest>) -> Result<Ticket> {
        let started = Instant::now();
        let result = self.admit(request).await;

        match &result {
            Ok(ticket) => {
                AdmissionMetrics::record_admitted(started.elapsed());
                tracing::info!(
                    ticket_id = %ticket.id,
                    desk_id = %ticket.desk_id(),
                    agent = %ticket.agent,
                    "Ticket admitted"
                );
            }
            Err(err) => {
                AdmissionMetrics::record_rejected(err.kind(), started.elapsed());
                if err.is_business_rejection() {
                    tracing::warn!(kind = %err.kind(), error = %err, "Ticket rejected");
                } else {
                    tracing::error!(error = %err, "Ticket admission failed");
                }
            }
        }

        result
    }

    async fn admit(&self, request: Option<CreateTicketRequest>) -> Result<Ticket> {
        let request = request
            .ok_or_else(|| HelpdeskError::InvalidInput("ticket request is required".to_string()))?;
        request.validate()?;

        self.ensure_agent_available(&request.agent).await?;
        let desk = self.resolve_desk(request.desk_id).await?;

        // Held until the assignment is written.
        let _desk_guard = if self.config.serialize_per_desk {
            Some(self.locks.acquire(desk.id).await)
        } else {
            None
        };

        self.ensure_capacity(&desk).await?;
        self.ensure_serial_available(&request).await?;

        let ticket = Ticket::open(request, desk.clone(), self.clock.now());
        let ticket = TicketRepository::save(&self.store, ticket).await?;

        if let Err(err) = self.occupancy.record_admission(&desk, &ticket).await {
            tracing::error!(
                ticket_id = %ticket.id,
                desk_id = %desk.id,
                error = %err,
                "Ticket persisted without a desk assignment"
            );
            return Err(err);
        }

        Ok(ticket)
    }

    async fn ensure_agent_available(&self, agent: &str) -> Result<()> {
        let open =
            TicketRepository::find_by_agent_and_status(&self.store, agent, TicketStatus::Open)
                .await?;
        if open.is_empty() {
            Ok(())
        } else {
            Err(HelpdeskError::AgentBusy {
                agent: agent.to_string(),
            })
        }
    }

    async fn resolve_desk(&self, desk_id: DeskId) -> Result<Desk> {
        match DeskRepository::find_by_id(&self.store, desk_id).await {
            Ok(Some(desk)) => Ok(desk),
            Ok(None) => Err(HelpdeskError::DeskNotFound(desk_id)),
            Err(err) => {
                tracing::warn!(desk_id = %desk_id, error = %err, "Desk lookup failed");
                Err(HelpdeskError::DeskNotFound(desk_id))
            }
        }
    }

    async fn ensure_capacity(&self, desk: &Desk) -> Result<()> {
        let active = self.occupancy.count_active(desk.id).await?;
        if active >= self.config.capacity_limit {
            return Err(HelpdeskError::DeskFull {
                desk_id: desk.id,
                limit: self.config.capacity_limit,
            });
        }
        Ok(())
    }

    async fn ensure_serial_available(&self, request: &CreateTicketRequest) -> Result<()> {
        let Some(existing) =
            TicketRepository::find_by_serial(&self.store, &request.serial_number).await?
        else {
            return Ok(());
        };

        match serial_conflict(
            &existing,
            request.customer_id,
            self.config.serial_conflict_policy,
        ) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketId;
    use chrono::{DateTime, Utc};

    fn existing(status: TicketStatus, customer: i64) -> Ticket {
        Ticket {
            id: TicketId::new(9),
            customer_id: CustomerId::new(customer),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            resolved_at: None,
            device_id: "dev-1".to_string(),
            serial_number: "SN-1".to_string(),
            status,
            desk: Desk::new("Ana"),
            reason: String::new(),
            product: String::new(),
            requesting_user: String::new(),
            agent: "agent-1".to_string(),
        }
    }

    #[test]
    fn test_same_customer_literal_conflicts_once_past_open() {
        let policy = SerialConflictPolicy::Literal;
        assert!(serial_conflict(&existing(TicketStatus::Open, 1), CustomerId::new(1), policy).is_none());

        for status in [TicketStatus::InProgress, TicketStatus::Resolved, TicketStatus::Closed] {
            let err = serial_conflict(&existing(status, 1), CustomerId::new(1), policy);
            assert!(matches!(err, Some(HelpdeskError::Conflict { .. })), "{status}");
        }
    }

    #[test]
    fn test_same_customer_while_open_conflicts_only_when_open() {
        let policy = SerialConflictPolicy::WhileOpen;
        let err = serial_conflict(&existing(TicketStatus::Open, 1), CustomerId::new(1), policy);
        assert_eq!(
            err.as_ref().and_then(HelpdeskError::resource),
            Some(&ResourceRef::Ticket(TicketId::new(9)))
        );
        assert!(serial_conflict(&existing(TicketStatus::Resolved, 1), CustomerId::new(1), policy).is_none());
    }

    #[test]
    fn test_other_customer_blocked_unless_resolved() {
        for policy in [SerialConflictPolicy::Literal, SerialConflictPolicy::WhileOpen] {
            for status in [TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Closed] {
                let err = serial_conflict(&existing(status, 1), CustomerId::new(2), policy);
                assert!(matches!(err, Some(HelpdeskError::Forbidden { .. })), "{status}");
            }
            assert!(
                serial_conflict(&existing(TicketStatus::Resolved, 1), CustomerId::new(2), policy)
                    .is_none()
            );
        }
    }
}
