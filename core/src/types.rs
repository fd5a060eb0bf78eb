//! Domain types for desks, tickets, and desk assignments.
//!
//! Identifiers are integer newtypes assigned by the store. A value of `0`
//! means "not yet persisted"; repositories replace it with a fresh identity
//! on save.

use crate::error::{HelpdeskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a service desk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeskId(pub i64);

impl DeskId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// `true` until the store assigns an identity.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DeskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TicketId(pub i64);

impl TicketId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// `true` until the store assigns an identity.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an assignment record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssignmentId(pub i64);

impl AssignmentId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Identifier of the customer who owns a device.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl CustomerId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Ticket Status
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle state of a ticket.
///
/// ```text
/// Open → InProgress → Resolved → Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Admitted and holding a desk slot.
    Open,
    /// Being worked on; no longer holds a desk slot.
    InProgress,
    /// Fixed; the serial may be picked up by another customer.
    Resolved,
    /// Archived.
    Closed,
}

impl TicketStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not recognized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown ticket status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for TicketStatus {
    type Err = ParseStatusError;

    /// Accepts the storage names and the legacy Portuguese names.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" | "ABERTO" => Ok(Self::Open),
            "IN_PROGRESS" | "EM_ANDAMENTO" => Ok(Self::InProgress),
            "RESOLVED" | "RESOLVIDO" => Ok(Self::Resolved),
            "CLOSED" | "FECHADO" => Ok(Self::Closed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Desk
// ═══════════════════════════════════════════════════════════════════════

/// A service window staffed by one attendant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Desk {
    /// Store-assigned identity.
    pub id: DeskId,
    /// Attendant name, unique across desks.
    pub attendant_name: String,
    /// Cached count of active assignments.
    pub queue_occupancy: u32,
}

impl Desk {
    /// A not-yet-persisted desk with an empty queue.
    #[must_use]
    pub fn new(attendant_name: impl Into<String>) -> Self {
        Self {
            id: DeskId::default(),
            attendant_name: attendant_name.into(),
            queue_occupancy: 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Ticket
// ═══════════════════════════════════════════════════════════════════════

/// A customer service request tied to a device serial number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Store-assigned identity.
    pub id: TicketId,
    /// Customer who owns the device.
    pub customer_id: CustomerId,
    /// Admission time.
    pub created_at: DateTime<Utc>,
    /// Unset while the ticket is open.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Device identifier.
    pub device_id: String,
    /// Device serial number.
    pub serial_number: String,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// Desk snapshot taken at admission.
    pub desk: Desk,
    /// Why the customer came in.
    pub reason: String,
    /// Product line of the device.
    pub product: String,
    /// User who filed the request.
    pub requesting_user: String,
    /// Agent handling the ticket.
    pub agent: String,
}

impl Ticket {
    /// Build a freshly admitted ticket from a request and the resolved desk.
    #[must_use]
    pub fn open(request: CreateTicketRequest, desk: Desk, now: DateTime<Utc>) -> Self {
        Self {
            id: TicketId::default(),
            customer_id: request.customer_id,
            created_at: now,
            resolved_at: None,
            device_id: request.device_id,
            serial_number: request.serial_number,
            status: TicketStatus::Open,
            desk,
            reason: request.reason,
            product: request.product,
            requesting_user: request.requesting_user,
            agent: request.agent,
        }
    }

    /// Owning desk.
    #[must_use]
    pub const fn desk_id(&self) -> DeskId {
        self.desk.id
    }

    /// `true` while the ticket holds a desk slot.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }

    /// Overwrite every mutable field.
    pub fn apply_changes(&mut self, changes: TicketChanges) {
        self.customer_id = changes.customer_id;
        self.device_id = changes.device_id;
        self.serial_number = changes.serial_number;
        self.status = changes.status;
        self.resolved_at = changes.resolved_at;
        self.reason = changes.reason;
        self.product = changes.product;
        self.requesting_user = changes.requesting_user;
        self.agent = changes.agent;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Assignment
// ═══════════════════════════════════════════════════════════════════════

/// Reservation of one unit of desk capacity for one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Store-assigned identity.
    pub id: AssignmentId,
    /// Ticket holding the slot.
    pub ticket_id: TicketId,
    /// Desk whose capacity is reserved.
    pub desk_id: DeskId,
    /// When the slot was taken.
    pub assigned_at: DateTime<Utc>,
    /// When the slot was given back.
    pub released_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// A new, active assignment.
    #[must_use]
    pub fn new(ticket_id: TicketId, desk_id: DeskId, assigned_at: DateTime<Utc>) -> Self {
        Self {
            id: AssignmentId::default(),
            ticket_id,
            desk_id,
            assigned_at,
            released_at: None,
        }
    }

    /// Counts against desk capacity while unreleased.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.released_at.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════════════════

/// Input to ticket admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    /// Agent who will handle the ticket.
    pub agent: String,
    /// Customer who owns the device.
    pub customer_id: CustomerId,
    /// Device identifier.
    pub device_id: String,
    /// Device serial number.
    pub serial_number: String,
    /// Target desk.
    pub desk_id: DeskId,
    /// Why the customer came in.
    #[serde(default)]
    pub reason: String,
    /// Product line.
    #[serde(default)]
    pub product: String,
    /// User who filed the request.
    #[serde(default)]
    pub requesting_user: String,
}

impl CreateTicketRequest {
    /// Reject structurally malformed requests.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::InvalidInput`] when the agent or serial number is blank.
    pub fn validate(&self) -> Result<()> {
        if self.agent.trim().is_empty() {
            return Err(HelpdeskError::InvalidInput("agent must not be blank".to_string()));
        }
        if self.serial_number.trim().is_empty() {
            return Err(HelpdeskError::InvalidInput(
                "serial number must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full replacement of a ticket's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketChanges {
    /// Customer who owns the device.
    pub customer_id: CustomerId,
    /// Device identifier.
    pub device_id: String,
    /// Device serial number.
    pub serial_number: String,
    /// New lifecycle state.
    pub status: TicketStatus,
    /// Resolution time.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Why the customer came in.
    #[serde(default)]
    pub reason: String,
    /// Product line.
    #[serde(default)]
    pub product: String,
    /// User who filed the request.
    #[serde(default)]
    pub requesting_user: String,
    /// Agent handling the ticket.
    pub agent: String,
}

impl From<&Ticket> for TicketChanges {
    fn from(ticket: &Ticket) -> Self {
        Self {
            customer_id: ticket.customer_id,
            device_id: ticket.device_id.clone(),
            serial_number: ticket.serial_number.clone(),
            status: ticket.status,
            resolved_at: ticket.resolved_at,
            reason: ticket.reason.clone(),
            product: ticket.product.clone(),
            requesting_user: ticket.requesting_user.clone(),
            agent: ticket.agent.clone(),
        }
    }
}

/// Input to desk registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDeskRequest {
    /// Attendant staffing the desk.
    pub attendant_name: String,
}

/// Input to desk edits. `id` must match the path identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDeskRequest {
    /// Desk being edited.
    pub id: DeskId,
    /// New attendant name.
    pub attendant_name: String,
    /// New cached occupancy.
    pub queue_occupancy: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_names() {
        for status in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<TicketStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_accepts_legacy_names() {
        assert_eq!("ABERTO".parse::<TicketStatus>(), Ok(TicketStatus::Open));
        assert_eq!("resolvido".parse::<TicketStatus>(), Ok(TicketStatus::Resolved));
        assert!("CONCLUIDO".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_blank_serial_is_invalid() {
        let request = CreateTicketRequest {
            agent: "bob".to_string(),
            customer_id: CustomerId::new(1),
            device_id: "dev".to_string(),
            serial_number: "  ".to_string(),
            desk_id: DeskId::new(1),
            reason: String::new(),
            product: String::new(),
            requesting_user: String::new(),
        };
        assert!(matches!(
            request.validate(),
            Err(HelpdeskError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap_or_default();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
