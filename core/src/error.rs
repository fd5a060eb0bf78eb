//! Error types for ticket admission and desk management.
//!
//! Every failure travels through [`HelpdeskError`]. Callers switch on
//! [`HelpdeskError::kind`] and, for serial-number conflicts, read the
//! conflicting resource from [`HelpdeskError::resource`].

use crate::types::{DeskId, TicketId};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for help desk operations.
pub type Result<T> = std::result::Result<T, HelpdeskError>;

/// Failures reported by store adapters.
///
/// The core wraps these in [`HelpdeskError::Storage`] and never retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Query or connection failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be mapped to a domain value.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reference to the resource a rejection is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    /// A ticket.
    Ticket(TicketId),
}

impl ResourceRef {
    /// API path of the resource.
    #[must_use]
    pub fn uri(&self) -> String {
        match self {
            Self::Ticket(id) => format!("/api/tickets/{id}"),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Discriminant of a [`HelpdeskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Absent or malformed request.
    InvalidInput,
    /// Ticket or desk lookup miss.
    NotFound,
    /// Desk capacity reached.
    DeskFull,
    /// Agent already holds an open ticket.
    AgentBusy,
    /// Same-customer serial conflict.
    Conflict,
    /// Cross-customer serial conflict.
    Forbidden,
    /// Attendant already staffs a desk.
    DuplicateAttendant,
    /// Operation not allowed in the current state.
    InvalidState,
    /// Store failure.
    Storage,
}

impl ErrorKind {
    /// Stable label used in metrics and error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::DeskFull => "DESK_FULL",
            Self::AgentBusy => "AGENT_BUSY",
            Self::Conflict => "CONFLICT",
            Self::Forbidden => "FORBIDDEN",
            Self::DuplicateAttendant => "DUPLICATE_ATTENDANT",
            Self::InvalidState => "INVALID_STATE",
            Self::Storage => "STORAGE_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All failure modes of the admission engine and its supporting services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HelpdeskError {
    /// The request was absent or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A ticket or desk lookup found nothing.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// What was looked up.
        resource: &'static str,
        /// Identity that missed.
        id: i64,
    },

    /// The requested desk does not exist or could not be loaded.
    #[error("Desk {0} not found")]
    DeskNotFound(DeskId),

    /// The desk already holds the maximum number of active tickets.
    #[error("Desk {desk_id} is full ({limit} active tickets); the ticket would be queued")]
    DeskFull {
        /// Desk that rejected the ticket.
        desk_id: DeskId,
        /// Capacity limit in force.
        limit: u32,
    },

    /// The agent already has an open ticket.
    #[error("Agent {agent} already has an active ticket")]
    AgentBusy {
        /// Agent that was asked to take a second ticket.
        agent: String,
    },

    /// The same customer already has a ticket for this serial.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable description.
        message: String,
        /// The conflicting ticket.
        resource: ResourceRef,
    },

    /// Another customer's ticket is still in service for this serial.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable description.
        message: String,
        /// The conflicting ticket.
        resource: ResourceRef,
    },

    /// The attendant already staffs a desk.
    #[error("Attendant {0} already has a desk")]
    DuplicateAttendant(String),

    /// The operation is not valid for the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A store capability failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl HelpdeskError {
    /// `NotFound` for a ticket identity.
    #[must_use]
    pub const fn ticket_not_found(id: TicketId) -> Self {
        Self::NotFound {
            resource: "Ticket",
            id: id.get(),
        }
    }

    /// Discriminant callers switch on.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound { .. } | Self::DeskNotFound(_) => ErrorKind::NotFound,
            Self::DeskFull { .. } => ErrorKind::DeskFull,
            Self::AgentBusy { .. } => ErrorKind::AgentBusy,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::DuplicateAttendant(_) => ErrorKind::DuplicateAttendant,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Resource the rejection refers to, if any.
    #[must_use]
    pub const fn resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Conflict { resource, .. } | Self::Forbidden { resource, .. } => Some(resource),
            _ => None,
        }
    }

    /// `true` for rule rejections, `false` for store failures.
    #[must_use]
    pub const fn is_business_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_carries_ticket_uri() {
        let err = HelpdeskError::Conflict {
            message: "serial already has a ticket".to_string(),
            resource: ResourceRef::Ticket(TicketId::new(42)),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.resource().map(ResourceRef::uri).as_deref(),
            Some("/api/tickets/42")
        );
        assert_eq!(err.to_string(), "Conflict: serial already has a ticket");
    }

    #[test]
    fn test_desk_not_found_is_a_not_found_kind() {
        let err = HelpdeskError::DeskNotFound(DeskId::new(3));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.resource().is_none());
    }

    #[test]
    fn test_store_errors_wrap_into_storage() {
        let err: HelpdeskError = StoreError::Database("connection reset".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_business_rejection());
        assert_eq!(
            err.to_string(),
            "Storage error: Database error: connection reset"
        );
    }

    #[test]
    fn test_ticket_not_found_message() {
        let err = HelpdeskError::ticket_not_found(TicketId::new(7));
        assert_eq!(err.to_string(), "Ticket with id 7 not found");
    }
}
