//! # Helpdesk Core
//!
//! Ticket admission and desk-assignment engine.
//!
//! Customer tickets are routed to service desks under a per-desk capacity
//! limit. An agent may hold only one open ticket at a time, and a device
//! serial number may not be in service for two customers at once.
//!
//! ## Components
//!
//! - [`AdmissionEngine`]: validates a request and admits it to a desk
//! - [`OccupancyTracker`]: counts active assignments and adjusts desk occupancy
//! - [`LifecycleManager`]: edits tickets and frees desk slots
//! - [`DeskService`]: registers, edits, and lists desks
//! - [`TicketService`]: the ticket operations exposed to transport layers
//!
//! Storage is reached only through the traits in [`repository`].
//!
//! ## Example
//!
//! ```ignore
//! use helpdesk_core::{AdmissionConfig, SystemClock, TicketService};
//! use std::sync::Arc;
//!
//! let tickets = TicketService::new(store, Arc::new(SystemClock), AdmissionConfig::default());
//! let ticket = tickets.create_ticket(Some(request)).await?;
//! ```

#![forbid(unsafe_code)]

pub mod admission;
pub mod config;
pub mod desks;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod metrics;
pub mod occupancy;
pub mod repository;
pub mod tickets;
pub mod types;

pub use admission::{serial_conflict, AdmissionEngine};
pub use config::{AdmissionConfig, SerialConflictPolicy, DEFAULT_CAPACITY_LIMIT, DEFAULT_PAGE_SIZE};
pub use desks::DeskService;
pub use environment::{Clock, SystemClock};
pub use error::{ErrorKind, HelpdeskError, ResourceRef, Result, StoreError};
pub use lifecycle::LifecycleManager;
pub use occupancy::OccupancyTracker;
pub use repository::{AssignmentRepository, DeskRepository, HelpdeskStore, TicketRepository};
pub use tickets::TicketService;
pub use types::{
    Assignment, AssignmentId, CreateTicketRequest, CustomerId, Desk, DeskId, EditDeskRequest,
    RegisterDeskRequest, Ticket, TicketChanges, TicketId, TicketStatus,
};
