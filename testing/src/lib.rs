//! # Helpdesk Testing
//!
//! Testing utilities for the help desk engine.
//!
//! This crate provides:
//! - [`InMemoryHelpdeskStore`]: every store capability in memory
//! - [`FaultyStore`]: a wrapper that fails chosen operations
//! - [`FixedClock`] and [`test_clock`] for deterministic time
//! - Fixture builders and proptest strategies
//!
//! ## Example
//!
//! ```ignore
//! use helpdesk_testing::{fixtures, Harness};
//!
//! #[tokio::test]
//! async fn test_admission() {
//!     let harness = Harness::new();
//!     let desk = harness.desk("Ana").await;
//!     let ticket = harness
//!         .tickets
//!         .create_ticket(Some(fixtures::ticket_request("agent-1", 1, "SN-1", desk.id)))
//!         .await
//!         .unwrap();
//!     assert_eq!(ticket.desk.id, desk.id);
//! }
//! ```

use chrono::{DateTime, Utc};
use helpdesk_core::environment::Clock;

pub mod faulty;
pub mod memory;

/// Mock implementations of injected dependencies.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use helpdesk_testing::mocks::FixedClock;
    /// use helpdesk_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::from_timestamp(1_735_689_600, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }
}

/// Request builders and a wired-up service harness.
pub mod fixtures {
    use crate::memory::InMemoryHelpdeskStore;
    use crate::mocks::test_clock;
    use helpdesk_core::repository::{DeskRepository, HelpdeskStore};
    use helpdesk_core::types::{
        CreateTicketRequest, CustomerId, Desk, DeskId, Ticket, TicketChanges, TicketStatus,
    };
    use helpdesk_core::{AdmissionConfig, DeskService, TicketService};
    use std::sync::Arc;

    /// A well-formed admission request.
    #[must_use]
    pub fn ticket_request(
        agent: &str,
        customer_id: i64,
        serial_number: &str,
        desk_id: DeskId,
    ) -> CreateTicketRequest {
        CreateTicketRequest {
            agent: agent.to_string(),
            customer_id: CustomerId::new(customer_id),
            device_id: format!("device-{serial_number}"),
            serial_number: serial_number.to_string(),
            desk_id,
            reason: "screen flickers".to_string(),
            product: "notebook".to_string(),
            requesting_user: "front-office".to_string(),
        }
    }

    /// The ticket's current fields with a new status.
    #[must_use]
    pub fn status_change(ticket: &Ticket, status: TicketStatus) -> TicketChanges {
        TicketChanges {
            status,
            ..TicketChanges::from(ticket)
        }
    }

    /// Ticket and desk services over one store and a fixed clock.
    #[derive(Clone)]
    pub struct Harness<S = InMemoryHelpdeskStore> {
        /// Shared store.
        pub store: S,
        /// Ticket operations.
        pub tickets: TicketService<S>,
        /// Desk operations.
        pub desks: DeskService<S>,
    }

    impl Harness<InMemoryHelpdeskStore> {
        /// In-memory store with the default configuration.
        #[must_use]
        pub fn new() -> Self {
            Self::with_store(InMemoryHelpdeskStore::new(), AdmissionConfig::default())
        }

        /// In-memory store with a custom configuration.
        #[must_use]
        pub fn with_config(config: AdmissionConfig) -> Self {
            Self::with_store(InMemoryHelpdeskStore::new(), config)
        }
    }

    impl Default for Harness<InMemoryHelpdeskStore> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<S: HelpdeskStore> Harness<S> {
        /// Any store with the given configuration.
        #[must_use]
        pub fn with_store(store: S, config: AdmissionConfig) -> Self {
            Self {
                tickets: TicketService::new(store.clone(), Arc::new(test_clock()), config),
                desks: DeskService::new(store.clone()),
                store,
            }
        }

        /// Persist a desk directly, bypassing registration checks.
        ///
        /// # Panics
        ///
        /// Panics if the store rejects the write.
        #[allow(clippy::expect_used)]
        pub async fn desk(&self, attendant_name: &str) -> Desk {
            DeskRepository::save(&self.store, Desk::new(attendant_name))
                .await
                .expect("desk fixture should persist")
        }
    }
}

/// Property-based testing strategies.
pub mod properties {
    use helpdesk_core::types::{CreateTicketRequest, CustomerId, DeskId, TicketStatus};
    use proptest::prelude::*;

    /// Any ticket status.
    pub fn status() -> impl Strategy<Value = TicketStatus> {
        prop_oneof![
            Just(TicketStatus::Open),
            Just(TicketStatus::InProgress),
            Just(TicketStatus::Resolved),
            Just(TicketStatus::Closed),
        ]
    }

    /// A request for `desk_id` drawn from small pools of agents, customers,
    /// and serials so collisions are common.
    pub fn ticket_request(desk_id: DeskId) -> impl Strategy<Value = CreateTicketRequest> {
        (0..4_u8, 1..4_i64, 0..4_u8).prop_map(move |(agent, customer, serial)| {
            CreateTicketRequest {
                agent: format!("agent-{agent}"),
                customer_id: CustomerId::new(customer),
                device_id: format!("device-{serial}"),
                serial_number: format!("SN-{serial}"),
                desk_id,
                reason: String::new(),
                product: String::new(),
                requesting_user: String::new(),
            }
        })
    }
}

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use faulty::{Fault, FaultyStore};
pub use fixtures::Harness;
pub use memory::InMemoryHelpdeskStore;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
