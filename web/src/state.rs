//! Application state for Axum handlers.

use helpdesk_core::environment::Clock;
use helpdesk_core::{AdmissionConfig, DeskService, HelpdeskStore, TicketService};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloning is cheap: the services share the store and the occupancy tracker.
#[derive(Clone)]
pub struct AppState<S> {
    /// Ticket operations.
    pub tickets: TicketService<S>,
    /// Desk operations.
    pub desks: DeskService<S>,
}

impl<S: HelpdeskStore> AppState<S> {
    /// Wire both services over one store.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, config: AdmissionConfig) -> Self {
        Self {
            tickets: TicketService::new(store.clone(), clock, config),
            desks: DeskService::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_testing::{InMemoryHelpdeskStore, test_clock};

    #[test]
    fn test_state_is_clone() {
        // Ensure AppState implements Clone (required for Axum)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState<InMemoryHelpdeskStore>>();
    }

    #[test]
    fn test_state_carries_config() {
        let state = AppState::new(
            InMemoryHelpdeskStore::new(),
            Arc::new(test_clock()),
            AdmissionConfig::new().with_capacity_limit(3),
        );
        assert_eq!(state.tickets.config().capacity_limit, 3);
    }
}
