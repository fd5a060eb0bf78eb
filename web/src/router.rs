//! Route table.

use crate::handlers::{desks, health, tickets};
use crate::state::AppState;
use axum::routing::{get, put};
use axum::Router;
use helpdesk_core::HelpdeskStore;
use tower_http::trace::TraceLayer;

/// Build the API router over the given state.
///
/// ```text
/// GET  /health                    liveness
/// GET  /health/ready              store readiness
/// POST /api/tickets               admit a ticket
/// GET  /api/tickets               page through tickets
/// GET  /api/tickets/:id           ticket details
/// PUT  /api/tickets/:id           edit a ticket
/// GET  /api/customers/:id/tickets tickets for a customer
/// GET  /api/customers/:id/desks   desks that served a customer
/// POST /api/desks                 register a desk
/// GET  /api/desks                 list desks
/// PUT  /api/desks/:id             edit a desk
/// ```
pub fn router<S: HelpdeskStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>))
        .route(
            "/api/tickets",
            get(tickets::list_tickets::<S>).post(tickets::create_ticket::<S>),
        )
        .route(
            "/api/tickets/:id",
            get(tickets::ticket_details::<S>).put(tickets::edit_ticket::<S>),
        )
        .route(
            "/api/customers/:id/tickets",
            get(tickets::tickets_for_customer::<S>),
        )
        .route("/api/customers/:id/desks", get(desks::desks_for_customer::<S>))
        .route(
            "/api/desks",
            get(desks::list_desks::<S>).post(desks::register_desk::<S>),
        )
        .route("/api/desks/:id", put(desks::edit_desk::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
