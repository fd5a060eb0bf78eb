//! Ticket endpoints.

use super::body_or_none;
use crate::state::AppState;
use crate::WebResult;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use helpdesk_core::{
    CreateTicketRequest, CustomerId, DEFAULT_PAGE_SIZE, HelpdeskStore, Ticket, TicketChanges,
    TicketId,
};
use serde::Deserialize;

/// Paging parameters for `GET /api/tickets`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Zero-based page index. Defaults to 0.
    pub page: Option<u32>,
    /// Page size. Defaults to 10.
    pub page_size: Option<u32>,
}

/// `POST /api/tickets`
///
/// # Errors
///
/// Any admission rejection, mapped to its status code.
pub async fn create_ticket<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<Ticket>)> {
    let ticket = state.tickets.create_ticket(body_or_none(body)).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// `GET /api/tickets?page=&pageSize=`
///
/// # Errors
///
/// `400` for a zero page size, `500` if the store fails.
pub async fn list_tickets<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<PageParams>,
) -> WebResult<Json<Vec<Ticket>>> {
    let page = params.page.unwrap_or(0);
    let size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    Ok(Json(state.tickets.list_tickets(page, size).await?))
}

/// `GET /api/tickets/:id`
///
/// # Errors
///
/// `404` if the ticket does not exist.
pub async fn ticket_details<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> WebResult<Json<Ticket>> {
    Ok(Json(state.tickets.ticket_details(TicketId::new(id)).await?))
}

/// `PUT /api/tickets/:id`
///
/// # Errors
///
/// `400` for an unreadable body, `404` for an unknown ticket, `422` when the
/// desk queue is already empty.
pub async fn edit_ticket<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    body: Result<Json<TicketChanges>, JsonRejection>,
) -> WebResult<Json<Ticket>> {
    let ticket = state
        .tickets
        .edit_ticket(TicketId::new(id), body_or_none(body))
        .await?;
    Ok(Json(ticket))
}

/// `GET /api/customers/:id/tickets`
///
/// # Errors
///
/// `404` if the customer has no tickets.
pub async fn tickets_for_customer<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    Path(customer_id): Path<i64>,
) -> WebResult<Json<Vec<Ticket>>> {
    let tickets = state
        .tickets
        .list_tickets_by_customer(CustomerId::new(customer_id))
        .await?;
    Ok(Json(tickets))
}
