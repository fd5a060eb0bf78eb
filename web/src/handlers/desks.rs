//! Desk endpoints.

use super::body_or_none;
use crate::state::AppState;
use crate::WebResult;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use helpdesk_core::{CustomerId, Desk, DeskId, EditDeskRequest, HelpdeskStore, RegisterDeskRequest};

/// `POST /api/desks`
///
/// # Errors
///
/// `400` for a blank attendant, `409` if the attendant already has a desk.
pub async fn register_desk<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<RegisterDeskRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<Desk>)> {
    let desk = state.desks.register_desk(body_or_none(body)).await?;
    Ok((StatusCode::CREATED, Json(desk)))
}

/// `GET /api/desks`
///
/// # Errors
///
/// `500` if the store fails.
pub async fn list_desks<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
) -> WebResult<Json<Vec<Desk>>> {
    Ok(Json(state.desks.list_desks().await?))
}

/// `PUT /api/desks/:id`
///
/// # Errors
///
/// `400` when the body is unreadable or names another desk, `404` for an
/// unknown desk.
pub async fn edit_desk<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    body: Result<Json<EditDeskRequest>, JsonRejection>,
) -> WebResult<Json<Desk>> {
    let desk = state
        .desks
        .edit_desk(body_or_none(body), DeskId::new(id))
        .await?;
    Ok(Json(desk))
}

/// `GET /api/customers/:id/desks`
///
/// # Errors
///
/// `500` if the store fails.
pub async fn desks_for_customer<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
    Path(customer_id): Path<i64>,
) -> WebResult<Json<Vec<Desk>>> {
    let desks = state
        .desks
        .desks_for_customer(CustomerId::new(customer_id))
        .await?;
    Ok(Json(desks))
}
