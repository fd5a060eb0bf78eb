//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod desks;
pub mod health;
pub mod tickets;

use axum::extract::rejection::JsonRejection;
use axum::Json;

// Re-export common handler utilities
pub use health::{health_check, readiness_check};

/// Turn a body that failed to parse into an absent request.
///
/// The core answers absent requests with `InvalidInput`, so malformed JSON
/// and missing bodies share one error path.
pub(crate) fn body_or_none<T>(body: Result<Json<T>, JsonRejection>) -> Option<T> {
    match body {
        Ok(Json(value)) => Some(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request body rejected");
            None
        }
    }
}
