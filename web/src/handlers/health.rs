//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use helpdesk_core::HelpdeskStore;
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check the store.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report.
#[derive(Debug, Serialize)]
pub struct Readiness {
    /// Checked component.
    pub component: &'static str,
    /// `ready` or `unavailable`.
    pub status: &'static str,
}

/// Health check that reads from the store (for readiness).
///
/// # Status Codes
///
/// - 200 OK: the store answered
/// - 503 Service Unavailable: the store failed
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
pub async fn readiness_check<S: HelpdeskStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<Readiness>) {
    match state.desks.list_desks().await {
        Ok(_) => (
            StatusCode::OK,
            Json(Readiness {
                component: "store",
                status: "ready",
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    component: "store",
                    status: "unavailable",
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
