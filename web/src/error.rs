//! Error types for web handlers.
//!
//! Bridges [`HelpdeskError`] to HTTP responses through Axum's
//! `IntoResponse` trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use helpdesk_core::{ErrorKind, HelpdeskError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<S>>) -> Result<Json<Ticket>, AppError> {
///     let ticket = state.tickets.ticket_details(id).await?;
///     Ok(Json(ticket))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Path of the resource the error refers to
    uri: Option<String>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            uri: None,
            source: None,
        }
    }

    /// Attach the path of the resource the error refers to.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            ErrorKind::InvalidInput.as_str().to_string(),
        )
    }

    /// HTTP status code of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Status code for each error kind.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::AgentBusy | ErrorKind::DuplicateAttendant => {
            StatusCode::CONFLICT
        }
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::DeskFull => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error code (for client error handling).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Path of the conflicting resource, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() && self.status != StatusCode::SERVICE_UNAVAILABLE {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            uri: self.uri,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<HelpdeskError> for AppError {
    fn from(err: HelpdeskError) -> Self {
        let kind = err.kind();
        let uri = err.resource().map(helpdesk_core::ResourceRef::uri);
        let status = status_for(kind);

        let app = if kind == ErrorKind::Storage {
            Self::new(
                status,
                "An internal error occurred".to_string(),
                kind.as_str().to_string(),
            )
            .with_source(anyhow::Error::new(err))
        } else {
            Self::new(status, err.to_string(), kind.as_str().to_string())
        };
        match uri {
            Some(uri) => app.with_uri(uri),
            None => app,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::{DeskId, ResourceRef, StoreError, TicketId};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[INVALID_INPUT] Invalid input");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_keeps_ticket_uri() {
        let err = AppError::from(HelpdeskError::Conflict {
            message: "a ticket already exists for serial SN-1".to_string(),
            resource: ResourceRef::Ticket(TicketId::new(4)),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(err.uri.as_deref(), Some("/api/tickets/4"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (HelpdeskError::InvalidInput("x".to_string()), StatusCode::BAD_REQUEST),
            (HelpdeskError::DeskNotFound(DeskId::new(1)), StatusCode::NOT_FOUND),
            (
                HelpdeskError::DeskFull {
                    desk_id: DeskId::new(1),
                    limit: 5,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                HelpdeskError::AgentBusy {
                    agent: "a".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (HelpdeskError::DuplicateAttendant("Ana".to_string()), StatusCode::CONFLICT),
            (HelpdeskError::InvalidState("x".to_string()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                HelpdeskError::Forbidden {
                    message: "x".to_string(),
                    resource: ResourceRef::Ticket(TicketId::new(1)),
                },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_storage_message_is_not_leaked() {
        let err = AppError::from(HelpdeskError::Storage(StoreError::Database(
            "password authentication failed".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred");
        assert!(std::error::Error::source(&err).is_some());
    }
}
