//! Axum HTTP layer for the help desk engine.
//!
//! Handlers parse requests, call the core services, and map
//! [`HelpdeskError`](helpdesk_core::HelpdeskError) kinds to status codes.
//! No business rule lives here.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the path, query, and JSON body
//! 3. **Call** the ticket or desk service
//! 4. **Map result** to an HTTP response
//!
//! # Example
//!
//! ```ignore
//! use helpdesk_web::{router, AppState};
//!
//! let state = AppState::new(store, Arc::new(SystemClock), AdmissionConfig::default());
//! let app = router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::{AppError, ErrorResponse};
pub use router::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
