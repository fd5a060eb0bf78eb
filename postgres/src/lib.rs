//! `PostgreSQL` storage for the help desk engine.
//!
//! [`PostgresHelpdeskStore`] implements the desk, ticket, and assignment
//! capabilities from `helpdesk-core` over a single connection pool:
//!
//! - Desks, tickets, and assignments in three tables
//! - Bundled migrations via [`PostgresHelpdeskStore::migrate`]
//! - Connection pooling
//!
//! # Example
//!
//! ```ignore
//! use helpdesk_postgres::PostgresHelpdeskStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresHelpdeskStore::connect("postgres://localhost/helpdesk", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;

pub use store::PostgresHelpdeskStore;
