//! # Salesapp Database Crate
//!
//! This crate is the only place in the application that speaks SQL. It owns the
//! schema, the one-time bootstrap that creates it, the CSV seed loader, and the
//! repository every HTTP handler goes through.
//!
//! ## Architectural Principles
//!
//! - **Raw, parameterized SQL:** every value that reaches a statement is bound
//!   positionally. The only identifier ever spliced into SQL text is the
//!   configured database name, and it is validated and quoted first.
//! - **Asynchronous & Pooled:** all operations are asynchronous and share one
//!   `PgPool` that the binary creates at startup and closes at shutdown.
//! - **No transactions:** each operation is a single statement.
//!
//! ## Public API
//!
//! - `connect` / `connect_admin`: the shared pool and the short-lived maintenance connection.
//! - `bootstrap::run`: ensures the database exists, creates the tables, and seeds them.
//! - `DbRepository`: queries and inserts used by the web server.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod bootstrap;
pub mod connection;
pub mod error;
pub mod repository;
pub mod seed;

// Re-export the key components to create a clean, public-facing API.
pub use bootstrap::BootstrapReport;
pub use connection::{connect, connect_admin, connect_options};
pub use error::DbError;
pub use repository::DbRepository;
pub use seed::{SeedReport, TableReport};
