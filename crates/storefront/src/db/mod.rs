//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `store_user` - Accounts, roles, and password-reset token fields
//! - `product` - Catalog, including the derived rating/stock fields
//! - `product_photo` - Resolved media references per product
//! - `review` - Product reviews, one row per (product, reviewer)
//! - `store_order` / `store_order_item` - Orders and their lines
//! - `tower_sessions.session` - Session storage
//!
//! Dynamic catalog queries are rendered from the core query descriptor via
//! [`query`]; everything else uses the runtime sqlx API with bound
//! parameters.
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p loomline-cli -- migrate
//! ```

pub mod orders;
pub mod products;
pub mod query;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a lost update detected
    /// by the optimistic version check.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The request asked for a state change the data cannot satisfy
    /// (stock underflow, backwards status transition).
    #[error("invalid operation: {0}")]
    Invalid(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
