//! Database operations for the lot costing engine.
//!
//! # Database: `SQLite`
//!
//! ## Tables
//!
//! - `known_items` - Every item name ever received
//! - `lots` - Raw-material lots with remaining quantity and unit cost
//! - `recipe_lines` - Per-unit ingredient requirements of finished goods
//! - `production_batches` - Finished-goods ledger
//! - `batch_consumption` - Lot quantities drawn by each batch
//!
//! Repositories borrow a `&mut SqliteConnection`, so the same code runs
//! against a pooled connection or inside a transaction (`&mut *tx`).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/engine/migrations/` and run via:
//! ```bash
//! lotcost migrate
//! ```

pub mod batches;
pub mod items;
pub mod lots;
pub mod recipes;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use lot_costing_core::QuantityError;

pub use batches::BatchRepository;
pub use items::KnownItemRepository;
pub use lots::LotRepository;
pub use recipes::RecipeRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The row changed underneath the operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An amount derived from stored rows is not representable.
    #[error("amount out of range: {0}")]
    OutOfRange(#[from] QuantityError),
}

/// Create a `SQLite` connection pool.
///
/// The database file is created if missing. Connections use WAL journaling,
/// a busy timeout, and enforce foreign keys.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    // In-memory databases vanish with their last connection.
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), RepositoryError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Parse a decimal column stored as TEXT.
pub(crate) fn decimal_column(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("{column} {raw:?}: {e}")))
}
