//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! lotcost migrate
//! ```
//!
//! # Environment Variables
//!
//! - `LOTCOST_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`, then `sqlite://lotcost.db?mode=rwc`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/engine/migrations/` and are embedded in the
//! binary.

use tracing::info;

use lot_costing_engine::Inventory;
use lot_costing_engine::db::{self, RepositoryError};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails.
pub async fn run(inventory: &Inventory) -> Result<(), RepositoryError> {
    info!("Running migrations...");
    db::run_migrations(inventory.pool()).await?;
    info!(
        available = db::MIGRATOR.iter().count(),
        "Migrations complete"
    );
    Ok(())
}
