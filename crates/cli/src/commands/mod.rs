//! Command implementations.
//!
//! # Commands
//!
//! - `migrate` - Schema migrations
//! - `lot` - Lot receipt and stock listings
//! - `recipe` - Recipe line management
//! - `seed` - Recipe seeding from YAML
//! - `production` - Availability checks, cost previews and production runs
//! - `batch` - Production ledger

pub mod batch;
pub mod lot;
pub mod migrate;
pub mod production;
pub mod recipe;
pub mod seed;

use serde::Serialize;
use tracing::debug;

use lot_costing_engine::db::{self, RepositoryError};
use lot_costing_engine::{EngineConfig, Inventory};

/// Where command results are written.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// Print JSON instead of plain text.
    pub json: bool,
}

impl Output {
    /// Print `value` as pretty JSON, or as the lines produced by `render`.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if `value` cannot be serialized.
    #[allow(clippy::print_stdout)]
    pub fn emit<T, F>(self, value: &T, render: F) -> Result<(), serde_json::Error>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> Vec<String>,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            for line in render(value) {
                println!("{line}");
            }
        }
        Ok(())
    }
}

/// Open the configured database and build the inventory service.
///
/// Migrations are not applied here; run `lotcost migrate` first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the database cannot be opened.
pub async fn connect(config: &EngineConfig) -> Result<Inventory, RepositoryError> {
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    debug!(max_connections = config.max_connections, "Database pool created");
    Ok(Inventory::new(pool, config.pricing))
}
