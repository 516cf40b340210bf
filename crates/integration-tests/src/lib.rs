//! Integration tests for the lot costing engine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lot-costing-integration-tests
//! ```
//!
//! Each test builds a fresh in-memory `SQLite` database with the embedded
//! migrations applied, so tests are independent and need no setup. The
//! concurrency tests use [`TestContext::on_disk`] instead, so competing runs
//! hold separate connections to one database file.
//!
//! # Test Categories
//!
//! - `lot_store` - Lot receipt, FIFO ordering and stock listings
//! - `recipes` - Recipe registry
//! - `availability` - Shortage checks
//! - `production` - Cost previews, production runs and the batch ledger
//! - `concurrency` - Concurrent production against shared stock

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tempfile::TempDir;

use lot_costing_core::CostBasis;
use lot_costing_engine::models::{CreateLotInput, CreateRecipeLineInput, Lot, RecipeLine};
use lot_costing_engine::{Inventory, InventoryError, PricingPolicy, db};

/// A migrated database and the service over it.
pub struct TestContext {
    /// The service under test.
    pub inventory: Inventory,
    /// Holds the database file of an on-disk context until drop.
    _dir: Option<TempDir>,
}

impl TestContext {
    /// Create a context with the default pricing policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or migrated.
    pub async fn new() -> Result<Self, InventoryError> {
        Self::with_pricing(PricingPolicy::default()).await
    }

    /// Create a context with a specific pricing policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or migrated.
    pub async fn with_pricing(pricing: PricingPolicy) -> Result<Self, InventoryError> {
        // A single kept-alive connection holds the in-memory database.
        let pool = db::create_pool("sqlite::memory:", 1).await?;
        db::run_migrations(&pool).await?;
        Ok(Self {
            inventory: Inventory::new(pool, pricing),
            _dir: None,
        })
    }

    /// Create a context over a database file in a fresh temporary
    /// directory, pooled over up to `max_connections` connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created or
    /// migrated.
    pub async fn on_disk(max_connections: u32) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}", dir.path().join("inventory.db").display());
        let pool = db::create_pool(&url, max_connections).await?;
        db::run_migrations(&pool).await?;
        Ok(Self {
            inventory: Inventory::new(pool, PricingPolicy::default()),
            _dir: Some(dir),
        })
    }

    /// The underlying pool, for raw assertions.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        self.inventory.pool()
    }

    /// Receive a lot priced per unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the lot is rejected.
    pub async fn lot(
        &self,
        item: &str,
        quantity: Decimal,
        unit_cost: Decimal,
        entry_date: NaiveDate,
    ) -> Result<Lot, InventoryError> {
        self.inventory
            .add_lot(CreateLotInput {
                item: item.to_owned(),
                quantity,
                cost: unit_cost,
                cost_basis: CostBasis::PerUnit,
                entry_date,
            })
            .await
    }

    /// Add a recipe line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is rejected.
    pub async fn recipe_line(
        &self,
        product: &str,
        ingredient: &str,
        quantity_per_unit: Decimal,
    ) -> Result<RecipeLine, InventoryError> {
        self.inventory
            .add_recipe_line(CreateRecipeLineInput {
                product: product.to_owned(),
                ingredient: ingredient.to_owned(),
                quantity_per_unit,
            })
            .await
    }
}

/// Build a date in 2026.
///
/// # Panics
///
/// Panics if `month`/`day` do not form a valid date.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

/// Shorthand for `Decimal::from`.
#[must_use]
pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}
