//! Lot Costing Engine.
//!
//! Tracks raw materials received in dated lots, each with its own unit cost,
//! and produces finished goods from recipes by consuming the oldest lots
//! first. Every production run records its exact material cost, a unit cost,
//! and a suggested sale price.
//!
//! # Architecture
//!
//! - [`fifo`] - Pure FIFO consumption planner
//! - [`pricing`] - Suggested price and cost rounding policy
//! - [`db`] - `SQLite` repositories (lots, known items, recipes, batches)
//! - [`services`] - The [`Inventory`] service tying them together
//! - [`config`] - Environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use lot_costing_engine::{EngineConfig, Inventory, db};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::from_env()?;
//! let pool = db::create_pool(&config.database_url, config.max_connections).await?;
//! db::run_migrations(&pool).await?;
//! let inventory = Inventory::new(pool, config.pricing);
//!
//! let shortages = inventory
//!     .check_availability("bread", rust_decimal::Decimal::from(10))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod fifo;
pub mod models;
pub mod pricing;
pub mod services;

pub use config::{ConfigError, EngineConfig, LogFormat};
pub use error::InventoryError;
pub use fifo::{ConsumptionPlan, LotDraw};
pub use pricing::{DEFAULT_COST_RATIO, PricingError, PricingPolicy, Quote};
pub use services::Inventory;
