//! Business logic services for the lot costing engine.
//!
//! # Services
//!
//! - `inventory` - The [`Inventory`] service: lot receipt, recipe and batch management
//! - `availability` - Ingredient requirement aggregation and shortage checks
//! - `production` - FIFO cost previews and production runs

pub mod availability;
pub mod inventory;
pub mod production;

pub use availability::requirements;
pub use inventory::Inventory;
