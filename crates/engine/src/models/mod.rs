//! Domain models for the lot costing engine.
//!
//! # Models
//!
//! - `lot` - Raw-material lots, known items and stock summaries
//! - `recipe` - Recipe lines and aggregated ingredient requirements
//! - `production` - Production batches, consumption trace, shortages and cost previews

pub mod lot;
pub mod production;
pub mod recipe;

pub use lot::{CreateLotInput, KnownItem, Lot, LotFilter, StockLevel};
pub use production::{
    BatchConsumption, BatchFilter, CostPreview, CreateBatchInput, IngredientCost,
    ProductionBatch, ProductionOutcome, ProductionRequest, Shortage,
};
pub use recipe::{CreateRecipeLineInput, RecipeComponent, RecipeFilter, RecipeLine, Requirement};
