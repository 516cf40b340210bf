//! Recipe domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lot_costing_core::RecipeLineId;

/// One ingredient requirement of a finished good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    /// Unique line ID.
    pub id: RecipeLineId,
    /// Finished-good name, as entered.
    pub product: String,
    /// Raw-material name consumed from the lot store.
    pub ingredient: String,
    /// Quantity of the ingredient needed per unit produced.
    pub quantity_per_unit: Decimal,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
}

/// Input for adding a recipe line.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipeLineInput {
    /// Finished-good name.
    pub product: String,
    /// Raw-material name.
    pub ingredient: String,
    /// Quantity needed per unit produced.
    pub quantity_per_unit: Decimal,
}

/// An ingredient entry when replacing a whole recipe at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeComponent {
    /// Raw-material name.
    pub ingredient: String,
    /// Quantity needed per unit produced.
    pub quantity_per_unit: Decimal,
}

/// Filter criteria for listing recipe lines.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Substring match on the product name.
    pub product: Option<String>,
}

/// Total quantity of one ingredient needed for a production run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Raw-material name.
    pub ingredient: String,
    /// Quantity needed for the whole run.
    pub quantity: Decimal,
}
