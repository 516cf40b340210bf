//! Production batch domain models for cost tracking.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lot_costing_core::{BatchConsumptionId, LotId, ProductionBatchId};

/// A production batch - one recorded run of finished-good output.
///
/// Cost fields are written once when the batch is produced; only
/// `sale_price` can change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionBatch {
    /// Unique batch ID.
    pub id: ProductionBatchId,
    /// Finished-good name, as requested.
    pub product: String,
    /// Number of units produced.
    pub quantity_produced: Decimal,
    /// Material cost per unit (6 decimal places).
    pub unit_cost: Decimal,
    /// Material cost of the whole batch (2 decimal places).
    pub total_cost: Decimal,
    /// Price suggested by the pricing policy at production time.
    pub suggested_price: Decimal,
    /// Price the batch is sold at.
    pub sale_price: Decimal,
    /// Production date.
    pub produced_on: NaiveDate,
    /// When the batch was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a production batch.
#[derive(Debug, Clone)]
pub struct CreateBatchInput {
    /// Finished-good name.
    pub product: String,
    /// Number of units produced.
    pub quantity_produced: Decimal,
    /// Material cost per unit.
    pub unit_cost: Decimal,
    /// Material cost of the whole batch.
    pub total_cost: Decimal,
    /// Suggested sale price.
    pub suggested_price: Decimal,
    /// Sale price.
    pub sale_price: Decimal,
    /// Production date.
    pub produced_on: NaiveDate,
}

/// Quantity drawn from one lot by a production batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConsumption {
    /// Unique record ID.
    pub id: BatchConsumptionId,
    /// Batch that consumed the material.
    pub batch_id: ProductionBatchId,
    /// Lot the material came from. The lot may no longer exist.
    pub lot_id: LotId,
    /// Material name.
    pub item: String,
    /// Quantity taken from the lot.
    pub quantity: Decimal,
    /// Unit cost of the lot.
    pub unit_cost: Decimal,
    /// `quantity * unit_cost`, unrounded.
    pub cost: Decimal,
}

/// Amount by which stock of an ingredient falls short of a run's needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    /// Raw-material name.
    pub ingredient: String,
    /// Missing quantity, rounded to 2 decimal places.
    pub shortfall: Decimal,
}

/// A request to produce a finished good.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductionRequest {
    /// Finished-good name (matched case-insensitively against recipes).
    pub product: String,
    /// Number of units to produce.
    pub quantity: Decimal,
    /// Sale price to record on the batch. Defaults to zero.
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    /// Production date. Defaults to today (UTC).
    #[serde(default)]
    pub produced_on: Option<NaiveDate>,
}

impl ProductionRequest {
    /// Request `quantity` units of `product` with no sale price, dated today.
    #[must_use]
    pub fn new(product: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            product: product.into(),
            quantity,
            sale_price: None,
            produced_on: None,
        }
    }
}

/// Result of a production request.
///
/// Running short of stock is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProductionOutcome {
    /// The batch was produced and recorded.
    Produced(ProductionBatch),
    /// Nothing was changed; these ingredients are short.
    Short(Vec<Shortage>),
}

impl ProductionOutcome {
    /// The recorded batch, if production went ahead.
    #[must_use]
    pub const fn batch(&self) -> Option<&ProductionBatch> {
        match self {
            Self::Produced(batch) => Some(batch),
            Self::Short(_) => None,
        }
    }

    /// The shortages, if production was refused.
    #[must_use]
    pub fn shortages(&self) -> &[Shortage] {
        match self {
            Self::Produced(_) => &[],
            Self::Short(shortages) => shortages,
        }
    }
}

/// Cost contribution of one ingredient to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientCost {
    /// Raw-material name.
    pub ingredient: String,
    /// Quantity the run needs.
    pub required: Decimal,
    /// Quantity the FIFO walk would draw (less than `required` when short).
    pub consumed: Decimal,
    /// Cost of the drawn quantity, unrounded.
    pub cost: Decimal,
}

/// Cost quote for a run, computed without touching stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPreview {
    /// Finished-good name, as requested.
    pub product: String,
    /// Number of units quoted.
    pub quantity: Decimal,
    /// Material cost per unit (6 decimal places).
    pub unit_cost: Decimal,
    /// Material cost of the run (2 decimal places).
    pub total_cost: Decimal,
    /// Suggested sale price for the run.
    pub suggested_price: Decimal,
    /// Per-ingredient breakdown.
    pub ingredients: Vec<IngredientCost>,
    /// Ingredients that are short. When non-empty the quote only covers the
    /// stock that is actually available.
    pub shortages: Vec<Shortage>,
}

/// Filter criteria for listing batches.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    /// Substring match on the product name.
    pub product: Option<String>,
    /// Filter by start date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Filter by end date (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}
