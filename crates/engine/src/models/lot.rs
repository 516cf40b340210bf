//! Raw-material lot domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lot_costing_core::{CostBasis, KnownItemId, LotId, QuantityError, checked_mul};

/// A lot - one dated receipt of a raw material with its own unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Unique lot ID (also the insertion-order tiebreaker).
    pub id: LotId,
    /// Material name.
    pub item: String,
    /// Quantity still on hand. Always greater than zero while the lot exists.
    pub quantity: Decimal,
    /// Cost per unit, fixed when the lot was received.
    pub unit_cost: Decimal,
    /// Date the material was acquired.
    pub entry_date: NaiveDate,
    /// When the lot was recorded.
    pub created_at: DateTime<Utc>,
}

impl Lot {
    /// Value of the quantity still on hand.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfRange`] if the value is not representable.
    pub fn value(&self) -> Result<Decimal, QuantityError> {
        checked_mul("lot value", self.quantity, self.unit_cost)
    }
}

/// Input for receiving a new lot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLotInput {
    /// Material name.
    pub item: String,
    /// Quantity received.
    pub quantity: Decimal,
    /// Cost as entered, read according to `cost_basis`.
    pub cost: Decimal,
    /// Whether `cost` is per unit or for the whole lot.
    #[serde(default)]
    pub cost_basis: CostBasis,
    /// Date the material was acquired.
    pub entry_date: NaiveDate,
}

/// Filter criteria for listing lots.
#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    /// Substring match on the item name.
    pub item: Option<String>,
    /// Filter by start date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Filter by end date (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}

/// An item name that has been received at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownItem {
    /// Unique ID.
    pub id: KnownItemId,
    /// Item name.
    pub name: String,
    /// When the item was first received.
    pub created_at: DateTime<Utc>,
}

/// On-hand stock of one item across all of its lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Item name.
    pub item: String,
    /// Total quantity on hand.
    pub quantity: Decimal,
    /// Total value on hand at lot cost.
    pub value: Decimal,
    /// Number of open lots.
    pub lot_count: usize,
}
