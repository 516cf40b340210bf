//! Suggested sale price and batch cost derivation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lot_costing_core::{QuantityError, positive, round_money, round_unit_cost};

/// Default share of the sale price taken by material cost (70%).
pub const DEFAULT_COST_RATIO: Decimal = Decimal::from_parts(7, 0, 0, false, 1);

/// Errors building a [`PricingPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The cost ratio must satisfy `0 < ratio <= 1`.
    #[error("cost ratio must be greater than 0 and at most 1 (got {0})")]
    InvalidCostRatio(Decimal),
}

/// Rule for deriving a suggested sale price from a material cost.
///
/// The suggested price is the cost divided by the ratio of the price that
/// material cost is meant to represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    cost_ratio: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            cost_ratio: DEFAULT_COST_RATIO,
        }
    }
}

impl PricingPolicy {
    /// Create a policy with the given cost ratio.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidCostRatio`] unless `0 < ratio <= 1`.
    pub fn new(cost_ratio: Decimal) -> Result<Self, PricingError> {
        if cost_ratio <= Decimal::ZERO || cost_ratio > Decimal::ONE {
            return Err(PricingError::InvalidCostRatio(cost_ratio));
        }
        Ok(Self { cost_ratio })
    }

    /// The configured cost ratio.
    #[must_use]
    pub const fn cost_ratio(&self) -> Decimal {
        self.cost_ratio
    }

    /// Suggested price for a (rounded) total cost.
    ///
    /// Zero or negative totals suggest a price of zero.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfRange`] if the price is not representable.
    pub fn suggested_price(&self, total_cost: Decimal) -> Result<Decimal, QuantityError> {
        if total_cost <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        total_cost
            .checked_div(self.cost_ratio)
            .map(round_money)
            .ok_or(QuantityError::OutOfRange {
                field: "suggested price",
            })
    }

    /// Derive the stored cost figures for a run of `quantity` units whose
    /// materials cost `raw_total`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for a non-positive `quantity`
    /// and [`QuantityError::OutOfRange`] if a figure is not representable.
    pub fn quote(&self, raw_total: Decimal, quantity: Decimal) -> Result<Quote, QuantityError> {
        let quantity = positive("quantity", quantity)?;
        let total_cost = round_money(raw_total);
        let unit_cost = raw_total
            .checked_div(quantity)
            .map(round_unit_cost)
            .ok_or(QuantityError::OutOfRange { field: "unit cost" })?;

        Ok(Quote {
            unit_cost,
            total_cost,
            suggested_price: self.suggested_price(total_cost)?,
        })
    }
}

/// Cost figures for a production run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// Cost per unit, 6 decimal places.
    pub unit_cost: Decimal,
    /// Total cost, 2 decimal places.
    pub total_cost: Decimal,
    /// Suggested sale price, 2 decimal places.
    pub suggested_price: Decimal,
}
