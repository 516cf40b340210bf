//! Decimal money helpers.
//!
//! All costs are plain [`Decimal`] amounts in a single, implicit currency.
//! Two precisions are in play:
//!
//! - unit costs keep 6 decimal places so that dividing a lot total by its
//!   quantity does not lose meaningful precision
//! - totals and prices are rounded to 2 decimal places
//!
//! Rounding is half away from zero throughout.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::quantity::{QuantityError, non_negative, positive};

/// Decimal places kept on unit costs.
pub const UNIT_COST_DECIMAL_PLACES: u32 = 6;

/// Decimal places kept on totals and prices.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// How the cost supplied with a received lot should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// The cost is the price of a single unit.
    #[default]
    PerUnit,
    /// The cost is the price paid for the whole lot.
    LotTotal,
}

impl CostBasis {
    /// Build from the "is total cost" flag used by data-entry forms.
    #[must_use]
    pub const fn from_total_flag(is_total_cost: bool) -> Self {
        if is_total_cost {
            Self::LotTotal
        } else {
            Self::PerUnit
        }
    }
}

/// Round a total or price to cents.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a unit cost to its stored precision.
#[must_use]
pub fn round_unit_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        UNIT_COST_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Derive the stored unit cost of a lot from the cost entered for it.
///
/// # Errors
///
/// Returns [`QuantityError`] if `quantity` is not positive, `cost` is
/// negative, or the division overflows.
///
/// # Examples
///
/// ```
/// use lot_costing_core::{CostBasis, unit_cost_from};
/// use rust_decimal::Decimal;
///
/// let from_total = unit_cost_from(Decimal::from(50), Decimal::from(10), CostBasis::LotTotal).unwrap();
/// let per_unit = unit_cost_from(Decimal::from(5), Decimal::from(10), CostBasis::PerUnit).unwrap();
/// assert_eq!(from_total, per_unit);
/// ```
pub fn unit_cost_from(
    cost: Decimal,
    quantity: Decimal,
    basis: CostBasis,
) -> Result<Decimal, QuantityError> {
    let quantity = positive("quantity", quantity)?;
    let cost = non_negative("cost", cost)?;

    let unit_cost = match basis {
        CostBasis::PerUnit => cost,
        CostBasis::LotTotal => cost
            .checked_div(quantity)
            .ok_or(QuantityError::OutOfRange { field: "cost" })?,
    };

    Ok(round_unit_cost(unit_cost))
}
