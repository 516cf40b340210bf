//! FIFO consumption planning.
//!
//! [`plan`] walks an item's lots oldest first and works out how much to take
//! from each one. It touches nothing: the same plan backs cost previews,
//! availability-safe production, and the actual lot mutation applied by
//! [`LotRepository::apply_plan`](crate::db::LotRepository::apply_plan).
//!
//! Lot order is `(entry_date, id)` ascending. Lots received on the same date
//! are drawn in insertion order.

use rust_decimal::Decimal;
use serde::Serialize;

use lot_costing_core::{LotId, QuantityError, checked_mul, checked_sum};

use crate::models::Lot;

/// Quantity drawn from a single lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotDraw {
    /// Lot being drawn from.
    pub lot_id: LotId,
    /// Quantity taken from the lot.
    pub taken: Decimal,
    /// Quantity left in the lot afterwards.
    pub remaining: Decimal,
    /// Unit cost of the lot.
    pub unit_cost: Decimal,
}

impl LotDraw {
    /// Cost of the quantity taken, unrounded.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfRange`] if the cost is not representable.
    pub fn cost(&self) -> Result<Decimal, QuantityError> {
        checked_mul("lot draw cost", self.taken, self.unit_cost)
    }

    /// Whether the draw empties the lot.
    #[must_use]
    pub fn exhausts(&self) -> bool {
        self.remaining.is_zero()
    }
}

/// The draws needed to take a quantity of one item from stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumptionPlan {
    /// Item being consumed.
    pub item: String,
    /// Quantity asked for.
    pub required: Decimal,
    /// Draws in FIFO order.
    pub draws: Vec<LotDraw>,
    /// Quantity that stock could not cover. Zero when satisfied.
    pub unsatisfied: Decimal,
}

impl ConsumptionPlan {
    /// Total quantity drawn across all lots.
    #[must_use]
    pub fn consumed(&self) -> Decimal {
        self.draws.iter().map(|draw| draw.taken).sum()
    }

    /// Total cost of all draws, unrounded.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfRange`] if a draw cost or the total is
    /// not representable.
    pub fn cost(&self) -> Result<Decimal, QuantityError> {
        let costs = self
            .draws
            .iter()
            .map(LotDraw::cost)
            .collect::<Result<Vec<_>, _>>()?;
        checked_sum("ingredient cost", costs)
    }

    /// Whether stock covers the full requirement.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied.is_zero()
    }
}

/// Plan the FIFO consumption of `required` units of `item`.
///
/// `lots` must be the item's open lots in `(entry_date, id)` order, as
/// returned by [`LotRepository::lots_for`](crate::db::LotRepository::lots_for).
/// Lots for other items are skipped. If stock runs out the plan draws
/// everything it can and records the remainder in
/// [`ConsumptionPlan::unsatisfied`].
///
/// A non-positive `required` produces an empty, satisfied plan.
#[must_use]
pub fn plan(item: &str, lots: &[Lot], required: Decimal) -> ConsumptionPlan {
    let mut outstanding = required.max(Decimal::ZERO);
    let mut draws = Vec::new();

    for lot in lots.iter().filter(|lot| lot.item == item) {
        if outstanding.is_zero() {
            break;
        }
        if lot.quantity <= Decimal::ZERO {
            continue;
        }

        let taken = outstanding.min(lot.quantity);
        outstanding -= taken;
        draws.push(LotDraw {
            lot_id: lot.id,
            taken,
            remaining: lot.quantity - taken,
            unit_cost: lot.unit_cost,
        });
    }

    ConsumptionPlan {
        item: item.to_owned(),
        required,
        draws,
        unsatisfied: outstanding,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn lot(id: i64, item: &str, quantity: i64, unit_cost: i64, day: u32) -> Lot {
        Lot {
            id: LotId::new(id),
            item: item.to_owned(),
            quantity: Decimal::from(quantity),
            unit_cost: Decimal::from(unit_cost),
            entry_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_draws_oldest_lot_first() {
        let lots = vec![lot(1, "flour", 5, 2, 1), lot(2, "flour", 5, 3, 2)];

        let plan = plan("flour", &lots, Decimal::from(7));

        assert!(plan.is_satisfied());
        assert_eq!(plan.draws.len(), 2);
        assert_eq!(plan.draws[0].lot_id, LotId::new(1));
        assert_eq!(plan.draws[0].taken, Decimal::from(5));
        assert!(plan.draws[0].exhausts());
        assert_eq!(plan.draws[1].lot_id, LotId::new(2));
        assert_eq!(plan.draws[1].taken, Decimal::from(2));
        assert_eq!(plan.draws[1].remaining, Decimal::from(3));
        assert_eq!(plan.cost().unwrap(), Decimal::from(16));
    }

    #[test]
    fn test_consumed_equals_required_when_satisfied() {
        let lots = vec![
            lot(1, "sugar", 3, 1, 1),
            lot(2, "sugar", 4, 2, 1),
            lot(3, "sugar", 10, 5, 3),
        ];
        let required = Decimal::new(85, 1);

        let plan = plan("sugar", &lots, required);

        assert_eq!(plan.consumed(), required);
        assert_eq!(plan.draws.len(), 3);
        assert_eq!(plan.draws[2].remaining, Decimal::new(85, 1));
    }

    #[test]
    fn test_same_date_lots_follow_insertion_order() {
        let lots = vec![lot(4, "salt", 2, 1, 5), lot(9, "salt", 2, 7, 5)];

        let plan = plan("salt", &lots, Decimal::ONE);

        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].lot_id, LotId::new(4));
        assert_eq!(plan.cost().unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_insufficient_stock_draws_everything() {
        let lots = vec![lot(1, "flour", 5, 2, 1)];

        let plan = plan("flour", &lots, Decimal::from(8));

        assert!(!plan.is_satisfied());
        assert_eq!(plan.consumed(), Decimal::from(5));
        assert_eq!(plan.unsatisfied, Decimal::from(3));
        assert_eq!(plan.cost().unwrap(), Decimal::from(10));
    }

    #[test]
    fn test_zero_required_is_empty() {
        let lots = vec![lot(1, "flour", 5, 2, 1)];

        let plan = plan("flour", &lots, Decimal::ZERO);

        assert!(plan.is_satisfied());
        assert!(plan.draws.is_empty());
        assert!(plan.cost().unwrap().is_zero());
    }

    #[test]
    fn test_ignores_other_items() {
        let lots = vec![lot(1, "Flour", 5, 2, 1), lot(2, "flour", 5, 3, 2)];

        let plan = plan("flour", &lots, Decimal::from(2));

        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].lot_id, LotId::new(2));
    }

    #[test]
    fn test_cost_overflow_is_an_error() {
        let mut lots = vec![lot(1, "saffron", 1, 1, 1)];
        lots[0].quantity = Decimal::MAX;
        lots[0].unit_cost = Decimal::from(2);

        let plan = plan("saffron", &lots, Decimal::MAX);

        assert_eq!(
            plan.cost(),
            Err(QuantityError::OutOfRange { field: "lot draw cost" })
        );
    }

    #[test]
    fn test_no_lots_is_fully_unsatisfied() {
        let plan = plan("yeast", &[], Decimal::new(15, 1));

        assert!(plan.draws.is_empty());
        assert_eq!(plan.unsatisfied, Decimal::new(15, 1));
    }
}
