//! Integration tests for lot receipt and FIFO consumption.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;

use lot_costing_core::{CostBasis, QuantityError};
use lot_costing_engine::InventoryError;
use lot_costing_engine::db::LotRepository;
use lot_costing_engine::models::{CreateLotInput, LotFilter};
use lot_costing_integration_tests::{TestContext, day, dec};

// =============================================================================
// Receiving Lots
// =============================================================================

#[tokio::test]
async fn test_same_item_registers_once() {
    let ctx = TestContext::new().await.unwrap();

    ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(3), dec(4), day(1, 2)).await.unwrap();

    let items = ctx.inventory.list_known_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "flour");

    let lots = ctx.inventory.lots_for("flour").await.unwrap();
    assert_eq!(lots.len(), 2);
}

#[tokio::test]
async fn test_total_and_per_unit_cost_store_same_unit_cost() {
    let ctx = TestContext::new().await.unwrap();

    let from_total = ctx
        .inventory
        .add_lot(CreateLotInput {
            item: "X".to_owned(),
            quantity: dec(10),
            cost: dec(50),
            cost_basis: CostBasis::LotTotal,
            entry_date: day(2, 1),
        })
        .await
        .unwrap();
    let per_unit = ctx
        .inventory
        .add_lot(CreateLotInput {
            item: "X".to_owned(),
            quantity: dec(10),
            cost: dec(5),
            cost_basis: CostBasis::PerUnit,
            entry_date: day(2, 1),
        })
        .await
        .unwrap();

    assert_eq!(from_total.unit_cost, dec(5));
    assert_eq!(per_unit.unit_cost, dec(5));
}

#[tokio::test]
async fn test_lot_total_cost_keeps_six_places() {
    let ctx = TestContext::new().await.unwrap();

    let lot = ctx
        .inventory
        .add_lot(CreateLotInput {
            item: "oil".to_owned(),
            quantity: dec(3),
            cost: dec(10),
            cost_basis: CostBasis::LotTotal,
            entry_date: day(2, 1),
        })
        .await
        .unwrap();

    assert_eq!(lot.unit_cost, Decimal::new(3_333_333, 6));
    let stored = ctx.inventory.get_lot(lot.id).await.unwrap();
    assert_eq!(stored.unit_cost, Decimal::new(3_333_333, 6));
}

#[tokio::test]
async fn test_rejects_invalid_lots_without_storing() {
    let ctx = TestContext::new().await.unwrap();

    let err = ctx.lot("flour", Decimal::ZERO, dec(2), day(1, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        InventoryError::InvalidQuantity(QuantityError::NotPositive { field: "quantity", .. })
    ));

    let err = ctx.lot("flour", dec(-1), dec(2), day(1, 1)).await.unwrap_err();
    assert!(err.is_invalid_input());

    let err = ctx.lot("flour", dec(1), dec(-2), day(1, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        InventoryError::InvalidQuantity(QuantityError::Negative { field: "cost", .. })
    ));

    let err = ctx.lot("   ", dec(1), dec(2), day(1, 1)).await.unwrap_err();
    assert!(matches!(err, InventoryError::InvalidName(_)));

    assert!(ctx.inventory.list_known_items().await.unwrap().is_empty());
    assert!(ctx.inventory.list_lots(&LotFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_item_identity_is_case_sensitive() {
    let ctx = TestContext::new().await.unwrap();

    ctx.lot("Flour", dec(1), dec(1), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(2), dec(1), day(1, 1)).await.unwrap();

    assert_eq!(ctx.inventory.list_known_items().await.unwrap().len(), 2);
    assert_eq!(ctx.inventory.total_quantity("flour").await.unwrap(), dec(2));
    assert_eq!(ctx.inventory.total_quantity("Flour").await.unwrap(), dec(1));
}

// =============================================================================
// Ordering and Listings
// =============================================================================

#[tokio::test]
async fn test_lots_for_orders_by_date_then_insertion() {
    let ctx = TestContext::new().await.unwrap();

    let late = ctx.lot("sugar", dec(1), dec(9), day(3, 5)).await.unwrap();
    let early_first = ctx.lot("sugar", dec(1), dec(1), day(3, 1)).await.unwrap();
    let early_second = ctx.lot("sugar", dec(1), dec(2), day(3, 1)).await.unwrap();

    let lots = ctx.inventory.lots_for("sugar").await.unwrap();
    let ids: Vec<_> = lots.iter().map(|lot| lot.id).collect();
    assert_eq!(ids, vec![early_first.id, early_second.id, late.id]);
}

#[tokio::test]
async fn test_unknown_item_has_no_stock() {
    let ctx = TestContext::new().await.unwrap();

    assert!(ctx.inventory.lots_for("saffron").await.unwrap().is_empty());
    assert_eq!(ctx.inventory.total_quantity("saffron").await.unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn test_list_lots_filters() {
    let ctx = TestContext::new().await.unwrap();
    ctx.lot("brown sugar", dec(1), dec(1), day(1, 1)).await.unwrap();
    ctx.lot("white sugar", dec(1), dec(1), day(1, 10)).await.unwrap();
    ctx.lot("flour", dec(1), dec(1), day(1, 20)).await.unwrap();

    let sugar = ctx
        .inventory
        .list_lots(&LotFilter {
            item: Some("sugar".to_owned()),
            ..LotFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(sugar.len(), 2);

    let ranged = ctx
        .inventory
        .list_lots(&LotFilter {
            start_date: Some(day(1, 5)),
            end_date: Some(day(1, 31)),
            ..LotFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(ranged.len(), 2);
    assert_eq!(ranged[0].item, "white sugar");

    let paged = ctx
        .inventory
        .list_lots(&LotFilter {
            limit: Some(1),
            offset: Some(2),
            ..LotFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].item, "flour");
}

#[tokio::test]
async fn test_stock_levels_summarize_per_item() {
    let ctx = TestContext::new().await.unwrap();
    ctx.lot("sugar", dec(4), dec(1), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(3), day(1, 2)).await.unwrap();

    let levels = ctx.inventory.stock_levels().await.unwrap();

    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].item, "flour");
    assert_eq!(levels[0].quantity, dec(10));
    assert_eq!(levels[0].value, dec(25));
    assert_eq!(levels[0].lot_count, 2);
    assert_eq!(levels[1].item, "sugar");
    assert_eq!(levels[1].value, dec(4));
}

#[tokio::test]
async fn test_stock_value_overflow_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let huge = Decimal::from_scientific("1e20").unwrap();
    ctx.lot("gold", huge, Decimal::from_scientific("1e10").unwrap(), day(1, 1))
        .await
        .unwrap();

    let err = ctx.inventory.stock_levels().await.unwrap_err();

    assert!(matches!(
        err,
        InventoryError::InvalidQuantity(QuantityError::OutOfRange { .. })
    ));
}

// =============================================================================
// FIFO Consumption
// =============================================================================

#[tokio::test]
async fn test_consume_takes_oldest_lot_first() {
    let ctx = TestContext::new().await.unwrap();
    let a = ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    let b = ctx.lot("flour", dec(5), dec(3), day(1, 2)).await.unwrap();

    let plan = {
        let mut conn = ctx.pool().acquire().await.unwrap();
        LotRepository::new(&mut conn).consume("flour", dec(7)).await.unwrap()
    };

    assert_eq!(plan.cost().unwrap(), dec(16));
    assert!(plan.is_satisfied());

    let lots = ctx.inventory.lots_for("flour").await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].id, b.id);
    assert_eq!(lots[0].quantity, dec(3));
    assert!(matches!(
        ctx.inventory.get_lot(a.id).await,
        Err(InventoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_consume_conserves_quantity() {
    let ctx = TestContext::new().await.unwrap();
    ctx.lot("butter", Decimal::new(25, 1), dec(4), day(1, 1)).await.unwrap();
    ctx.lot("butter", dec(3), dec(5), day(1, 2)).await.unwrap();
    ctx.lot("butter", dec(4), dec(6), day(1, 3)).await.unwrap();
    let required = Decimal::new(65, 1);

    let before = ctx.inventory.total_quantity("butter").await.unwrap();
    let plan = {
        let mut conn = ctx.pool().acquire().await.unwrap();
        LotRepository::new(&mut conn).consume("butter", required).await.unwrap()
    };
    let after = ctx.inventory.total_quantity("butter").await.unwrap();

    assert_eq!(plan.consumed(), required);
    assert_eq!(before - after, required);
    // 2.5 * 4 + 3 * 5 + 1 * 6
    assert_eq!(plan.cost().unwrap(), dec(31));
}

#[tokio::test]
async fn test_consume_with_insufficient_stock_stops_early() {
    let ctx = TestContext::new().await.unwrap();
    ctx.lot("yeast", dec(2), dec(1), day(1, 1)).await.unwrap();

    let plan = {
        let mut conn = ctx.pool().acquire().await.unwrap();
        LotRepository::new(&mut conn).consume("yeast", dec(5)).await.unwrap()
    };

    assert_eq!(plan.consumed(), dec(2));
    assert_eq!(plan.unsatisfied, dec(3));
    assert!(ctx.inventory.lots_for("yeast").await.unwrap().is_empty());
}
