//! Integration tests for cost previews, production runs and the batch ledger.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;

use lot_costing_core::{CostBasis, ProductionBatchId, QuantityError};
use lot_costing_engine::models::{
    BatchFilter, CreateLotInput, LotFilter, ProductionBatch, ProductionOutcome, ProductionRequest,
    Shortage,
};
use lot_costing_engine::{InventoryError, PricingPolicy};
use lot_costing_integration_tests::{TestContext, day, dec};

async fn produce(ctx: &TestContext, product: &str, quantity: Decimal) -> ProductionOutcome {
    ctx.inventory
        .produce(ProductionRequest::new(product, quantity))
        .await
        .unwrap()
}

async fn produced(ctx: &TestContext, product: &str, quantity: Decimal) -> ProductionBatch {
    match produce(ctx, product, quantity).await {
        ProductionOutcome::Produced(batch) => batch,
        ProductionOutcome::Short(shortages) => panic!("unexpected shortages: {shortages:?}"),
    }
}

// =============================================================================
// Production Runs
// =============================================================================

#[tokio::test]
async fn test_produce_consumes_fifo_and_costs_batch() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("widget", "flour", dec(1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    let b = ctx.lot("flour", dec(5), dec(3), day(1, 2)).await.unwrap();

    let batch = produced(&ctx, "widget", dec(7)).await;

    assert_eq!(batch.product, "widget");
    assert_eq!(batch.quantity_produced, dec(7));
    assert_eq!(batch.total_cost, Decimal::new(1600, 2));
    assert_eq!(batch.unit_cost, Decimal::new(2_285_714, 6));
    assert_eq!(batch.suggested_price, Decimal::new(2286, 2));
    assert_eq!(batch.sale_price, Decimal::ZERO);

    let lots = ctx.inventory.lots_for("flour").await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].id, b.id);
    assert_eq!(lots[0].quantity, dec(3));
}

#[tokio::test]
async fn test_produce_matches_recipe_ignoring_case() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("Widget", "flour", dec(2)).await.unwrap();
    ctx.lot("flour", dec(10), dec(1), day(1, 1)).await.unwrap();

    let batch = produced(&ctx, "WIDGET", dec(3)).await;

    assert_eq!(batch.product, "WIDGET");
    assert_eq!(batch.total_cost, dec(6));
    assert_eq!(ctx.inventory.total_quantity("flour").await.unwrap(), dec(4));
}

#[tokio::test]
async fn test_shortage_leaves_everything_untouched() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("bread", "flour", dec(3)).await.unwrap();
    ctx.recipe_line("bread", "salt", dec(1)).await.unwrap();
    ctx.lot("flour", dec(2), dec(1), day(1, 1)).await.unwrap();
    ctx.lot("salt", dec(50), dec(1), day(1, 1)).await.unwrap();
    let lots_before = ctx.inventory.list_lots(&LotFilter::default()).await.unwrap();

    let outcome = produce(&ctx, "bread", dec(5)).await;

    assert_eq!(
        outcome,
        ProductionOutcome::Short(vec![Shortage {
            ingredient: "flour".to_owned(),
            shortfall: Decimal::new(1300, 2),
        }])
    );
    assert!(outcome.batch().is_none());
    let lots_after = ctx.inventory.list_lots(&LotFilter::default()).await.unwrap();
    assert_eq!(lots_before, lots_after);
    assert!(ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_suggested_price_uses_cost_ratio() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(1), dec(7), day(1, 1)).await.unwrap();

    let batch = produced(&ctx, "jam", dec(1)).await;

    assert_eq!(batch.total_cost, dec(7));
    assert_eq!(batch.suggested_price, Decimal::new(1000, 2));
}

#[tokio::test]
async fn test_configured_cost_ratio() {
    let pricing = PricingPolicy::new(Decimal::new(5, 1)).unwrap();
    let ctx = TestContext::with_pricing(pricing).await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(1), dec(7), day(1, 1)).await.unwrap();

    let batch = produced(&ctx, "jam", dec(1)).await;

    assert_eq!(batch.suggested_price, dec(14));
}

#[tokio::test]
async fn test_free_materials_suggest_zero_price() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("tea", "leaves", dec(1)).await.unwrap();
    ctx.lot("leaves", dec(5), Decimal::ZERO, day(1, 1)).await.unwrap();

    let batch = produced(&ctx, "tea", dec(2)).await;

    assert!(batch.total_cost.is_zero());
    assert!(batch.unit_cost.is_zero());
    assert!(batch.suggested_price.is_zero());
}

#[tokio::test]
async fn test_empty_recipe_produces_zero_cost_batch() {
    let ctx = TestContext::new().await.unwrap();

    let batch = produced(&ctx, "air", dec(3)).await;

    assert!(batch.total_cost.is_zero());
    assert!(ctx.inventory.batch_consumption(batch.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_sale_price_and_date_are_recorded() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(4), dec(2), day(1, 1)).await.unwrap();

    let outcome = ctx
        .inventory
        .produce(ProductionRequest {
            product: "jam".to_owned(),
            quantity: dec(2),
            sale_price: Some(Decimal::new(1250, 2)),
            produced_on: Some(day(6, 30)),
        })
        .await
        .unwrap();
    let batch = outcome.batch().unwrap();

    assert_eq!(batch.sale_price, Decimal::new(1250, 2));
    assert_eq!(batch.produced_on, day(6, 30));
}

#[tokio::test]
async fn test_rejects_invalid_requests() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(4), dec(2), day(1, 1)).await.unwrap();

    let err = ctx
        .inventory
        .produce(ProductionRequest::new("jam", Decimal::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::InvalidQuantity(_)));

    let mut request = ProductionRequest::new("jam", dec(1));
    request.sale_price = Some(dec(-1));
    let err = ctx.inventory.produce(request).await.unwrap_err();
    assert!(matches!(err, InventoryError::InvalidQuantity(_)));

    assert_eq!(ctx.inventory.total_quantity("fruit").await.unwrap(), dec(4));
}

#[tokio::test]
async fn test_overflowing_cost_is_rejected_without_changes() {
    let ctx = TestContext::new().await.unwrap();
    let huge = Decimal::from_scientific("1e20").unwrap();
    ctx.recipe_line("ingot", "gold", dec(1)).await.unwrap();
    ctx.lot("gold", huge, Decimal::from_scientific("1e10").unwrap(), day(1, 1))
        .await
        .unwrap();
    let lots_before = ctx.inventory.list_lots(&LotFilter::default()).await.unwrap();

    let err = ctx.inventory.preview_cost("ingot", huge).await.unwrap_err();
    assert!(matches!(
        err,
        InventoryError::InvalidQuantity(QuantityError::OutOfRange { .. })
    ));

    let err = ctx
        .inventory
        .produce(ProductionRequest::new("ingot", huge))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InventoryError::InvalidQuantity(QuantityError::OutOfRange { .. })
    ));

    let lots_after = ctx.inventory.list_lots(&LotFilter::default()).await.unwrap();
    assert_eq!(lots_before, lots_after);
    assert!(ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_write_rolls_back_whole_run() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("widget", "flour", dec(1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(3), day(1, 2)).await.unwrap();
    let first = produced(&ctx, "widget", dec(1)).await;
    let lots_before = ctx.inventory.list_lots(&LotFilter::default()).await.unwrap();
    let batches_before = ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap();

    // Lots are consumed and the batch row is written before this fires.
    sqlx::query(
        r"
        CREATE TRIGGER reject_consumption
        BEFORE INSERT ON batch_consumption
        BEGIN
            SELECT RAISE(ABORT, 'consumption ledger unavailable');
        END
        ",
    )
    .execute(ctx.pool())
    .await
    .unwrap();

    let err = ctx
        .inventory
        .produce(ProductionRequest::new("widget", dec(7)))
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Persistence(_)));
    let lots_after = ctx.inventory.list_lots(&LotFilter::default()).await.unwrap();
    assert_eq!(lots_before, lots_after);
    let batches_after = ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap();
    assert_eq!(batches_before, batches_after);
    assert_eq!(batches_after, vec![first]);
}

// =============================================================================
// Consumption Trace
// =============================================================================

#[tokio::test]
async fn test_consumption_rows_sum_to_unrounded_cost() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("loaf", "flour", dec(1)).await.unwrap();
    ctx.recipe_line("loaf", "oil", Decimal::new(1, 1)).await.unwrap();
    ctx.inventory
        .add_lot(CreateLotInput {
            item: "flour".to_owned(),
            quantity: dec(3),
            cost: dec(4),
            cost_basis: CostBasis::LotTotal,
            entry_date: day(1, 1),
        })
        .await
        .unwrap();
    ctx.lot("flour", dec(3), Decimal::new(15, 1), day(1, 2)).await.unwrap();
    ctx.lot("oil", dec(1), Decimal::new(999, 2), day(1, 1)).await.unwrap();

    let batch = produced(&ctx, "loaf", dec(4)).await;
    let rows = ctx.inventory.batch_consumption(batch.id).await.unwrap();

    // flour: 3 @ 1.333333 + 1 @ 1.5, oil: 0.4 @ 9.99
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].item, "flour");
    assert_eq!(rows[0].quantity, dec(3));
    assert_eq!(rows[1].quantity, dec(1));
    assert_eq!(rows[2].item, "oil");
    let raw_total: Decimal = rows.iter().map(|row| row.cost).sum();
    assert_eq!(raw_total, Decimal::new(9_495_999, 6));
    assert_eq!(batch.total_cost, Decimal::new(950, 2));
    assert_eq!(batch.unit_cost, Decimal::new(2_374_000, 6));
}

#[tokio::test]
async fn test_consumption_of_unknown_batch_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let err = ctx
        .inventory
        .batch_consumption(ProductionBatchId::new(42))
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::NotFound(_)));
}

// =============================================================================
// Cost Preview
// =============================================================================

#[tokio::test]
async fn test_preview_matches_production_without_mutating() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("widget", "flour", dec(1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(3), day(1, 2)).await.unwrap();

    let preview = ctx.inventory.preview_cost("widget", dec(7)).await.unwrap();

    assert!(preview.shortages.is_empty());
    assert_eq!(preview.total_cost, Decimal::new(1600, 2));
    assert_eq!(preview.ingredients.len(), 1);
    assert_eq!(preview.ingredients[0].consumed, dec(7));
    assert_eq!(ctx.inventory.total_quantity("flour").await.unwrap(), dec(10));

    let batch = produced(&ctx, "widget", dec(7)).await;
    assert_eq!(batch.total_cost, preview.total_cost);
    assert_eq!(batch.unit_cost, preview.unit_cost);
    assert_eq!(batch.suggested_price, preview.suggested_price);
}

#[tokio::test]
async fn test_preview_with_shortage_prices_available_stock() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("bread", "flour", dec(3)).await.unwrap();
    ctx.lot("flour", dec(2), dec(4), day(1, 1)).await.unwrap();

    let preview = ctx.inventory.preview_cost("bread", dec(5)).await.unwrap();

    assert_eq!(preview.total_cost, dec(8));
    assert_eq!(preview.ingredients[0].required, dec(15));
    assert_eq!(preview.ingredients[0].consumed, dec(2));
    assert_eq!(preview.shortages.len(), 1);
    assert_eq!(preview.shortages[0].shortfall, dec(13));
}

// =============================================================================
// Batch Ledger
// =============================================================================

#[tokio::test]
async fn test_set_sale_price_changes_only_price() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(4), dec(2), day(1, 1)).await.unwrap();
    let batch = produced(&ctx, "jam", dec(2)).await;

    let updated = ctx
        .inventory
        .set_sale_price(batch.id, Decimal::new(999, 2))
        .await
        .unwrap();

    assert_eq!(updated.sale_price, Decimal::new(999, 2));
    assert_eq!(updated.total_cost, batch.total_cost);
    assert_eq!(updated.unit_cost, batch.unit_cost);
    assert_eq!(updated.suggested_price, batch.suggested_price);
    assert_eq!(ctx.inventory.get_batch(batch.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_set_sale_price_rejects_bad_input() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(4), dec(2), day(1, 1)).await.unwrap();
    let batch = produced(&ctx, "jam", dec(2)).await;

    let err = ctx.inventory.set_sale_price(batch.id, dec(-1)).await.unwrap_err();
    assert!(matches!(err, InventoryError::InvalidQuantity(_)));

    let err = ctx
        .inventory
        .set_sale_price(ProductionBatchId::new(999), dec(1))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));
}

#[tokio::test]
async fn test_batch_costs_are_immutable_in_storage() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(4), dec(2), day(1, 1)).await.unwrap();
    let batch = produced(&ctx, "jam", dec(2)).await;

    let result = sqlx::query("UPDATE production_batches SET total_cost = '0' WHERE id = ?1")
        .bind(batch.id)
        .execute(ctx.pool())
        .await;

    assert!(result.is_err());
    assert_eq!(ctx.inventory.get_batch(batch.id).await.unwrap().total_cost, dec(4));
}

#[tokio::test]
async fn test_list_batches_newest_first_with_filters() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.recipe_line("juice", "fruit", dec(1)).await.unwrap();
    ctx.lot("fruit", dec(10), dec(1), day(1, 1)).await.unwrap();

    for (product, date) in [("jam", day(2, 1)), ("juice", day(2, 3)), ("jam", day(2, 2))] {
        let mut request = ProductionRequest::new(product, dec(1));
        request.produced_on = Some(date);
        ctx.inventory.produce(request).await.unwrap();
    }

    let all = ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap();
    let dates: Vec<_> = all.iter().map(|batch| batch.produced_on).collect();
    assert_eq!(dates, vec![day(2, 3), day(2, 2), day(2, 1)]);

    let jam = ctx
        .inventory
        .list_batches(&BatchFilter {
            product: Some("JAM".to_owned()),
            ..BatchFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(jam.len(), 2);

    let early = ctx
        .inventory
        .list_batches(&BatchFilter {
            end_date: Some(day(2, 2)),
            limit: Some(1),
            ..BatchFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].produced_on, day(2, 2));
}

#[tokio::test]
async fn test_batch_product_filter_folds_non_ascii_case() {
    let ctx = TestContext::new().await.unwrap();
    ctx.recipe_line("Éclair", "choux", dec(1)).await.unwrap();
    ctx.recipe_line("jam", "fruit", dec(1)).await.unwrap();
    ctx.lot("choux", dec(2), dec(1), day(1, 1)).await.unwrap();
    ctx.lot("fruit", dec(2), dec(1), day(1, 1)).await.unwrap();
    let eclair = produced(&ctx, "éclair", dec(1)).await;
    produced(&ctx, "jam", dec(1)).await;

    for needle in ["ÉCLAIR", "Écl", "éclair"] {
        let found = ctx
            .inventory
            .list_batches(&BatchFilter {
                product: Some(needle.to_owned()),
                ..BatchFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found, vec![eclair.clone()], "filter {needle:?}");
    }
}
