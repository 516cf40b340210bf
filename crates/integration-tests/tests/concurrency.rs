//! Concurrent production runs against shared stock.
//!
//! These run over a database file with several pooled connections, so
//! competing runs really do hold separate connections.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;

use lot_costing_engine::models::{BatchFilter, ProductionOutcome, ProductionRequest};
use lot_costing_engine::{Inventory, PricingPolicy};
use lot_costing_integration_tests::{TestContext, day, dec};

const CONNECTIONS: u32 = 4;

async fn shared_flour() -> Arc<TestContext> {
    let ctx = TestContext::on_disk(CONNECTIONS).await.unwrap();
    ctx.recipe_line("bread", "flour", dec(1)).await.unwrap();
    ctx.recipe_line("cake", "flour", dec(1)).await.unwrap();
    ctx.lot("flour", dec(5), dec(2), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(3), dec(3), day(1, 2)).await.unwrap();
    Arc::new(ctx)
}

fn assert_one_produced_one_short(outcomes: &[ProductionOutcome]) {
    let produced: Vec<_> = outcomes.iter().filter_map(ProductionOutcome::batch).collect();
    let short: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ProductionOutcome::Short(shortages) => Some(shortages),
            ProductionOutcome::Produced(_) => None,
        })
        .collect();
    assert_eq!(produced.len(), 1);
    assert_eq!(short.len(), 1);
    // 5 @ 2 + 1 @ 3
    assert_eq!(produced[0].total_cost, Decimal::new(1300, 2));
    assert_eq!(short[0].len(), 1);
    assert_eq!(short[0][0].shortfall, dec(4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_competing_runs_never_double_spend() {
    let ctx = shared_flour().await;

    let handles: Vec<_> = ["bread", "cake"]
        .into_iter()
        .map(|product| {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                ctx.inventory
                    .produce(ProductionRequest::new(product, dec(6)))
                    .await
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok(), "production failed: {result:?}");
        outcomes.push(result.unwrap());
    }

    assert_one_produced_one_short(&outcomes);
    assert_eq!(ctx.inventory.total_quantity("flour").await.unwrap(), dec(2));
    let batches = ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap();
    assert_eq!(batches.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_separate_services_on_one_file_never_double_spend() {
    let ctx = shared_flour().await;
    // No shared in-process lock; only the database serializes these writers.
    let other = Arc::new(Inventory::new(ctx.pool().clone(), PricingPolicy::default()));

    let first = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            ctx.inventory
                .produce(ProductionRequest::new("bread", dec(6)))
                .await
        })
    };
    let second = {
        let other = Arc::clone(&other);
        tokio::spawn(async move { other.produce(ProductionRequest::new("cake", dec(6))).await })
    };

    let first = first.await.unwrap();
    let second = second.await.unwrap();
    assert!(first.is_ok(), "production failed: {first:?}");
    assert!(second.is_ok(), "production failed: {second:?}");

    assert_one_produced_one_short(&[first.unwrap(), second.unwrap()]);
    assert_eq!(other.total_quantity("flour").await.unwrap(), dec(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_small_runs_drain_stock_exactly() {
    let ctx = Arc::new(TestContext::on_disk(CONNECTIONS).await.unwrap());
    ctx.recipe_line("roll", "flour", dec(1)).await.unwrap();
    ctx.lot("flour", dec(4), dec(1), day(1, 1)).await.unwrap();
    ctx.lot("flour", dec(4), dec(2), day(1, 2)).await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                ctx.inventory
                    .produce(ProductionRequest::new("roll", dec(1)))
                    .await
            })
        })
        .collect();

    let mut produced = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ProductionOutcome::Produced(_) => produced += 1,
            ProductionOutcome::Short(_) => short += 1,
        }
    }

    assert_eq!(produced, 8);
    assert_eq!(short, 2);
    assert!(ctx.inventory.lots_for("flour").await.unwrap().is_empty());

    let batches = ctx.inventory.list_batches(&BatchFilter::default()).await.unwrap();
    let total: Decimal = batches.iter().map(|batch| batch.total_cost).sum();
    assert_eq!(total, dec(12));
}
