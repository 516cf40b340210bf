//! Production ledger commands.

use rust_decimal::Decimal;
use serde::Serialize;

use lot_costing_core::ProductionBatchId;
use lot_costing_engine::Inventory;
use lot_costing_engine::models::{BatchConsumption, BatchFilter, ProductionBatch};

use super::Output;

#[derive(Serialize)]
struct BatchDetail {
    batch: ProductionBatch,
    consumption: Vec<BatchConsumption>,
}

fn render_batch(batch: &ProductionBatch) -> String {
    format!(
        "{:>6}  {}  {:<24} {:>10} units  cost {:>10}  unit {:>12}  price {:>10}",
        batch.id,
        batch.produced_on,
        batch.product,
        batch.quantity_produced,
        batch.total_cost,
        batch.unit_cost,
        batch.sale_price
    )
}

/// List batches, newest first.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read.
pub async fn list(
    inventory: &Inventory,
    out: Output,
    filter: &BatchFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let batches = inventory.list_batches(filter).await?;

    out.emit(batches.as_slice(), |batches| {
        if batches.is_empty() {
            return vec!["no batches".to_string()];
        }
        batches.iter().map(render_batch).collect()
    })?;
    Ok(())
}

/// Show a batch with the lot draws it made.
///
/// # Errors
///
/// Returns an error if the batch does not exist.
pub async fn show(
    inventory: &Inventory,
    out: Output,
    id: ProductionBatchId,
) -> Result<(), Box<dyn std::error::Error>> {
    let detail = BatchDetail {
        batch: inventory.get_batch(id).await?,
        consumption: inventory.batch_consumption(id).await?,
    };

    out.emit(&detail, |detail| {
        let mut lines = vec![
            render_batch(&detail.batch),
            format!("  suggested price {}", detail.batch.suggested_price),
        ];
        for draw in &detail.consumption {
            lines.push(format!(
                "  lot {:>6}  {:<24} {:>12} @ {:>12} = {}",
                draw.lot_id, draw.item, draw.quantity, draw.unit_cost, draw.cost
            ));
        }
        lines
    })?;
    Ok(())
}

/// Set the sale price of a batch.
///
/// # Errors
///
/// Returns an error if the price is negative or the batch does not exist.
pub async fn set_price(
    inventory: &Inventory,
    out: Output,
    id: ProductionBatchId,
    price: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = inventory.set_sale_price(id, price).await?;

    out.emit(&batch, |batch| vec![render_batch(batch)])?;
    Ok(())
}
