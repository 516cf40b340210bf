//! Availability, cost preview and production commands.

use rust_decimal::Decimal;
use tracing::{info, warn};

use lot_costing_engine::Inventory;
use lot_costing_engine::models::{ProductionOutcome, ProductionRequest, Shortage};

use super::Output;

fn render_shortages(shortages: &[Shortage]) -> Vec<String> {
    shortages
        .iter()
        .map(|short| format!("  short {} by {}", short.ingredient, short.shortfall))
        .collect()
}

/// Report whether stock covers a run.
///
/// # Errors
///
/// Returns an error if the input is rejected or stock cannot be read.
pub async fn check(
    inventory: &Inventory,
    out: Output,
    product: &str,
    quantity: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    let shortages = inventory.check_availability(product, quantity).await?;

    out.emit(shortages.as_slice(), |shortages| {
        if shortages.is_empty() {
            vec![format!("stock covers {quantity} x {product}")]
        } else {
            let mut lines = vec![format!("cannot produce {quantity} x {product}:")];
            lines.extend(render_shortages(shortages));
            lines
        }
    })?;
    Ok(())
}

/// Quote a run without consuming stock.
///
/// # Errors
///
/// Returns an error if the input is rejected or stock cannot be read.
pub async fn preview(
    inventory: &Inventory,
    out: Output,
    product: &str,
    quantity: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    let preview = inventory.preview_cost(product, quantity).await?;

    out.emit(&preview, |preview| {
        let mut lines = vec![format!("{} x {}", preview.quantity, preview.product)];
        for ingredient in &preview.ingredients {
            lines.push(format!(
                "  {:<24} {:>12} of {:>12}  cost {}",
                ingredient.ingredient,
                ingredient.consumed,
                ingredient.required,
                lot_costing_core::round_money(ingredient.cost)
            ));
        }
        lines.push(format!("total cost      {}", preview.total_cost));
        lines.push(format!("unit cost       {}", preview.unit_cost));
        lines.push(format!("suggested price {}", preview.suggested_price));
        if !preview.shortages.is_empty() {
            lines.push("quote covers available stock only:".to_string());
            lines.extend(render_shortages(&preview.shortages));
        }
        lines
    })?;
    Ok(())
}

/// Produce a batch.
///
/// # Errors
///
/// Returns an error if the input is rejected, stock is short, or the run
/// cannot be stored.
pub async fn produce(
    inventory: &Inventory,
    out: Output,
    request: ProductionRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = request.product.clone();
    let outcome = inventory.produce(request).await?;

    out.emit(&outcome, |outcome| match outcome {
        ProductionOutcome::Produced(batch) => vec![
            format!(
                "batch {}: {} x {} on {}",
                batch.id, batch.quantity_produced, batch.product, batch.produced_on
            ),
            format!("  total cost      {}", batch.total_cost),
            format!("  unit cost       {}", batch.unit_cost),
            format!("  suggested price {}", batch.suggested_price),
            format!("  sale price      {}", batch.sale_price),
        ],
        ProductionOutcome::Short(shortages) => {
            let mut lines = vec![format!("nothing produced for {product}:")];
            lines.extend(render_shortages(shortages));
            lines
        }
    })?;

    match outcome {
        ProductionOutcome::Produced(batch) => {
            info!(batch_id = %batch.id, "Production recorded");
            Ok(())
        }
        ProductionOutcome::Short(shortages) => {
            warn!(shortages = shortages.len(), "Production refused");
            Err("insufficient stock".into())
        }
    }
}
