//! Lot receipt and stock listing commands.

use tracing::info;

use lot_costing_engine::models::{CreateLotInput, LotFilter};
use lot_costing_engine::Inventory;

use super::Output;

/// Receive a lot.
///
/// # Errors
///
/// Returns an error if the lot is rejected or cannot be stored.
pub async fn add(
    inventory: &Inventory,
    out: Output,
    input: CreateLotInput,
) -> Result<(), Box<dyn std::error::Error>> {
    let lot = inventory.add_lot(input).await?;
    info!(lot_id = %lot.id, "Lot stored");

    out.emit(&lot, |lot| {
        vec![format!(
            "lot {}: {} x {} @ {} (received {})",
            lot.id, lot.item, lot.quantity, lot.unit_cost, lot.entry_date
        )]
    })?;
    Ok(())
}

/// List open lots in FIFO order.
///
/// # Errors
///
/// Returns an error if the lots cannot be read.
pub async fn list(
    inventory: &Inventory,
    out: Output,
    filter: &LotFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let lots = inventory.list_lots(filter).await?;

    out.emit(lots.as_slice(), |lots| {
        if lots.is_empty() {
            return vec!["no open lots".to_string()];
        }
        lots.iter()
            .map(|lot| {
                format!(
                    "{:>6}  {}  {:<24} {:>12} @ {:>12}",
                    lot.id, lot.entry_date, lot.item, lot.quantity, lot.unit_cost
                )
            })
            .collect()
    })?;
    Ok(())
}

/// List every item name ever received.
///
/// # Errors
///
/// Returns an error if the registry cannot be read.
pub async fn items(inventory: &Inventory, out: Output) -> Result<(), Box<dyn std::error::Error>> {
    let items = inventory.list_known_items().await?;

    out.emit(items.as_slice(), |items| {
        items.iter().map(|item| item.name.clone()).collect()
    })?;
    Ok(())
}

/// Show quantity and value on hand per item.
///
/// # Errors
///
/// Returns an error if the lots cannot be read.
pub async fn stock(inventory: &Inventory, out: Output) -> Result<(), Box<dyn std::error::Error>> {
    let levels = inventory.stock_levels().await?;

    out.emit(levels.as_slice(), |levels| {
        if levels.is_empty() {
            return vec!["no stock on hand".to_string()];
        }
        levels
            .iter()
            .map(|level| {
                format!(
                    "{:<24} {:>12} in {} lot(s), value {}",
                    level.item,
                    level.quantity,
                    level.lot_count,
                    lot_costing_core::round_money(level.value)
                )
            })
            .collect()
    })?;
    Ok(())
}
