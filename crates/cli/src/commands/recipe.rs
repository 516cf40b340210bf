//! Recipe management commands.

use lot_costing_core::RecipeLineId;
use lot_costing_engine::Inventory;
use lot_costing_engine::models::{CreateRecipeLineInput, RecipeFilter};

use super::Output;

/// Add an ingredient line to a recipe.
///
/// # Errors
///
/// Returns an error if the line is rejected or cannot be stored.
pub async fn add(
    inventory: &Inventory,
    out: Output,
    input: CreateRecipeLineInput,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = inventory.add_recipe_line(input).await?;

    out.emit(&line, |line| {
        vec![format!(
            "line {}: {} needs {} {} per unit",
            line.id, line.product, line.quantity_per_unit, line.ingredient
        )]
    })?;
    Ok(())
}

/// Remove a recipe line.
///
/// # Errors
///
/// Returns an error if no such line exists or the delete fails.
pub async fn remove(
    inventory: &Inventory,
    out: Output,
    id: RecipeLineId,
) -> Result<(), Box<dyn std::error::Error>> {
    if !inventory.remove_recipe_line(id).await? {
        return Err(format!("recipe line {id} not found").into());
    }

    out.emit(&serde_json::json!({ "removed": id }), |_| {
        vec![format!("removed recipe line {id}")]
    })?;
    Ok(())
}

/// List recipe lines grouped by product.
///
/// # Errors
///
/// Returns an error if the recipes cannot be read.
pub async fn list(
    inventory: &Inventory,
    out: Output,
    filter: &RecipeFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let lines = inventory.list_recipes(filter).await?;

    out.emit(lines.as_slice(), |lines| {
        if lines.is_empty() {
            return vec!["no recipes".to_string()];
        }
        let mut rendered = Vec::new();
        let mut current: Option<String> = None;
        for line in lines {
            let key = line.product.to_lowercase();
            if current.as_deref() != Some(key.as_str()) {
                rendered.push(format!("{}:", line.product));
                current = Some(key);
            }
            rendered.push(format!(
                "  [{}] {} x {}",
                line.id, line.ingredient, line.quantity_per_unit
            ));
        }
        rendered
    })?;
    Ok(())
}
