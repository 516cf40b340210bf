//! Seed recipes from a YAML file.
//!
//! The file maps each product to its ingredient lines:
//!
//! ```yaml
//! bread:
//!   - ingredient: flour
//!     quantity_per_unit: 0.5
//!   - ingredient: salt
//!     quantity_per_unit: 0.01
//! ```
//!
//! Every product listed has its recipe replaced; products not listed are
//! left alone.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use lot_costing_core::Name;
use lot_costing_engine::Inventory;
use lot_costing_engine::models::RecipeComponent;

use super::Output;

/// Recipes keyed by product name.
pub type RecipeBook = BTreeMap<String, Vec<RecipeComponent>>;

#[derive(Debug, Default, Serialize)]
struct SeedSummary {
    products: usize,
    lines: usize,
}

/// Parse a recipe book from YAML.
///
/// # Errors
///
/// Returns `serde_yaml::Error` if the document is not a valid recipe book.
pub fn parse(content: &str) -> Result<RecipeBook, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Check a recipe book, returning one message per problem.
#[must_use]
pub fn validate(book: &RecipeBook) -> Vec<String> {
    let mut errors = Vec::new();
    for (product, components) in book {
        if let Err(e) = Name::parse(product) {
            errors.push(format!("product {product:?}: {e}"));
        }
        for (index, component) in components.iter().enumerate() {
            if let Err(e) = Name::parse(&component.ingredient) {
                errors.push(format!("{product} line {}: ingredient {e}", index + 1));
            }
            if component.quantity_per_unit <= Decimal::ZERO {
                errors.push(format!(
                    "{product} line {}: quantity_per_unit must be greater than zero (got {})",
                    index + 1,
                    component.quantity_per_unit
                ));
            }
        }
    }
    errors
}

/// Replace recipes from a YAML file.
///
/// The whole file is validated before anything is written.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a recipe cannot be stored.
pub async fn recipes(
    inventory: &Inventory,
    out: Output,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading recipes from file");

    let content = tokio::fs::read_to_string(path).await?;
    let book = parse(&content)?;

    info!(products = book.len(), "Parsed recipe book");

    let errors = validate(&book);
    if !errors.is_empty() {
        error!("Recipe validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let mut summary = SeedSummary::default();
    for (product, components) in &book {
        let lines = inventory.replace_recipe(product, components).await?;
        summary.products += 1;
        summary.lines += lines.len();
    }

    info!(products = summary.products, lines = summary.lines, "Seeding complete!");

    out.emit(&summary, |summary| {
        vec![format!(
            "seeded {} product(s), {} recipe line(s)",
            summary.products, summary.lines
        )]
    })?;
    Ok(())
}
