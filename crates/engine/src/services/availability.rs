//! Availability checks: does stock cover a production run?

use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{instrument, warn};

use lot_costing_core::{Name, QuantityError, checked_mul, checked_sum, positive, round_shortfall};

use super::Inventory;
use crate::db::{LotRepository, RecipeRepository, RepositoryError};
use crate::error::InventoryError;
use crate::models::{RecipeComponent, Requirement, Shortage};

/// Total ingredient requirements of a run of `quantity` units.
///
/// Lines naming the same ingredient are summed into one requirement, placed
/// where the ingredient first appears in the recipe.
///
/// # Errors
///
/// Returns [`QuantityError::OutOfRange`] if a requirement is not
/// representable.
pub fn requirements(
    recipe: &[RecipeComponent],
    quantity: Decimal,
) -> Result<Vec<Requirement>, QuantityError> {
    let mut requirements: Vec<Requirement> = Vec::with_capacity(recipe.len());
    for component in recipe {
        let needed = checked_mul("required quantity", component.quantity_per_unit, quantity)?;
        match requirements
            .iter_mut()
            .find(|requirement| requirement.ingredient == component.ingredient)
        {
            Some(requirement) => {
                requirement.quantity =
                    checked_sum("required quantity", [requirement.quantity, needed])?;
            }
            None => requirements.push(Requirement {
                ingredient: component.ingredient.clone(),
                quantity: needed,
            }),
        }
    }
    Ok(requirements)
}

/// The shortage of a requirement against the available quantity, if any.
#[must_use]
pub fn shortage(requirement: &Requirement, available: Decimal) -> Option<Shortage> {
    (available < requirement.quantity).then(|| Shortage {
        ingredient: requirement.ingredient.clone(),
        shortfall: round_shortfall(requirement.quantity - available),
    })
}

/// Requirements of a run, read from the recipe on `conn`.
pub(crate) async fn run_requirements(
    conn: &mut SqliteConnection,
    product: &str,
    quantity: Decimal,
) -> Result<Vec<Requirement>, RepositoryError> {
    let recipe = RecipeRepository::new(conn).recipe_for(product).await?;
    if recipe.is_empty() {
        warn!(product, "No recipe found for product");
    }
    Ok(requirements(&recipe, quantity)?)
}

/// Shortages of `requirements` against stock visible on `conn`.
pub(crate) async fn shortages(
    conn: &mut SqliteConnection,
    requirements: &[Requirement],
) -> Result<Vec<Shortage>, RepositoryError> {
    let mut lots = LotRepository::new(conn);
    let mut shortages = Vec::new();
    for requirement in requirements {
        let available = lots.total_quantity(&requirement.ingredient).await?;
        shortages.extend(shortage(requirement, available));
    }
    Ok(shortages)
}

impl Inventory {
    /// Check whether stock covers `quantity` units of `product`.
    ///
    /// Returns the ingredients that fall short; an empty list means the run
    /// can go ahead. Nothing is modified.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` if `quantity` is not
    /// positive or the requirements overflow, and
    /// `InventoryError::InvalidName` for a blank product.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        product: &str,
        quantity: Decimal,
    ) -> Result<Vec<Shortage>, InventoryError> {
        let product = Name::parse(product)?;
        let quantity = positive("quantity", quantity)?;

        let mut tx = self.pool.begin().await?;
        let requirements = run_requirements(&mut tx, product.as_str(), quantity).await?;
        let shortages = shortages(&mut tx, &requirements).await?;
        tx.commit().await?;

        if !shortages.is_empty() {
            warn!(product = %product, %quantity, shortages = shortages.len(), "Insufficient stock");
        }
        Ok(shortages)
    }
}
