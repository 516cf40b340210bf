//! Database operations for recipe lines.
//!
//! # Case sensitivity
//!
//! Product names are matched **case-insensitively**: every line stores a
//! `product_key` (the Unicode lowercase of the product name) and lookups go
//! through it, so `"Bread"` and `"bread"` share one recipe. Ingredient names
//! are kept exactly as entered and matched **case-sensitively** against lot
//! items, so a recipe calling for `"Flour"` will not draw from `"flour"`
//! lots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use lot_costing_core::RecipeLineId;

use super::{RepositoryError, decimal_column};
use crate::models::{RecipeComponent, RecipeFilter, RecipeLine};

#[derive(Debug, sqlx::FromRow)]
struct RecipeLineRow {
    id: i64,
    product: String,
    ingredient: String,
    quantity_per_unit: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecipeLineRow> for RecipeLine {
    type Error = RepositoryError;

    fn try_from(row: RecipeLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecipeLineId::new(row.id),
            quantity_per_unit: decimal_column(
                "recipe_lines.quantity_per_unit",
                &row.quantity_per_unit,
            )?,
            product: row.product,
            ingredient: row.ingredient,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ComponentRow {
    ingredient: String,
    quantity_per_unit: String,
}

impl TryFrom<ComponentRow> for RecipeComponent {
    type Error = RepositoryError;

    fn try_from(row: ComponentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            quantity_per_unit: decimal_column(
                "recipe_lines.quantity_per_unit",
                &row.quantity_per_unit,
            )?,
            ingredient: row.ingredient,
        })
    }
}

/// Lookup key for a product name.
#[must_use]
pub fn product_key(product: &str) -> String {
    product.to_lowercase()
}

/// Repository for recipe line database operations.
pub struct RecipeRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RecipeRepository<'c> {
    /// Create a new repository over a connection or transaction.
    pub const fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Add one ingredient line to a product's recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        &mut self,
        product: &str,
        ingredient: &str,
        quantity_per_unit: Decimal,
    ) -> Result<RecipeLine, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeLineRow>(
            r"
            INSERT INTO recipe_lines (product, product_key, ingredient, quantity_per_unit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, product, ingredient, quantity_per_unit, created_at
            ",
        )
        .bind(product)
        .bind(product_key(product))
        .bind(ingredient)
        .bind(quantity_per_unit.to_string())
        .bind(Utc::now())
        .fetch_one(&mut *self.conn)
        .await?;

        row.try_into()
    }

    /// The recipe of `product`, in line insertion order.
    ///
    /// Returns an empty list if the product has no recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recipe_for(
        &mut self,
        product: &str,
    ) -> Result<Vec<RecipeComponent>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r"
            SELECT ingredient, quantity_per_unit
            FROM recipe_lines
            WHERE product_key = ?1
            ORDER BY id ASC
            ",
        )
        .bind(product_key(product))
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(RecipeComponent::try_from).collect()
    }

    /// Remove a single line.
    ///
    /// Returns `true` if a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&mut self, id: RecipeLineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM recipe_lines WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line of `product`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_product(&mut self, product: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM recipe_lines WHERE product_key = ?1")
            .bind(product_key(product))
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Distinct products with at least one line, by name.
    ///
    /// Each product is reported under the spelling of its first line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(&mut self) -> Result<Vec<String>, RepositoryError> {
        let products = sqlx::query_scalar::<_, String>(
            r"
            SELECT r.product
            FROM recipe_lines r
            WHERE r.id = (
                SELECT MIN(f.id) FROM recipe_lines f
                WHERE f.product_key = r.product_key
            )
            ORDER BY r.product_key ASC
            ",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(products)
    }

    /// List recipe lines with filtering, grouped by product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self, filter: &RecipeFilter) -> Result<Vec<RecipeLine>, RepositoryError> {
        let needle = filter.product.as_deref().map(product_key);

        let rows = sqlx::query_as::<_, RecipeLineRow>(
            r"
            SELECT id, product, ingredient, quantity_per_unit, created_at
            FROM recipe_lines
            WHERE ?1 IS NULL OR instr(product_key, ?1) > 0
            ORDER BY product_key ASC, id ASC
            ",
        )
        .bind(needle)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(RecipeLine::try_from).collect()
    }
}
