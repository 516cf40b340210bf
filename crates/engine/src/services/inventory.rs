//! The inventory service.
//!
//! [`Inventory`] owns the connection pool and serializes every mutation
//! behind one async write lock. Each mutation runs in its own
//! `BEGIN IMMEDIATE` transaction, so writers sharing the database file from
//! another service or process are serialized by `SQLite` as well. Returning
//! early (or failing) drops the transaction and rolls it back.

use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use lot_costing_core::{
    LotId, Name, ProductionBatchId, RecipeLineId, non_negative, positive, unit_cost_from,
};

use crate::db::{
    BatchRepository, KnownItemRepository, LotRepository, RecipeRepository, RepositoryError,
};
use crate::error::InventoryError;
use crate::models::{
    BatchConsumption, BatchFilter, CreateLotInput, CreateRecipeLineInput, KnownItem, Lot,
    LotFilter, ProductionBatch, RecipeComponent, RecipeFilter, RecipeLine, StockLevel,
};
use crate::pricing::PricingPolicy;

/// Lot store, recipe registry and production ledger behind one write lock.
pub struct Inventory {
    pub(crate) pool: SqlitePool,
    pub(crate) write_lock: Mutex<()>,
    pub(crate) pricing: PricingPolicy,
}

impl Inventory {
    /// Create a new inventory service over a migrated pool.
    #[must_use]
    pub fn new(pool: SqlitePool, pricing: PricingPolicy) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
            pricing,
        }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The pricing policy applied to new batches.
    #[must_use]
    pub const fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Open a transaction that takes the database write lock up front.
    ///
    /// A deferred transaction that reads before it writes can fail with
    /// `SQLITE_BUSY` on upgrade when another connection wrote in between.
    pub(crate) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    // =========================================================================
    // Lot Store
    // =========================================================================

    /// Receive a lot of raw material.
    ///
    /// The unit cost is derived from `input.cost` according to
    /// `input.cost_basis` and rounded to 6 decimal places. The item is
    /// registered as known in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` for a non-positive quantity
    /// or negative cost, `InventoryError::InvalidName` for a blank item, and
    /// `InventoryError::Persistence` if the write fails.
    #[instrument(skip(self, input), fields(item = %input.item))]
    pub async fn add_lot(&self, input: CreateLotInput) -> Result<Lot, InventoryError> {
        let item = Name::parse(&input.item)?;
        let quantity = positive("quantity", input.quantity)?;
        let unit_cost = unit_cost_from(input.cost, quantity, input.cost_basis)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_write().await?;

        let new_item = KnownItemRepository::new(&mut tx).register(item.as_str()).await?;
        let lot = LotRepository::new(&mut tx)
            .insert(item.as_str(), quantity, unit_cost, input.entry_date)
            .await?;

        tx.commit().await?;

        info!(
            lot_id = %lot.id,
            item = %lot.item,
            quantity = %lot.quantity,
            unit_cost = %lot.unit_cost,
            entry_date = %lot.entry_date,
            new_item,
            "Received lot"
        );

        Ok(lot)
    }

    /// Get a lot by ID.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NotFound` if the lot does not exist (it may
    /// have been consumed).
    pub async fn get_lot(&self, id: LotId) -> Result<Lot, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        LotRepository::new(&mut conn)
            .get(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("lot {id}")))
    }

    /// Open lots of `item` in FIFO order.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn lots_for(&self, item: &str) -> Result<Vec<Lot>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(LotRepository::new(&mut conn).lots_for(item).await?)
    }

    /// Total quantity of `item` on hand.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn total_quantity(&self, item: &str) -> Result<Decimal, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(LotRepository::new(&mut conn).total_quantity(item).await?)
    }

    /// List lots with filtering.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn list_lots(&self, filter: &LotFilter) -> Result<Vec<Lot>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(LotRepository::new(&mut conn).list(filter).await?)
    }

    /// Every item name ever received, by name.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn list_known_items(&self) -> Result<Vec<KnownItem>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(KnownItemRepository::new(&mut conn).list().await?)
    }

    /// Quantity and value on hand per item.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn stock_levels(&self) -> Result<Vec<StockLevel>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(LotRepository::new(&mut conn).stock_levels().await?)
    }

    // =========================================================================
    // Recipe Registry
    // =========================================================================

    /// Add an ingredient line to a product's recipe.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` if the quantity per unit is
    /// not positive and `InventoryError::InvalidName` for blank names.
    #[instrument(skip(self, input), fields(product = %input.product, ingredient = %input.ingredient))]
    pub async fn add_recipe_line(
        &self,
        input: CreateRecipeLineInput,
    ) -> Result<RecipeLine, InventoryError> {
        let product = Name::parse(&input.product)?;
        let ingredient = Name::parse(&input.ingredient)?;
        let quantity_per_unit = positive("quantity per unit", input.quantity_per_unit)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_write().await?;
        let line = RecipeRepository::new(&mut tx)
            .insert(product.as_str(), ingredient.as_str(), quantity_per_unit)
            .await?;
        tx.commit().await?;

        info!(line_id = %line.id, quantity_per_unit = %line.quantity_per_unit, "Added recipe line");
        Ok(line)
    }

    /// Remove a recipe line. Returns `false` if no such line existed.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove_recipe_line(&self, id: RecipeLineId) -> Result<bool, InventoryError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_write().await?;
        let removed = RecipeRepository::new(&mut tx).remove(id).await?;
        tx.commit().await?;

        if removed {
            info!(line_id = %id, "Removed recipe line");
        }
        Ok(removed)
    }

    /// Replace a product's whole recipe in one transaction.
    ///
    /// An empty `components` list deletes the recipe.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` or `InventoryError::InvalidName`
    /// if any component is invalid; nothing is changed in that case.
    #[instrument(skip(self, components), fields(lines = components.len()))]
    pub async fn replace_recipe(
        &self,
        product: &str,
        components: &[RecipeComponent],
    ) -> Result<Vec<RecipeLine>, InventoryError> {
        let product = Name::parse(product)?;
        let mut validated = Vec::with_capacity(components.len());
        for component in components {
            validated.push((
                Name::parse(&component.ingredient)?,
                positive("quantity per unit", component.quantity_per_unit)?,
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_write().await?;

        let removed = RecipeRepository::new(&mut tx)
            .remove_product(product.as_str())
            .await?;
        let mut lines = Vec::with_capacity(validated.len());
        for (ingredient, quantity_per_unit) in &validated {
            let line = RecipeRepository::new(&mut tx)
                .insert(product.as_str(), ingredient.as_str(), *quantity_per_unit)
                .await?;
            lines.push(line);
        }

        tx.commit().await?;

        info!(product = %product, removed, added = lines.len(), "Replaced recipe");
        Ok(lines)
    }

    /// List recipe lines with filtering.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<RecipeLine>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(RecipeRepository::new(&mut conn).list(filter).await?)
    }

    /// The recipe of `product` (case-insensitive). Empty if it has none.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn recipe_for(&self, product: &str) -> Result<Vec<RecipeComponent>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let recipe = RecipeRepository::new(&mut conn).recipe_for(product.trim()).await?;
        if recipe.is_empty() {
            warn!(product, "No recipe found for product");
        }
        Ok(recipe)
    }

    /// Products with at least one recipe line.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn recipe_products(&self) -> Result<Vec<String>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(RecipeRepository::new(&mut conn).products().await?)
    }

    // =========================================================================
    // Production Ledger
    // =========================================================================

    /// List batches with filtering, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Persistence` if the query fails.
    pub async fn list_batches(
        &self,
        filter: &BatchFilter,
    ) -> Result<Vec<ProductionBatch>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(BatchRepository::new(&mut conn).list(filter).await?)
    }

    /// Get a batch by ID.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NotFound` if the batch does not exist.
    pub async fn get_batch(&self, id: ProductionBatchId) -> Result<ProductionBatch, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        BatchRepository::new(&mut conn)
            .get(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("batch {id}")))
    }

    /// Lot draws recorded for a batch.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NotFound` if the batch does not exist.
    pub async fn batch_consumption(
        &self,
        id: ProductionBatchId,
    ) -> Result<Vec<BatchConsumption>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let mut batches = BatchRepository::new(&mut conn);
        if batches.get(id).await?.is_none() {
            return Err(InventoryError::NotFound(format!("batch {id}")));
        }
        Ok(batches.consumption(id).await?)
    }

    /// Set the sale price of a batch. Its costs are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` for a negative price and
    /// `InventoryError::NotFound` if the batch does not exist.
    #[instrument(skip(self))]
    pub async fn set_sale_price(
        &self,
        id: ProductionBatchId,
        price: Decimal,
    ) -> Result<ProductionBatch, InventoryError> {
        let price = non_negative("sale price", price)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_write().await?;
        let batch = match BatchRepository::new(&mut tx).set_sale_price(id, price).await {
            Ok(batch) => batch,
            Err(RepositoryError::NotFound) => {
                return Err(InventoryError::NotFound(format!("batch {id}")));
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        info!(batch_id = %id, sale_price = %batch.sale_price, "Updated sale price");
        Ok(batch)
    }
}
