//! Database operations for production batches and their lot consumption.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use lot_costing_core::{BatchConsumptionId, LotId, ProductionBatchId};

use super::recipes::product_key;
use super::{RepositoryError, decimal_column};
use crate::fifo::ConsumptionPlan;
use crate::models::{BatchConsumption, BatchFilter, CreateBatchInput, ProductionBatch};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductionBatchRow {
    id: i64,
    product: String,
    quantity_produced: String,
    unit_cost: String,
    total_cost: String,
    suggested_price: String,
    sale_price: String,
    produced_on: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductionBatchRow> for ProductionBatch {
    type Error = RepositoryError;

    fn try_from(row: ProductionBatchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductionBatchId::new(row.id),
            quantity_produced: decimal_column(
                "production_batches.quantity_produced",
                &row.quantity_produced,
            )?,
            unit_cost: decimal_column("production_batches.unit_cost", &row.unit_cost)?,
            total_cost: decimal_column("production_batches.total_cost", &row.total_cost)?,
            suggested_price: decimal_column(
                "production_batches.suggested_price",
                &row.suggested_price,
            )?,
            sale_price: decimal_column("production_batches.sale_price", &row.sale_price)?,
            product: row.product,
            produced_on: row.produced_on,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BatchConsumptionRow {
    id: i64,
    batch_id: i64,
    lot_id: i64,
    item: String,
    quantity: String,
    unit_cost: String,
    cost: String,
}

impl TryFrom<BatchConsumptionRow> for BatchConsumption {
    type Error = RepositoryError;

    fn try_from(row: BatchConsumptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BatchConsumptionId::new(row.id),
            batch_id: ProductionBatchId::new(row.batch_id),
            lot_id: LotId::new(row.lot_id),
            quantity: decimal_column("batch_consumption.quantity", &row.quantity)?,
            unit_cost: decimal_column("batch_consumption.unit_cost", &row.unit_cost)?,
            cost: decimal_column("batch_consumption.cost", &row.cost)?,
            item: row.item,
        })
    }
}

const BATCH_COLUMNS: &str = "id, product, quantity_produced, unit_cost, total_cost, \
     suggested_price, sale_price, produced_on, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for production batch database operations.
pub struct BatchRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> BatchRepository<'c> {
    /// Create a new repository over a connection or transaction.
    pub const fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Append a production batch to the ledger.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        &mut self,
        input: &CreateBatchInput,
    ) -> Result<ProductionBatch, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO production_batches (
                product, product_key, quantity_produced, unit_cost, total_cost,
                suggested_price, sale_price, produced_on, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING {BATCH_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, ProductionBatchRow>(&sql)
            .bind(&input.product)
            .bind(product_key(&input.product))
            .bind(input.quantity_produced.to_string())
            .bind(input.unit_cost.to_string())
            .bind(input.total_cost.to_string())
            .bind(input.suggested_price.to_string())
            .bind(input.sale_price.to_string())
            .bind(input.produced_on)
            .bind(Utc::now())
            .fetch_one(&mut *self.conn)
            .await?;

        row.try_into()
    }

    /// Record the lot draws of a plan against a batch.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::OutOfRange` if a draw cost is not
    /// representable, or `RepositoryError::Database` if a query fails.
    pub async fn record_consumption(
        &mut self,
        batch_id: ProductionBatchId,
        plan: &ConsumptionPlan,
    ) -> Result<usize, RepositoryError> {
        for draw in &plan.draws {
            let cost = draw.cost()?;
            sqlx::query(
                r"
                INSERT INTO batch_consumption (batch_id, lot_id, item, quantity, unit_cost, cost)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(batch_id)
            .bind(draw.lot_id)
            .bind(&plan.item)
            .bind(draw.taken.to_string())
            .bind(draw.unit_cost.to_string())
            .bind(cost.to_string())
            .execute(&mut *self.conn)
            .await?;
        }

        Ok(plan.draws.len())
    }

    /// Get a batch by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &mut self,
        id: ProductionBatchId,
    ) -> Result<Option<ProductionBatch>, RepositoryError> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM production_batches WHERE id = ?1");

        let row = sqlx::query_as::<_, ProductionBatchRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        row.map(ProductionBatch::try_from).transpose()
    }

    /// List batches with filtering, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &mut self,
        filter: &BatchFilter,
    ) -> Result<Vec<ProductionBatch>, RepositoryError> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);
        let needle = filter.product.as_deref().map(product_key);
        let sql = format!(
            r"
            SELECT {BATCH_COLUMNS}
            FROM production_batches
            WHERE
                (?1 IS NULL OR instr(product_key, ?1) > 0)
                AND (?2 IS NULL OR produced_on >= ?2)
                AND (?3 IS NULL OR produced_on <= ?3)
            ORDER BY produced_on DESC, id DESC
            LIMIT ?4 OFFSET ?5
            "
        );

        let rows = sqlx::query_as::<_, ProductionBatchRow>(&sql)
            .bind(needle)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.conn)
            .await?;

        rows.into_iter().map(ProductionBatch::try_from).collect()
    }

    /// Update the sale price of a batch. Cost fields are never touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the batch does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_sale_price(
        &mut self,
        id: ProductionBatchId,
        price: Decimal,
    ) -> Result<ProductionBatch, RepositoryError> {
        let sql = format!(
            r"
            UPDATE production_batches
            SET sale_price = ?2
            WHERE id = ?1
            RETURNING {BATCH_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, ProductionBatchRow>(&sql)
            .bind(id)
            .bind(price.to_string())
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Lot draws recorded for a batch, in the order they were made.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consumption(
        &mut self,
        batch_id: ProductionBatchId,
    ) -> Result<Vec<BatchConsumption>, RepositoryError> {
        let rows = sqlx::query_as::<_, BatchConsumptionRow>(
            r"
            SELECT id, batch_id, lot_id, item, quantity, unit_cost, cost
            FROM batch_consumption
            WHERE batch_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(batch_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(BatchConsumption::try_from).collect()
    }
}
