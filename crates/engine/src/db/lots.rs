//! Database operations for raw-material lots.
//!
//! Lots are always returned in FIFO order: `entry_date` ascending, then `id`
//! ascending for lots received on the same date.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::debug;

use lot_costing_core::{LotId, checked_sum};

use super::{RepositoryError, decimal_column};
use crate::fifo::{self, ConsumptionPlan};
use crate::models::{Lot, LotFilter, StockLevel};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: i64,
    item: String,
    quantity: String,
    unit_cost: String,
    entry_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<LotRow> for Lot {
    type Error = RepositoryError;

    fn try_from(row: LotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LotId::new(row.id),
            quantity: decimal_column("lots.quantity", &row.quantity)?,
            unit_cost: decimal_column("lots.unit_cost", &row.unit_cost)?,
            item: row.item,
            entry_date: row.entry_date,
            created_at: row.created_at,
        })
    }
}

fn into_lots(rows: Vec<LotRow>) -> Result<Vec<Lot>, RepositoryError> {
    rows.into_iter().map(Lot::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for lot database operations.
pub struct LotRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> LotRepository<'c> {
    /// Create a new repository over a connection or transaction.
    pub const fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a lot.
    ///
    /// Callers validate `quantity > 0` and `unit_cost >= 0`; the schema
    /// rejects anything else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        &mut self,
        item: &str,
        quantity: Decimal,
        unit_cost: Decimal,
        entry_date: NaiveDate,
    ) -> Result<Lot, RepositoryError> {
        let row = sqlx::query_as::<_, LotRow>(
            r"
            INSERT INTO lots (item, quantity, unit_cost, entry_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, item, quantity, unit_cost, entry_date, created_at
            ",
        )
        .bind(item)
        .bind(quantity.to_string())
        .bind(unit_cost.to_string())
        .bind(entry_date)
        .bind(Utc::now())
        .fetch_one(&mut *self.conn)
        .await?;

        row.try_into()
    }

    /// Get a lot by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, id: LotId) -> Result<Option<Lot>, RepositoryError> {
        let row = sqlx::query_as::<_, LotRow>(
            r"
            SELECT id, item, quantity, unit_cost, entry_date, created_at
            FROM lots
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(Lot::try_from).transpose()
    }

    /// Open lots of `item` in FIFO order. Empty if the item is unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lots_for(&mut self, item: &str) -> Result<Vec<Lot>, RepositoryError> {
        let rows = sqlx::query_as::<_, LotRow>(
            r"
            SELECT id, item, quantity, unit_cost, entry_date, created_at
            FROM lots
            WHERE item = ?1
            ORDER BY entry_date ASC, id ASC
            ",
        )
        .bind(item)
        .fetch_all(&mut *self.conn)
        .await?;

        into_lots(rows)
    }

    /// Total quantity on hand for `item`; zero if it has no lots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::OutOfRange` if the total is not
    /// representable, or `RepositoryError::Database` if the query fails.
    pub async fn total_quantity(&mut self, item: &str) -> Result<Decimal, RepositoryError> {
        let quantities: Vec<String> = sqlx::query_scalar(
            r"
            SELECT quantity
            FROM lots
            WHERE item = ?1
            ",
        )
        .bind(item)
        .fetch_all(&mut *self.conn)
        .await?;

        let quantities = quantities
            .iter()
            .map(|raw| decimal_column("lots.quantity", raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checked_sum("stock quantity", quantities)?)
    }

    /// List lots with filtering, in FIFO order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self, filter: &LotFilter) -> Result<Vec<Lot>, RepositoryError> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = filter.limit.unwrap_or(-1);
        let offset = filter.offset.unwrap_or(0);

        let rows = sqlx::query_as::<_, LotRow>(
            r"
            SELECT id, item, quantity, unit_cost, entry_date, created_at
            FROM lots
            WHERE
                (?1 IS NULL OR instr(item, ?1) > 0)
                AND (?2 IS NULL OR entry_date >= ?2)
                AND (?3 IS NULL OR entry_date <= ?3)
            ORDER BY entry_date ASC, id ASC
            LIMIT ?4 OFFSET ?5
            ",
        )
        .bind(filter.item.as_deref())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await?;

        into_lots(rows)
    }

    /// On-hand quantity and value of every item with open lots, by item name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_levels(&mut self) -> Result<Vec<StockLevel>, RepositoryError> {
        let lots = self.list(&LotFilter::default()).await?;

        let mut levels: BTreeMap<String, StockLevel> = BTreeMap::new();
        for lot in lots {
            let value = lot.value()?;
            let level = levels.entry(lot.item.clone()).or_insert_with(|| StockLevel {
                item: lot.item,
                quantity: Decimal::ZERO,
                value: Decimal::ZERO,
                lot_count: 0,
            });
            level.quantity = checked_sum("stock quantity", [level.quantity, lot.quantity])?;
            level.value = checked_sum("stock value", [level.value, value])?;
            level.lot_count += 1;
        }

        Ok(levels.into_values().collect())
    }

    /// Apply a consumption plan: delete exhausted lots, shrink split ones.
    ///
    /// The plan must have been built from lots read on this same connection
    /// or transaction. Each draw must match exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a drawn lot no longer exists,
    /// or `RepositoryError::Database` if a query fails.
    pub async fn apply_plan(&mut self, plan: &ConsumptionPlan) -> Result<(), RepositoryError> {
        for draw in &plan.draws {
            let result = if draw.exhausts() {
                sqlx::query("DELETE FROM lots WHERE id = ?1")
                    .bind(draw.lot_id)
                    .execute(&mut *self.conn)
                    .await?
            } else {
                sqlx::query("UPDATE lots SET quantity = ?2 WHERE id = ?1")
                    .bind(draw.lot_id)
                    .bind(draw.remaining.to_string())
                    .execute(&mut *self.conn)
                    .await?
            };

            if result.rows_affected() != 1 {
                return Err(RepositoryError::Conflict(format!(
                    "lot {} changed during consumption",
                    draw.lot_id
                )));
            }
        }

        debug!(
            item = %plan.item,
            draws = plan.draws.len(),
            consumed = %plan.consumed(),
            "Applied consumption plan"
        );

        Ok(())
    }

    /// Consume `required` units of `item`, oldest lots first.
    ///
    /// Sufficiency is not re-checked: with too little stock every lot of the
    /// item is consumed and the returned plan reports the unsatisfied
    /// remainder. Callers run an availability check first, in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if reading or updating lots fails.
    pub async fn consume(
        &mut self,
        item: &str,
        required: Decimal,
    ) -> Result<ConsumptionPlan, RepositoryError> {
        let lots = self.lots_for(item).await?;
        let plan = fifo::plan(item, &lots, required);
        self.apply_plan(&plan).await?;
        Ok(plan)
    }
}
