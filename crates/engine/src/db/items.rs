//! Database operations for the known-items registry.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use lot_costing_core::KnownItemId;

use super::RepositoryError;
use crate::models::KnownItem;

#[derive(Debug, sqlx::FromRow)]
struct KnownItemRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<KnownItemRow> for KnownItem {
    fn from(row: KnownItemRow) -> Self {
        Self {
            id: KnownItemId::new(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Repository for item names that have been received.
pub struct KnownItemRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> KnownItemRepository<'c> {
    /// Create a new repository over a connection or transaction.
    pub const fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Register an item name. Registering a name twice is a no-op.
    ///
    /// Returns `true` if the name was new.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn register(&mut self, name: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT OR IGNORE INTO known_items (name, created_at)
            VALUES (?1, ?2)
            ",
        )
        .bind(name)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// List all known items ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self) -> Result<Vec<KnownItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, KnownItemRow>(
            r"
            SELECT id, name, created_at
            FROM known_items
            ORDER BY name ASC
            ",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
