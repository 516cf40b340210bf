//! Unified error handling for the inventory service.

use thiserror::Error;

use lot_costing_core::{NameError, QuantityError};

use crate::db::RepositoryError;

/// Error type for inventory operations.
///
/// Insufficient stock is not an error: production reports it through
/// [`ProductionOutcome::Short`](crate::models::ProductionOutcome::Short).
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A quantity or cost was rejected.
    #[error("Invalid input: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// An item or product name was rejected.
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Persistence(#[source] RepositoryError),
}

impl From<RepositoryError> for InventoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OutOfRange(e) => Self::InvalidQuantity(e),
            other => Self::Persistence(other),
        }
    }
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(RepositoryError::Database(err))
    }
}

impl InventoryError {
    /// Whether the error was caused by caller input rather than storage.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidQuantity(_) | Self::InvalidName(_))
    }
}
