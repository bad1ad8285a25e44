use common::ItemId;
use domain::{UnknownStatus, ValidationError};
use thiserror::Error;

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record was rejected before it reached storage.
    #[error("Invalid record: {0}")]
    Invalid(#[from] ValidationError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to a domain record.
    #[error("Corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    /// Adding stock back would overflow the item's quantity.
    #[error("Stock overflow for item {item_id}")]
    StockOverflow { item_id: ItemId },

    /// The backend refused the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<UnknownStatus> for StoreError {
    fn from(e: UnknownStatus) -> Self {
        StoreError::Corrupt {
            table: "orders",
            reason: e.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
