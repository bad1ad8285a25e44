//! Domain validation errors.

use common::ItemId;
use thiserror::Error;

use crate::money::Money;

/// Errors raised when a request or record fails validation, before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The order request has no lines.
    #[error("Order has no items")]
    EmptyOrder,

    /// A line requests fewer than one unit.
    #[error("Invalid quantity for item {item_id}: {quantity} (must be at least 1)")]
    InvalidQuantity { item_id: ItemId, quantity: u32 },

    /// Repeated lines for one item add up to more units than a line can hold.
    #[error("Total quantity for item {item_id} exceeds {max}", max = u32::MAX)]
    QuantityOverflow { item_id: ItemId },

    /// A required text field is blank.
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// A unit price below zero.
    #[error("Invalid price: {price} (must not be negative)")]
    NegativePrice { price: Money },

    /// A stock quantity below zero.
    #[error("Invalid stock quantity: {quantity} (must not be negative)")]
    NegativeStock { quantity: i64 },
}

/// Rejects blank text for a required field.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}
