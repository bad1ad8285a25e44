//! Ordering error types.

use common::{BusinessId, ItemId, OrderId};
use domain::{OrderStatus, StatusAction, ValidationError};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by order placement and status transitions.
///
/// Every variant names the business, item or order it concerns. A failed
/// placement never leaves stock reserved, whatever the variant.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The request has no lines.
    #[error("Order has no items")]
    EmptyOrder,

    /// A line requests fewer than one unit.
    #[error("Invalid quantity for item {item_id}: {quantity}")]
    InvalidQuantity { item_id: ItemId, quantity: u32 },

    /// Any other malformed request or record.
    #[error("Invalid request: {0}")]
    Invalid(ValidationError),

    /// The order total does not fit in the money type.
    #[error("Order total overflows for item {item_id}")]
    AmountOverflow { item_id: ItemId },

    #[error("Business not found: {business_id}")]
    BusinessNotFound { business_id: BusinessId },

    /// The item is absent or belongs to another business.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// Not enough stock for one line; the whole order was rejected.
    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: u32,
        available: i64,
    },

    /// The order's current status does not allow the action.
    #[error("Cannot {action} order {order_id} in {from} state")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        action: StatusAction,
    },

    /// The store failed; any partial reservation was released first.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(StoreError),

    /// A placement failed and returning its stock failed too. The listed
    /// items still hold the units taken for it.
    #[error("{cause}; stock not released for items {}", id_list(.item_ids))]
    StockNotReleased {
        item_ids: Vec<ItemId>,
        cause: Box<OrderingError>,
    },

    /// The caller stopped waiting. The placement itself runs to completion
    /// in the background and either commits or releases its stock.
    #[error("Order placement timed out after {millis}ms")]
    Timeout { millis: u64 },
}

fn id_list(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ItemId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl OrderingError {
    /// Short snake_case name of the variant, used for metric labels and
    /// response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderingError::EmptyOrder => "empty_order",
            OrderingError::InvalidQuantity { .. } => "invalid_quantity",
            OrderingError::Invalid(ValidationError::QuantityOverflow { .. }) => "invalid_quantity",
            OrderingError::Invalid(_) => "invalid_request",
            OrderingError::AmountOverflow { .. } => "amount_overflow",
            OrderingError::BusinessNotFound { .. } => "business_not_found",
            OrderingError::ItemNotFound { .. } => "item_not_found",
            OrderingError::OrderNotFound { .. } => "order_not_found",
            OrderingError::InsufficientStock { .. } => "insufficient_stock",
            OrderingError::InvalidTransition { .. } => "invalid_transition",
            OrderingError::PersistenceFailed(_) => "persistence_failed",
            OrderingError::StockNotReleased { .. } => "stock_not_released",
            OrderingError::Timeout { .. } => "timeout",
        }
    }
}

impl From<ValidationError> for OrderingError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::EmptyOrder => OrderingError::EmptyOrder,
            ValidationError::InvalidQuantity { item_id, quantity } => {
                OrderingError::InvalidQuantity { item_id, quantity }
            }
            other => OrderingError::Invalid(other),
        }
    }
}

impl From<StoreError> for OrderingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invalid(v) => v.into(),
            other => OrderingError::PersistenceFailed(other),
        }
    }
}

impl From<tokio::task::JoinError> for OrderingError {
    fn from(e: tokio::task::JoinError) -> Self {
        OrderingError::PersistenceFailed(StoreError::Unavailable(format!(
            "background task failed: {e}"
        )))
    }
}

/// Convenience type alias for ordering results.
pub type Result<T> = std::result::Result<T, OrderingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_keep_their_kind() {
        let err: OrderingError = ValidationError::EmptyOrder.into();
        assert!(matches!(err, OrderingError::EmptyOrder));

        let err: OrderingError = StoreError::Invalid(ValidationError::InvalidQuantity {
            item_id: ItemId::new(4),
            quantity: 0,
        })
        .into();
        assert_eq!(err.kind(), "invalid_quantity");

        let err: OrderingError = ValidationError::MissingField { field: "name" }.into();
        assert_eq!(err.kind(), "invalid_request");

        let err: OrderingError = ValidationError::QuantityOverflow {
            item_id: ItemId::new(4),
        }
        .into();
        assert_eq!(err.kind(), "invalid_quantity");
    }

    #[test]
    fn test_store_failures_become_persistence_failed() {
        let err: OrderingError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(err, OrderingError::PersistenceFailed(_)));
        assert_eq!(err.kind(), "persistence_failed");
    }

    #[test]
    fn test_messages_name_the_item() {
        let err = OrderingError::InsufficientStock {
            item_id: ItemId::new(7),
            requested: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for item 7: requested 3, available 2"
        );

        let err = OrderingError::InvalidTransition {
            order_id: OrderId::new(9),
            from: OrderStatus::Shipped,
            action: StatusAction::Cancel,
        };
        assert_eq!(err.to_string(), "Cannot cancel order 9 in shipped state");
    }

    #[test]
    fn test_unreleased_stock_names_items_and_cause() {
        let err = OrderingError::StockNotReleased {
            item_ids: vec![ItemId::new(3), ItemId::new(8)],
            cause: Box::new(OrderingError::PersistenceFailed(StoreError::Unavailable(
                "down".into(),
            ))),
        };
        assert_eq!(err.kind(), "stock_not_released");
        assert_eq!(
            err.to_string(),
            "Persistence failed: Store unavailable: down; stock not released for items 3, 8"
        );
    }
}
