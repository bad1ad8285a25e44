use async_trait::async_trait;
use common::{BusinessId, ItemId, OrderId};
use domain::{
    InventoryRecord, InventoryUpdate, NewInventoryItem, NewOrder, Order, OrderLine, OrderStatus,
};

use crate::Result;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Stock was taken. Carries the record as it stood right after the
    /// decrement, so callers can snapshot name and price from the same step.
    Applied(InventoryRecord),

    /// Not enough stock; nothing changed.
    InsufficientStock { available: i64 },

    /// No such item; nothing changed.
    NotFound,
}

/// Outcome of a guarded status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status was changed. Carries the updated order.
    Applied(Order),

    /// The order was not in the expected status; nothing changed.
    Conflict { actual: OrderStatus },

    /// No such order for this business.
    NotFound,
}

/// Durable keyed storage of stock records.
///
/// All reservation traffic goes through [`try_decrement`](Self::try_decrement)
/// and [`increment`](Self::increment); each call is linearizable per item.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Loads an item, only if it belongs to `business_id`.
    async fn get_item(
        &self,
        business_id: BusinessId,
        item_id: ItemId,
    ) -> Result<Option<InventoryRecord>>;

    /// Checks `quantity_on_hand >= amount` and subtracts `amount` as one
    /// indivisible step. Never leaves a negative quantity.
    async fn try_decrement(&self, item_id: ItemId, amount: u32) -> Result<DecrementOutcome>;

    /// Returns `amount` units to stock. Returns false if the item no longer exists.
    async fn increment(&self, item_id: ItemId, amount: u32) -> Result<bool>;

    /// Stores a new item for a business and assigns its id.
    async fn insert_item(
        &self,
        business_id: BusinessId,
        item: NewInventoryItem,
    ) -> Result<InventoryRecord>;

    /// Applies an owner edit. Returns None if the item is not the business's.
    async fn update_item(
        &self,
        business_id: BusinessId,
        item_id: ItemId,
        update: InventoryUpdate,
    ) -> Result<Option<InventoryRecord>>;

    /// Deletes an item. Historical order lines are left untouched.
    async fn delete_item(&self, business_id: BusinessId, item_id: ItemId) -> Result<bool>;

    /// Lists a business's items ordered by id.
    async fn list_items(&self, business_id: BusinessId) -> Result<Vec<InventoryRecord>>;
}

/// Durable storage of orders and their lines.
///
/// Orders are written once with all their lines; afterwards only the status
/// changes, and only through [`transition_status`](Self::transition_status).
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Writes the order and every line as one unit, assigning the order id
    /// and creation time. A partial write is never observable.
    async fn record_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>)>;

    /// Loads an order with its lines, only if it belongs to `business_id`.
    async fn get_order(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
    ) -> Result<Option<(Order, Vec<OrderLine>)>>;

    /// Lists a business's orders, newest first.
    async fn list_orders(&self, business_id: BusinessId) -> Result<Vec<Order>>;

    /// Moves the order from `from` to `to` if and only if it is currently `from`.
    async fn transition_status(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<TransitionOutcome>;
}

/// Business-ownership lookups.
#[async_trait]
pub trait BusinessDirectory: Send + Sync {
    /// Registers a business and returns its id.
    async fn register_business(&self, name: &str) -> Result<BusinessId>;

    async fn business_exists(&self, business_id: BusinessId) -> Result<bool>;

    async fn item_belongs_to(&self, business_id: BusinessId, item_id: ItemId) -> Result<bool>;
}
