//! Domain types for the storefront order engine.
//!
//! This crate holds the plain data the rest of the workspace moves around:
//! - `Money` in integer cents
//! - Inventory records and owner edits
//! - Orders, order lines, and the order status state machine
//! - Typed place-order requests and their validation

pub mod error;
pub mod inventory;
pub mod money;
pub mod order;

pub use common::{BusinessId, ItemId, OrderId};
pub use error::ValidationError;
pub use inventory::{InventoryRecord, InventoryUpdate, NewInventoryItem};
pub use money::Money;
pub use order::{
    LineRequest, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, PlaceOrder, StatusAction,
    UnknownStatus, totals_consistent,
};
