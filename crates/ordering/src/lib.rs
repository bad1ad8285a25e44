//! Inventory reservation and order lifecycle for the storefront order engine.
//!
//! Placing an order reserves stock for every line or for none of them:
//! 1. Validate the request and resolve each item against the business
//! 2. Reserve stock item by item, in ascending item id order
//! 3. Snapshot prices from the reserved records and write the order
//!
//! If any step fails, the stock already taken is returned before the error
//! reaches the caller. Later status changes go through [`OrderStatusManager`].

pub mod coordinator;
pub mod error;
pub mod guard;
pub mod status;

pub use coordinator::ReservationCoordinator;
pub use error::{OrderingError, Result};
pub use guard::ReservationGuard;
pub use status::OrderStatusManager;
