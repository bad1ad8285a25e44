//! Shared application state.

use std::time::Duration;

use ordering::{OrderStatusManager, ReservationCoordinator};
use store::{BusinessDirectory, InventoryRepository, OrderLedger};

/// A backend that serves every storage contract the API needs.
pub trait CommerceStore:
    InventoryRepository + OrderLedger + BusinessDirectory + Clone + 'static
{
}

impl<T> CommerceStore for T where
    T: InventoryRepository + OrderLedger + BusinessDirectory + Clone + 'static
{
}

/// Shared application state accessible from all handlers.
pub struct AppState<S: CommerceStore> {
    pub store: S,
    pub coordinator: ReservationCoordinator<S, S, S>,
    pub status: OrderStatusManager<S, S>,
    pub place_order_timeout: Duration,
}

impl<S: CommerceStore> AppState<S> {
    pub fn new(store: S, place_order_timeout: Duration) -> Self {
        Self {
            coordinator: ReservationCoordinator::new(store.clone(), store.clone(), store.clone()),
            status: OrderStatusManager::new(store.clone(), store.clone()),
            store,
            place_order_timeout,
        }
    }
}
