//! Drop-safe record of stock taken by one placement.

use common::ItemId;
use store::InventoryRepository;

/// Tracks every decrement applied while placing one order.
///
/// The guard must end in [`commit`](Self::commit) once the order is
/// durable, or [`rollback`](Self::rollback) on failure. If it is dropped
/// while still holding stock (the placement task panicked or was aborted),
/// the release is spawned on the current tokio runtime.
pub struct ReservationGuard<I>
where
    I: InventoryRepository + Clone + 'static,
{
    inventory: I,
    held: Vec<(ItemId, u32)>,
}

impl<I> ReservationGuard<I>
where
    I: InventoryRepository + Clone + 'static,
{
    pub fn new(inventory: I) -> Self {
        Self {
            inventory,
            held: Vec::new(),
        }
    }

    /// Records a decrement that has been applied.
    pub fn record(&mut self, item_id: ItemId, quantity: u32) {
        self.held.push((item_id, quantity));
    }

    /// Keeps the reserved stock; nothing is released.
    pub fn commit(mut self) {
        self.held.clear();
    }

    /// Returns all held stock, newest reservation first. Returns the items
    /// whose stock could not be returned; empty when everything was released.
    pub async fn rollback(mut self) -> Vec<ItemId> {
        let held = std::mem::take(&mut self.held);
        release(&self.inventory, held).await
    }
}

impl<I> Drop for ReservationGuard<I>
where
    I: InventoryRepository + Clone + 'static,
{
    fn drop(&mut self) {
        if self.held.is_empty() {
            return;
        }

        let held = std::mem::take(&mut self.held);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(lines = held.len(), "reservation dropped, releasing in background");
                let inventory = self.inventory.clone();
                handle.spawn(async move {
                    release(&inventory, held).await;
                });
            }
            Err(_) => {
                tracing::error!(?held, "reservation dropped outside a runtime, stock not released");
            }
        }
    }
}

async fn release<I: InventoryRepository>(inventory: &I, held: Vec<(ItemId, u32)>) -> Vec<ItemId> {
    let mut stuck = Vec::new();
    if held.is_empty() {
        return stuck;
    }

    metrics::counter!("reservation_rollbacks_total").increment(1);

    for (item_id, quantity) in held.into_iter().rev() {
        match inventory.increment(item_id, quantity).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(%item_id, quantity, "item deleted before its reservation was released");
            }
            Err(e) => {
                metrics::counter!("reservation_release_failures_total").increment(1);
                tracing::error!(%item_id, quantity, error = %e, "failed to release reservation");
                stuck.push(item_id);
            }
        }
    }
    stuck
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{BusinessId, InventoryUpdate, Money, NewInventoryItem};
    use store::{DecrementOutcome, InMemoryStore};

    async fn stocked(store: &InMemoryStore, quantity: i64) -> ItemId {
        store
            .insert_item(
                BusinessId::new(1),
                NewInventoryItem::new("Widget", Money::from_cents(100), quantity),
            )
            .await
            .unwrap()
            .id
    }

    async fn take(store: &InMemoryStore, guard: &mut ReservationGuard<InMemoryStore>, item: ItemId, qty: u32) {
        let outcome = store.try_decrement(item, qty).await.unwrap();
        assert!(matches!(outcome, DecrementOutcome::Applied(_)));
        guard.record(item, qty);
    }

    #[tokio::test]
    async fn test_rollback_returns_stock() {
        let store = InMemoryStore::new();
        let a = stocked(&store, 5).await;
        let b = stocked(&store, 5).await;

        let mut guard = ReservationGuard::new(store.clone());
        take(&store, &mut guard, a, 2).await;
        take(&store, &mut guard, b, 4).await;

        assert!(guard.rollback().await.is_empty());
        assert_eq!(store.quantity_on_hand(a).await, Some(5));
        assert_eq!(store.quantity_on_hand(b).await, Some(5));
    }

    #[tokio::test]
    async fn test_commit_keeps_stock() {
        let store = InMemoryStore::new();
        let a = stocked(&store, 5).await;

        let mut guard = ReservationGuard::new(store.clone());
        take(&store, &mut guard, a, 3).await;
        guard.commit();
        tokio::task::yield_now().await;

        assert_eq!(store.quantity_on_hand(a).await, Some(2));
    }

    #[tokio::test]
    async fn test_drop_releases_in_background() {
        let store = InMemoryStore::new();
        let a = stocked(&store, 5).await;

        {
            let mut guard = ReservationGuard::new(store.clone());
            take(&store, &mut guard, a, 5).await;
        }
        assert_eq!(store.quantity_on_hand(a).await, Some(0));

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.quantity_on_hand(a).await, Some(5));
    }

    #[tokio::test]
    async fn test_rollback_skips_deleted_items() {
        let store = InMemoryStore::new();
        let a = stocked(&store, 5).await;
        let b = stocked(&store, 5).await;

        let mut guard = ReservationGuard::new(store.clone());
        take(&store, &mut guard, a, 1).await;
        take(&store, &mut guard, b, 1).await;
        store.delete_item(BusinessId::new(1), a).await.unwrap();

        assert!(guard.rollback().await.is_empty());
        assert_eq!(store.quantity_on_hand(b).await, Some(5));
    }

    #[tokio::test]
    async fn test_rollback_reports_items_it_could_not_release() {
        let store = InMemoryStore::new();
        let a = stocked(&store, 5).await;
        let b = stocked(&store, 5).await;

        let mut guard = ReservationGuard::new(store.clone());
        take(&store, &mut guard, a, 1).await;
        take(&store, &mut guard, b, 1).await;

        // Topping `a` up to the limit makes giving its unit back overflow.
        let full = InventoryUpdate {
            quantity_on_hand: Some(i64::MAX),
            ..Default::default()
        };
        store.update_item(BusinessId::new(1), a, full).await.unwrap();

        assert_eq!(guard.rollback().await, vec![a]);
        assert_eq!(store.quantity_on_hand(a).await, Some(i64::MAX));
        assert_eq!(store.quantity_on_hand(b).await, Some(5));
    }
}
