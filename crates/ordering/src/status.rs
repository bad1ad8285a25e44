//! Owner-driven order status transitions.

use common::{BusinessId, ItemId, OrderId};
use domain::{Order, OrderLine, OrderStatus, StatusAction};
use store::{DecrementOutcome, InventoryRepository, OrderLedger, StoreError, TransitionOutcome};
use tracing::Instrument;

use crate::error::{OrderingError, Result};

/// Moves orders through `pending -> shipped -> completed` or
/// `pending -> cancelled`.
///
/// Every transition is a compare-and-set on the stored status, so two
/// callers racing on the same order cannot both succeed.
#[derive(Clone)]
pub struct OrderStatusManager<I, L>
where
    I: InventoryRepository + Clone + 'static,
    L: OrderLedger + Clone + 'static,
{
    inventory: I,
    ledger: L,
}

impl<I, L> OrderStatusManager<I, L>
where
    I: InventoryRepository + Clone + 'static,
    L: OrderLedger + Clone + 'static,
{
    pub fn new(inventory: I, ledger: L) -> Self {
        Self { inventory, ledger }
    }

    /// `pending -> shipped`.
    #[tracing::instrument(skip(self))]
    pub async fn mark_shipped(&self, business_id: BusinessId, order_id: OrderId) -> Result<Order> {
        self.apply(business_id, order_id, StatusAction::Ship).await
    }

    /// `shipped -> completed`.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
    ) -> Result<Order> {
        self.apply(business_id, order_id, StatusAction::Complete)
            .await
    }

    /// `pending -> cancelled`, returning every line's quantity to stock.
    ///
    /// The status is claimed first so the stock is released exactly once.
    /// If releasing fails, the released lines are taken back and the order
    /// returns to `pending`. The work runs on its own task, so a caller that
    /// goes away mid-cancel cannot leave the order cancelled with its stock
    /// still taken.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, business_id: BusinessId, order_id: OrderId) -> Result<Order> {
        let this = self.clone();
        tokio::spawn(
            async move { this.cancel_and_release(business_id, order_id).await }.in_current_span(),
        )
        .await?
    }

    async fn cancel_and_release(&self, business_id: BusinessId, order_id: OrderId) -> Result<Order> {
        let (_, lines) = self
            .ledger
            .get_order(business_id, order_id)
            .await?
            .ok_or(OrderingError::OrderNotFound { order_id })?;

        let cancelled = self
            .apply(business_id, order_id, StatusAction::Cancel)
            .await?;

        if let Err(e) = self.release_lines(&lines).await {
            tracing::error!(%order_id, error = %e, "failed to release stock, reverting cancellation");
            self.revert_cancel(business_id, order_id).await;
            return Err(OrderingError::PersistenceFailed(e));
        }

        Ok(cancelled)
    }

    async fn apply(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
        action: StatusAction,
    ) -> Result<Order> {
        let outcome = self
            .ledger
            .transition_status(business_id, order_id, action.from_status(), action.to_status())
            .await?;

        match outcome {
            TransitionOutcome::Applied(order) => {
                metrics::counter!("order_transitions_total", "action" => action.as_str())
                    .increment(1);
                tracing::info!(%order_id, status = %order.status, "order status changed");
                Ok(order)
            }
            TransitionOutcome::Conflict { actual } => {
                tracing::warn!(%order_id, %action, from = %actual, "transition rejected");
                Err(OrderingError::InvalidTransition {
                    order_id,
                    from: actual,
                    action,
                })
            }
            TransitionOutcome::NotFound => Err(OrderingError::OrderNotFound { order_id }),
        }
    }

    async fn release_lines(&self, lines: &[OrderLine]) -> std::result::Result<(), StoreError> {
        let mut released: Vec<(ItemId, u32)> = Vec::with_capacity(lines.len());

        for line in lines {
            let Some(item_id) = line.inventory_item_id else {
                tracing::warn!(name = %line.name, "line has no item, nothing to release");
                continue;
            };

            match self.inventory.increment(item_id, line.quantity).await {
                Ok(true) => released.push((item_id, line.quantity)),
                Ok(false) => {
                    tracing::warn!(%item_id, quantity = line.quantity, "item deleted, nothing to release");
                }
                Err(e) => {
                    self.take_back(&released).await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn take_back(&self, released: &[(ItemId, u32)]) {
        for &(item_id, quantity) in released.iter().rev() {
            match self.inventory.try_decrement(item_id, quantity).await {
                Ok(DecrementOutcome::Applied(_)) => {}
                Ok(outcome) => {
                    tracing::warn!(%item_id, quantity, ?outcome, "released stock already taken by another order");
                }
                Err(e) => {
                    tracing::error!(%item_id, quantity, error = %e, "failed to take back released stock");
                }
            }
        }
    }

    async fn revert_cancel(&self, business_id: BusinessId, order_id: OrderId) {
        let reverted = self
            .ledger
            .transition_status(
                business_id,
                order_id,
                OrderStatus::Cancelled,
                OrderStatus::Pending,
            )
            .await;
        if !matches!(reverted, Ok(TransitionOutcome::Applied(_))) {
            tracing::error!(%order_id, "order left cancelled after failed release");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReservationCoordinator;
    use domain::{LineRequest, Money, NewInventoryItem, PlaceOrder};
    use store::{BusinessDirectory, InMemoryStore};

    struct Fixture {
        store: InMemoryStore,
        manager: OrderStatusManager<InMemoryStore, InMemoryStore>,
        shop: BusinessId,
        widget: ItemId,
        order_id: OrderId,
    }

    async fn placed_order() -> Fixture {
        let store = InMemoryStore::new();
        let shop = store.register_business("Corner Shop").await.unwrap();
        let widget = store
            .insert_item(shop, NewInventoryItem::new("Widget", Money::from_cents(250), 5))
            .await
            .unwrap()
            .id;

        let coordinator = ReservationCoordinator::new(store.clone(), store.clone(), store.clone());
        let (order, _) = coordinator
            .place_order(PlaceOrder::new(
                shop,
                "Asha",
                "+911234567890",
                vec![LineRequest::new(widget, 3)],
            ))
            .await
            .unwrap();

        Fixture {
            manager: OrderStatusManager::new(store.clone(), store.clone()),
            store,
            shop,
            widget,
            order_id: order.id,
        }
    }

    #[tokio::test]
    async fn test_ship_then_complete() {
        let f = placed_order().await;

        let shipped = f.manager.mark_shipped(f.shop, f.order_id).await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let completed = f.manager.complete_order(f.shop, f.order_id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(f.store.quantity_on_hand(f.widget).await, Some(2));
    }

    #[tokio::test]
    async fn test_complete_requires_shipped() {
        let f = placed_order().await;

        let err = f.manager.complete_order(f.shop, f.order_id).await.unwrap_err();
        assert!(matches!(
            err,
            OrderingError::InvalidTransition {
                from: OrderStatus::Pending,
                action: StatusAction::Complete,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let f = placed_order().await;
        assert_eq!(f.store.quantity_on_hand(f.widget).await, Some(2));

        let cancelled = f.manager.cancel_order(f.shop, f.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(f.store.quantity_on_hand(f.widget).await, Some(5));

        // A second cancel must not release again.
        let err = f.manager.cancel_order(f.shop, f.order_id).await.unwrap_err();
        assert!(matches!(
            err,
            OrderingError::InvalidTransition {
                from: OrderStatus::Cancelled,
                ..
            }
        ));
        assert_eq!(f.store.quantity_on_hand(f.widget).await, Some(5));
    }

    #[tokio::test]
    async fn test_cancel_shipped_order_is_rejected() {
        let f = placed_order().await;
        f.manager.mark_shipped(f.shop, f.order_id).await.unwrap();

        let err = f.manager.cancel_order(f.shop, f.order_id).await.unwrap_err();
        assert!(matches!(
            err,
            OrderingError::InvalidTransition {
                from: OrderStatus::Shipped,
                action: StatusAction::Cancel,
                ..
            }
        ));
        assert_eq!(f.store.quantity_on_hand(f.widget).await, Some(2));
    }

    #[tokio::test]
    async fn test_cancel_after_item_deleted() {
        let f = placed_order().await;
        f.store.delete_item(f.shop, f.widget).await.unwrap();

        let cancelled = f.manager.cancel_order(f.shop, f.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_that_would_overflow_stock_keeps_order_pending() {
        let f = placed_order().await;
        let full = domain::InventoryUpdate {
            quantity_on_hand: Some(i64::MAX),
            ..Default::default()
        };
        f.store.update_item(f.shop, f.widget, full).await.unwrap();

        let err = f.manager.cancel_order(f.shop, f.order_id).await.unwrap_err();
        assert!(matches!(
            err,
            OrderingError::PersistenceFailed(StoreError::StockOverflow { .. })
        ));

        let (order, _) = f.store.get_order(f.shop, f.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(f.store.quantity_on_hand(f.widget).await, Some(i64::MAX));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let f = placed_order().await;
        let err = f
            .manager
            .mark_shipped(f.shop, OrderId::new(9999))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderingError::OrderNotFound { .. }));

        let other = f.store.register_business("Other Shop").await.unwrap();
        let err = f.manager.cancel_order(other, f.order_id).await.unwrap_err();
        assert!(matches!(err, OrderingError::OrderNotFound { .. }));
    }
}
