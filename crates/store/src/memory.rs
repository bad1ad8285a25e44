use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{BusinessId, ItemId, OrderId};
use domain::{
    InventoryRecord, InventoryUpdate, NewInventoryItem, NewOrder, Order, OrderLine, OrderStatus,
};
use tokio::sync::{Mutex, RwLock};

use crate::{
    Result, StoreError,
    repository::{
        BusinessDirectory, DecrementOutcome, InventoryRepository, OrderLedger, TransitionOutcome,
    },
};

type ItemSlot = Arc<Mutex<InventoryRecord>>;

#[derive(Debug, Clone)]
struct StoredOrder {
    order: Order,
    lines: Vec<OrderLine>,
}

/// In-memory record store.
///
/// Each inventory item sits behind its own mutex, so reservations on
/// different items never wait on each other; the item map's lock is only
/// held long enough to find the slot. Provides the same interface as the
/// PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    businesses: Arc<RwLock<HashMap<BusinessId, String>>>,
    items: Arc<RwLock<HashMap<ItemId, ItemSlot>>>,
    orders: Arc<RwLock<BTreeMap<OrderId, StoredOrder>>>,
    next_id: Arc<AtomicI64>,
    fail_on_record: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the ledger to reject every order write until reset.
    pub fn set_fail_on_record(&self, fail: bool) {
        self.fail_on_record.store(fail, Ordering::SeqCst);
    }

    /// Returns the current stock of an item, if it exists.
    pub async fn quantity_on_hand(&self, item_id: ItemId) -> Option<i64> {
        let slot = self.slot(item_id).await?;
        let record = slot.lock().await;
        Some(record.quantity_on_hand)
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Ids are shared across record kinds; only uniqueness and growth matter.
    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn slot(&self, item_id: ItemId) -> Option<ItemSlot> {
        self.items.read().await.get(&item_id).cloned()
    }
}

#[async_trait]
impl InventoryRepository for InMemoryStore {
    async fn get_item(
        &self,
        business_id: BusinessId,
        item_id: ItemId,
    ) -> Result<Option<InventoryRecord>> {
        let Some(slot) = self.slot(item_id).await else {
            return Ok(None);
        };
        let record = slot.lock().await;
        Ok((record.business_id == business_id).then(|| record.clone()))
    }

    async fn try_decrement(&self, item_id: ItemId, amount: u32) -> Result<DecrementOutcome> {
        let Some(slot) = self.slot(item_id).await else {
            return Ok(DecrementOutcome::NotFound);
        };

        let mut record = slot.lock().await;
        if !record.can_supply(amount) {
            return Ok(DecrementOutcome::InsufficientStock {
                available: record.quantity_on_hand,
            });
        }
        record.quantity_on_hand -= i64::from(amount);
        Ok(DecrementOutcome::Applied(record.clone()))
    }

    async fn increment(&self, item_id: ItemId, amount: u32) -> Result<bool> {
        let Some(slot) = self.slot(item_id).await else {
            return Ok(false);
        };
        let mut record = slot.lock().await;
        record.quantity_on_hand = record
            .quantity_on_hand
            .checked_add(i64::from(amount))
            .ok_or(StoreError::StockOverflow { item_id })?;
        Ok(true)
    }

    async fn insert_item(
        &self,
        business_id: BusinessId,
        item: NewInventoryItem,
    ) -> Result<InventoryRecord> {
        item.validate()?;
        let record = item.into_record(ItemId::new(self.allocate_id()), business_id);
        self.items
            .write()
            .await
            .insert(record.id, Arc::new(Mutex::new(record.clone())));
        Ok(record)
    }

    async fn update_item(
        &self,
        business_id: BusinessId,
        item_id: ItemId,
        update: InventoryUpdate,
    ) -> Result<Option<InventoryRecord>> {
        update.validate()?;
        let Some(slot) = self.slot(item_id).await else {
            return Ok(None);
        };
        let mut record = slot.lock().await;
        if record.business_id != business_id {
            return Ok(None);
        }
        update.apply_to(&mut record);
        Ok(Some(record.clone()))
    }

    async fn delete_item(&self, business_id: BusinessId, item_id: ItemId) -> Result<bool> {
        let mut items = self.items.write().await;
        let owned = match items.get(&item_id) {
            Some(slot) => slot.lock().await.business_id == business_id,
            None => false,
        };
        if owned {
            items.remove(&item_id);
        }
        Ok(owned)
    }

    async fn list_items(&self, business_id: BusinessId) -> Result<Vec<InventoryRecord>> {
        let slots: Vec<ItemSlot> = self.items.read().await.values().cloned().collect();
        let mut records = Vec::new();
        for slot in slots {
            let record = slot.lock().await;
            if record.business_id == business_id {
                records.push(record.clone());
            }
        }
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

#[async_trait]
impl OrderLedger for InMemoryStore {
    async fn record_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>)> {
        if self.fail_on_record.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "order ledger rejected the write".to_string(),
            ));
        }

        let mut orders = self.orders.write().await;
        let id = OrderId::new(self.allocate_id());
        let (order, lines) = order.into_records(id, Utc::now());
        orders.insert(
            id,
            StoredOrder {
                order: order.clone(),
                lines: lines.clone(),
            },
        );
        Ok((order, lines))
    }

    async fn get_order(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
    ) -> Result<Option<(Order, Vec<OrderLine>)>> {
        let orders = self.orders.read().await;
        Ok(orders
            .get(&order_id)
            .filter(|s| s.order.business_id == business_id)
            .map(|s| (s.order.clone(), s.lines.clone())))
    }

    async fn list_orders(&self, business_id: BusinessId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut listed: Vec<Order> = orders
            .values()
            .filter(|s| s.order.business_id == business_id)
            .map(|s| s.order.clone())
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(listed)
    }

    async fn transition_status(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<TransitionOutcome> {
        let mut orders = self.orders.write().await;
        let Some(stored) = orders
            .get_mut(&order_id)
            .filter(|s| s.order.business_id == business_id)
        else {
            return Ok(TransitionOutcome::NotFound);
        };

        if stored.order.status != from {
            return Ok(TransitionOutcome::Conflict {
                actual: stored.order.status,
            });
        }
        stored.order.status = to;
        Ok(TransitionOutcome::Applied(stored.order.clone()))
    }
}

#[async_trait]
impl BusinessDirectory for InMemoryStore {
    async fn register_business(&self, name: &str) -> Result<BusinessId> {
        let id = BusinessId::new(self.allocate_id());
        self.businesses.write().await.insert(id, name.to_string());
        Ok(id)
    }

    async fn business_exists(&self, business_id: BusinessId) -> Result<bool> {
        Ok(self.businesses.read().await.contains_key(&business_id))
    }

    async fn item_belongs_to(&self, business_id: BusinessId, item_id: ItemId) -> Result<bool> {
        Ok(self.get_item(business_id, item_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, NewOrderLine};

    async fn store_with_widget(quantity: i64) -> (InMemoryStore, BusinessId, ItemId) {
        let store = InMemoryStore::new();
        let business = store.register_business("Corner Shop").await.unwrap();
        let item = store
            .insert_item(
                business,
                NewInventoryItem::new("Widget", Money::from_cents(250), quantity).with_sku("widget"),
            )
            .await
            .unwrap();
        (store, business, item.id)
    }

    fn one_line_order(business: BusinessId, item: ItemId) -> NewOrder {
        let line = NewOrderLine::priced(item, "Widget", 1, Money::from_cents(250)).unwrap();
        NewOrder::priced(business, "Asha", "+91", None, vec![line]).unwrap()
    }

    #[tokio::test]
    async fn try_decrement_applies_and_returns_snapshot() {
        let (store, _, item) = store_with_widget(5).await;

        let outcome = store.try_decrement(item, 3).await.unwrap();
        let DecrementOutcome::Applied(record) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(record.quantity_on_hand, 2);
        assert_eq!(record.unit_price, Money::from_cents(250));
        assert_eq!(store.quantity_on_hand(item).await, Some(2));
    }

    #[tokio::test]
    async fn try_decrement_refuses_to_go_negative() {
        let (store, _, item) = store_with_widget(2).await;

        let outcome = store.try_decrement(item, 3).await.unwrap();
        assert_eq!(outcome, DecrementOutcome::InsufficientStock { available: 2 });
        assert_eq!(store.quantity_on_hand(item).await, Some(2));
    }

    #[tokio::test]
    async fn try_decrement_unknown_item() {
        let store = InMemoryStore::new();
        let outcome = store.try_decrement(ItemId::new(99), 1).await.unwrap();
        assert_eq!(outcome, DecrementOutcome::NotFound);
    }

    #[tokio::test]
    async fn increment_on_deleted_item_reports_false() {
        let (store, business, item) = store_with_widget(2).await;
        assert!(store.delete_item(business, item).await.unwrap());
        assert!(!store.increment(item, 1).await.unwrap());
    }

    #[tokio::test]
    async fn increment_past_i64_max_is_refused() {
        let (store, business, item) = store_with_widget(2).await;
        let update = InventoryUpdate {
            quantity_on_hand: Some(i64::MAX),
            ..Default::default()
        };
        store.update_item(business, item, update).await.unwrap();

        let result = store.increment(item, 1).await;
        assert!(matches!(result, Err(StoreError::StockOverflow { item_id }) if item_id == item));
        assert_eq!(store.quantity_on_hand(item).await, Some(i64::MAX));
    }

    #[tokio::test]
    async fn concurrent_decrements_never_oversell() {
        let (store, _, item) = store_with_widget(10).await;

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.try_decrement(item, 1).await.unwrap() })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), DecrementOutcome::Applied(_)) {
                applied += 1;
            }
        }
        assert_eq!(applied, 10);
        assert_eq!(store.quantity_on_hand(item).await, Some(0));
    }

    #[tokio::test]
    async fn get_item_is_scoped_to_business() {
        let (store, business, item) = store_with_widget(1).await;
        let other = store.register_business("Elsewhere").await.unwrap();

        assert!(store.get_item(business, item).await.unwrap().is_some());
        assert!(store.get_item(other, item).await.unwrap().is_none());
        assert!(!store.item_belongs_to(other, item).await.unwrap());
        assert!(store.item_belongs_to(business, item).await.unwrap());
    }

    #[tokio::test]
    async fn update_item_rejects_negative_stock() {
        let (store, business, item) = store_with_widget(1).await;
        let update = InventoryUpdate {
            quantity_on_hand: Some(-1),
            ..Default::default()
        };
        let result = store.update_item(business, item, update).await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn delete_item_of_other_business_is_refused() {
        let (store, _, item) = store_with_widget(1).await;
        let other = store.register_business("Elsewhere").await.unwrap();
        assert!(!store.delete_item(other, item).await.unwrap());
        assert_eq!(store.quantity_on_hand(item).await, Some(1));
    }

    #[tokio::test]
    async fn record_and_fetch_order() {
        let (store, business, item) = store_with_widget(5).await;

        let (order, lines) = store
            .record_order(one_line_order(business, item))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(lines.len(), 1);

        let (fetched, fetched_lines) = store.get_order(business, order.id).await.unwrap().unwrap();
        assert_eq!(fetched, order);
        assert_eq!(fetched_lines, lines);
    }

    #[tokio::test]
    async fn record_order_failure_stores_nothing() {
        let (store, business, item) = store_with_widget(5).await;
        store.set_fail_on_record(true);

        let result = store.record_order(one_line_order(business, item)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let (store, business, item) = store_with_widget(5).await;
        let (first, _) = store
            .record_order(one_line_order(business, item))
            .await
            .unwrap();
        let (second, _) = store
            .record_order(one_line_order(business, item))
            .await
            .unwrap();

        let listed = store.list_orders(business).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn transition_status_is_guarded() {
        let (store, business, item) = store_with_widget(5).await;
        let (order, _) = store
            .record_order(one_line_order(business, item))
            .await
            .unwrap();

        let shipped = store
            .transition_status(business, order.id, OrderStatus::Pending, OrderStatus::Shipped)
            .await
            .unwrap();
        assert!(matches!(shipped, TransitionOutcome::Applied(o) if o.status == OrderStatus::Shipped));

        let again = store
            .transition_status(business, order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(
            again,
            TransitionOutcome::Conflict {
                actual: OrderStatus::Shipped
            }
        );

        let other = store.register_business("Elsewhere").await.unwrap();
        let foreign = store
            .transition_status(other, order.id, OrderStatus::Shipped, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(foreign, TransitionOutcome::NotFound);
    }
}
