//! Reservation coordinator for placing orders.

use std::time::Instant;

use common::{BusinessId, ItemId, OrderId};
use domain::{LineRequest, NewOrder, NewOrderLine, Order, OrderLine, PlaceOrder};
use store::{BusinessDirectory, DecrementOutcome, InventoryRepository, OrderLedger};
use tracing::Instrument;

use crate::error::{OrderingError, Result};
use crate::guard::ReservationGuard;

/// Places orders against shared inventory.
///
/// Stock for the whole basket is reserved or none of it is. Items are
/// reserved in ascending id order, so two baskets that overlap always
/// contend for their shared items in the same sequence.
///
/// Each placement runs on its own task. A caller that stops waiting does
/// not interrupt it: the order is either written or its stock is returned.
#[derive(Clone)]
pub struct ReservationCoordinator<I, L, D>
where
    I: InventoryRepository + Clone + 'static,
    L: OrderLedger + Clone + 'static,
    D: BusinessDirectory + Clone + 'static,
{
    inventory: I,
    ledger: L,
    directory: D,
}

impl<I, L, D> ReservationCoordinator<I, L, D>
where
    I: InventoryRepository + Clone + 'static,
    L: OrderLedger + Clone + 'static,
    D: BusinessDirectory + Clone + 'static,
{
    /// Creates a new reservation coordinator.
    pub fn new(inventory: I, ledger: L, directory: D) -> Self {
        Self {
            inventory,
            ledger,
            directory,
        }
    }

    /// Reserves stock for every line, prices the order from the reserved
    /// records and writes it as `pending`.
    ///
    /// On any error the inventory is left as it was before the call, or the
    /// error is [`OrderingError::StockNotReleased`] naming the items that
    /// still hold stock.
    #[tracing::instrument(skip(self, request), fields(business_id = %request.business_id, lines = request.lines.len()))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<(Order, Vec<OrderLine>)> {
        let this = self.clone();
        tokio::spawn(async move { this.place_and_observe(request).await }.in_current_span())
            .await?
    }

    async fn place_and_observe(&self, request: PlaceOrder) -> Result<(Order, Vec<OrderLine>)> {
        let start = Instant::now();
        let result = self.reserve_and_record(request).await;

        match &result {
            Ok((order, _)) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id = %order.id, total = %order.total_amount, "order placed");
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total", "reason" => e.kind()).increment(1);
                tracing::warn!(error = %e, "order rejected");
            }
        }
        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn reserve_and_record(&self, request: PlaceOrder) -> Result<(Order, Vec<OrderLine>)> {
        request.validate()?;

        let business_id = request.business_id;
        if !self.directory.business_exists(business_id).await? {
            return Err(OrderingError::BusinessNotFound { business_id });
        }

        let mut lines = request.coalesced_lines()?;
        for line in &lines {
            if !self
                .directory
                .item_belongs_to(business_id, line.item_id)
                .await?
            {
                return Err(OrderingError::ItemNotFound {
                    item_id: line.item_id,
                });
            }
        }
        lines.sort_by_key(|line| line.item_id);

        let mut guard = ReservationGuard::new(self.inventory.clone());
        let mut priced = Vec::with_capacity(lines.len());

        for line in &lines {
            match self.reserve_line(line).await {
                Ok(order_line) => {
                    guard.record(line.item_id, line.quantity);
                    match order_line {
                        Some(order_line) => priced.push(order_line),
                        None => {
                            let cause = OrderingError::AmountOverflow {
                                item_id: line.item_id,
                            };
                            return Err(abandon(guard, cause).await);
                        }
                    }
                }
                Err(e) => return Err(abandon(guard, e).await),
            }
        }

        let Some(new_order) = NewOrder::priced(
            business_id,
            request.customer_name,
            request.customer_contact,
            request.delivery_address,
            priced,
        ) else {
            let item_id = lines.last().map_or(ItemId::new(0), |l| l.item_id);
            return Err(abandon(guard, OrderingError::AmountOverflow { item_id }).await);
        };

        match self.ledger.record_order(new_order).await {
            Ok(recorded) => {
                guard.commit();
                Ok(recorded)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to record order, releasing stock");
                Err(abandon(guard, OrderingError::PersistenceFailed(e)).await)
            }
        }
    }

    /// Takes stock for one line. `Ok(None)` means the stock was taken but
    /// the line total overflowed.
    async fn reserve_line(&self, line: &LineRequest) -> Result<Option<NewOrderLine>> {
        match self
            .inventory
            .try_decrement(line.item_id, line.quantity)
            .await
            .map_err(OrderingError::PersistenceFailed)?
        {
            DecrementOutcome::Applied(snapshot) => Ok(NewOrderLine::priced(
                snapshot.id,
                snapshot.name,
                line.quantity,
                snapshot.unit_price,
            )),
            DecrementOutcome::InsufficientStock { available } => {
                Err(OrderingError::InsufficientStock {
                    item_id: line.item_id,
                    requested: line.quantity,
                    available,
                })
            }
            DecrementOutcome::NotFound => Err(OrderingError::ItemNotFound {
                item_id: line.item_id,
            }),
        }
    }

    /// Loads an order with its lines.
    pub async fn get_order(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderLine>)> {
        self.ledger
            .get_order(business_id, order_id)
            .await?
            .ok_or(OrderingError::OrderNotFound { order_id })
    }

    /// Lists a business's orders, newest first.
    pub async fn list_orders(&self, business_id: BusinessId) -> Result<Vec<Order>> {
        if !self.directory.business_exists(business_id).await? {
            return Err(OrderingError::BusinessNotFound { business_id });
        }
        Ok(self.ledger.list_orders(business_id).await?)
    }
}

/// Rolls the guard back and folds any stock it could not return into the error.
async fn abandon<I>(guard: ReservationGuard<I>, cause: OrderingError) -> OrderingError
where
    I: InventoryRepository + Clone + 'static,
{
    let item_ids = guard.rollback().await;
    if item_ids.is_empty() {
        return cause;
    }
    tracing::error!(?item_ids, error = %cause, "placement failed with stock still reserved");
    OrderingError::StockNotReleased {
        item_ids,
        cause: Box::new(cause),
    }
}
