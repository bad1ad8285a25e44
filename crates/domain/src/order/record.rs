//! Persisted order and line records.

use chrono::{DateTime, Utc};
use common::{BusinessId, ItemId, OrderId};
use serde::{Deserialize, Serialize};

use super::state::OrderStatus;
use crate::money::Money;

/// A committed order.
///
/// `total_amount` is fixed at creation and equals the sum of the lines'
/// `total_price`; only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub business_id: BusinessId,
    pub customer_name: String,
    pub customer_contact: String,
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// One immutable line of a committed order.
///
/// `name` and `unit_price` are snapshots taken at reservation time. The
/// item reference may dangle, or be cleared by the store, once the
/// inventory item is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub inventory_item_id: Option<ItemId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

/// A priced line that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl NewOrderLine {
    /// Prices a line from a reservation snapshot; `None` if the total overflows.
    pub fn priced(
        item_id: ItemId,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Option<Self> {
        Some(Self {
            item_id,
            name: name.into(),
            quantity,
            unit_price,
            total_price: unit_price.checked_multiply(quantity)?,
        })
    }

    /// Builds the stored line for an assigned order id.
    pub fn into_line(self, order_id: OrderId) -> OrderLine {
        OrderLine {
            order_id,
            inventory_item_id: Some(self.item_id),
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
        }
    }
}

/// An order ready to be written to the ledger in one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub business_id: BusinessId,
    pub customer_name: String,
    pub customer_contact: String,
    pub delivery_address: Option<String>,
    pub lines: Vec<NewOrderLine>,
    pub total_amount: Money,
}

impl NewOrder {
    /// Builds the order with its total; `None` if the total overflows.
    pub fn priced(
        business_id: BusinessId,
        customer_name: impl Into<String>,
        customer_contact: impl Into<String>,
        delivery_address: Option<String>,
        lines: Vec<NewOrderLine>,
    ) -> Option<Self> {
        let mut total_amount = Money::zero();
        for line in &lines {
            total_amount = total_amount.checked_add(line.total_price)?;
        }
        Some(Self {
            business_id,
            customer_name: customer_name.into(),
            customer_contact: customer_contact.into(),
            delivery_address,
            lines,
            total_amount,
        })
    }

    /// Splits into the stored order and its lines once the ledger has
    /// assigned an id and timestamp.
    pub fn into_records(self, id: OrderId, created_at: DateTime<Utc>) -> (Order, Vec<OrderLine>) {
        let order = Order {
            id,
            business_id: self.business_id,
            customer_name: self.customer_name,
            customer_contact: self.customer_contact,
            delivery_address: self.delivery_address,
            status: OrderStatus::Pending,
            total_amount: self.total_amount,
            created_at,
        };
        let lines = self.lines.into_iter().map(|l| l.into_line(id)).collect();
        (order, lines)
    }
}

/// Returns true if the order's total matches its lines and every line's
/// total matches quantity × unit price.
pub fn totals_consistent(order: &Order, lines: &[OrderLine]) -> bool {
    let lines_ok = lines
        .iter()
        .all(|l| l.unit_price.checked_multiply(l.quantity) == Some(l.total_price));
    let sum: Money = lines.iter().map(|l| l.total_price).sum();
    lines_ok && sum == order.total_amount
}
