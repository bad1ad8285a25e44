//! Inventory records and owner edits.

use common::{BusinessId, ItemId};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, require};
use crate::money::Money;

/// A stock record owned by one business.
///
/// `quantity_on_hand` is never negative; reservations change it only
/// through the repository's conditional decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: ItemId,
    pub business_id: BusinessId,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_price: Money,
    pub quantity_on_hand: i64,
    pub unit: Option<String>,
}

impl InventoryRecord {
    /// Returns true if `amount` units can be taken from stock.
    pub fn can_supply(&self, amount: u32) -> bool {
        self.quantity_on_hand >= i64::from(amount)
    }
}

/// Fields for a new inventory item; the id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub unit_price: Money,
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewInventoryItem {
    /// Creates a new item with the required fields.
    pub fn new(name: impl Into<String>, unit_price: Money, quantity_on_hand: i64) -> Self {
        Self {
            name: name.into(),
            sku: None,
            category: None,
            unit_price,
            quantity_on_hand,
            unit: None,
        }
    }

    /// Sets the stock-keeping unit code.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Sets the unit of measure (pcs, kg, bottle, ...).
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Checks the item before it is stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        check_price(self.unit_price)?;
        check_stock(self.quantity_on_hand)
    }

    /// Builds the stored record once an id has been assigned.
    pub fn into_record(self, id: ItemId, business_id: BusinessId) -> InventoryRecord {
        InventoryRecord {
            id,
            business_id,
            name: self.name,
            sku: self.sku,
            category: self.category,
            unit_price: self.unit_price,
            quantity_on_hand: self.quantity_on_hand,
            unit: self.unit,
        }
    }
}

/// A partial owner edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub quantity_on_hand: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl InventoryUpdate {
    /// Checks the edit before it is applied.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(price) = self.unit_price {
            check_price(price)?;
        }
        if let Some(quantity) = self.quantity_on_hand {
            check_stock(quantity)?;
        }
        Ok(())
    }

    /// Applies the edit to a record in place.
    pub fn apply_to(&self, record: &mut InventoryRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(price) = self.unit_price {
            record.unit_price = price;
        }
        if let Some(quantity) = self.quantity_on_hand {
            record.quantity_on_hand = quantity;
        }
        if let Some(category) = &self.category {
            record.category = Some(category.clone());
        }
    }
}

fn check_price(price: Money) -> Result<(), ValidationError> {
    if price.is_negative() {
        return Err(ValidationError::NegativePrice { price });
    }
    Ok(())
}

fn check_stock(quantity: i64) -> Result<(), ValidationError> {
    if quantity < 0 {
        return Err(ValidationError::NegativeStock { quantity });
    }
    Ok(())
}
