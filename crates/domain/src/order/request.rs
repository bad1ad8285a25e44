//! Typed place-order requests.

use common::{BusinessId, ItemId};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, require};

/// One `(item, quantity)` entry of a place-order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

/// A customer's request to order from one business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub business_id: BusinessId,
    pub customer_name: String,
    pub customer_contact: String,
    pub delivery_address: Option<String>,
    pub lines: Vec<LineRequest>,
}

impl PlaceOrder {
    /// Creates a request with no delivery address.
    pub fn new(
        business_id: BusinessId,
        customer_name: impl Into<String>,
        customer_contact: impl Into<String>,
        lines: Vec<LineRequest>,
    ) -> Self {
        Self {
            business_id,
            customer_name: customer_name.into(),
            customer_contact: customer_contact.into(),
            delivery_address: None,
            lines,
        }
    }

    /// Sets the delivery address recorded on the order.
    pub fn with_delivery_address(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    /// Checks the request shape. Runs before any lookup or reservation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lines.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        if let Some(bad) = self.lines.iter().find(|l| l.quantity < 1) {
            return Err(ValidationError::InvalidQuantity {
                item_id: bad.item_id,
                quantity: bad.quantity,
            });
        }
        self.coalesced_lines()?;
        require("customer_name", &self.customer_name)?;
        require("customer_contact", &self.customer_contact)
    }

    /// Merges repeated items into one line each, keeping first-seen order.
    ///
    /// Fails if the summed quantity of an item does not fit in a line.
    pub fn coalesced_lines(&self) -> Result<Vec<LineRequest>, ValidationError> {
        let mut merged: Vec<LineRequest> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match merged.iter_mut().find(|m| m.item_id == line.item_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.checked_add(line.quantity).ok_or(
                        ValidationError::QuantityOverflow {
                            item_id: line.item_id,
                        },
                    )?;
                }
                None => merged.push(*line),
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(lines: Vec<LineRequest>) -> PlaceOrder {
        PlaceOrder::new(BusinessId::new(1), "Asha", "+911234567890", lines)
    }

    #[test]
    fn test_rejects_empty_order() {
        assert_eq!(request(vec![]).validate(), Err(ValidationError::EmptyOrder));
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let req = request(vec![
            LineRequest::new(ItemId::new(1), 2),
            LineRequest::new(ItemId::new(2), 0),
        ]);
        assert_eq!(
            req.validate(),
            Err(ValidationError::InvalidQuantity {
                item_id: ItemId::new(2),
                quantity: 0
            })
        );
    }

    #[test]
    fn test_rejects_blank_customer() {
        let req = PlaceOrder::new(
            BusinessId::new(1),
            "",
            "x",
            vec![LineRequest::new(ItemId::new(1), 1)],
        );
        assert_eq!(
            req.validate(),
            Err(ValidationError::MissingField {
                field: "customer_name"
            })
        );
    }

    #[test]
    fn test_coalesces_repeated_items() {
        let req = request(vec![
            LineRequest::new(ItemId::new(5), 1),
            LineRequest::new(ItemId::new(2), 2),
            LineRequest::new(ItemId::new(5), 3),
        ]);
        assert_eq!(
            req.coalesced_lines().unwrap(),
            vec![
                LineRequest::new(ItemId::new(5), 4),
                LineRequest::new(ItemId::new(2), 2),
            ]
        );
    }

    #[test]
    fn test_rejects_repeated_lines_that_overflow() {
        let req = request(vec![
            LineRequest::new(ItemId::new(3), u32::MAX),
            LineRequest::new(ItemId::new(3), u32::MAX),
        ]);
        assert_eq!(
            req.validate(),
            Err(ValidationError::QuantityOverflow {
                item_id: ItemId::new(3)
            })
        );
    }
}
