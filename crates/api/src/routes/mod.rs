//! HTTP handlers, one module per resource.

pub mod businesses;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod orders;
