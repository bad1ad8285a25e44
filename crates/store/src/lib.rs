//! Record storage for inventory, orders, and businesses.
//!
//! The ordering engine only talks to the traits in [`repository`]; the
//! in-memory and PostgreSQL backends are interchangeable behind them.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use repository::{
    BusinessDirectory, DecrementOutcome, InventoryRepository, OrderLedger, TransitionOutcome,
};
