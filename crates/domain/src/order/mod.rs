//! Orders, their lines, and the order lifecycle.

mod record;
mod request;
mod state;

pub use record::{NewOrder, NewOrderLine, Order, OrderLine, totals_consistent};
pub use request::{LineRequest, PlaceOrder};
pub use state::{OrderStatus, StatusAction, UnknownStatus};
