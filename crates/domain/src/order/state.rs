//! Order lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Shipped ──► Completed
///    │
///    └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stock is reserved and the order awaits the owner.
    #[default]
    Pending,

    /// The owner has dispatched the order.
    Shipped,

    /// Delivery confirmed (terminal state).
    Completed,

    /// Cancelled before shipping; stock released (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can be marked shipped.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be completed.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns true if the order can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored and shown to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// An owner or customer action that moves an order between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Ship,
    Complete,
    Cancel,
}

impl StatusAction {
    /// The only status this action may start from.
    pub fn from_status(&self) -> OrderStatus {
        match self {
            StatusAction::Ship | StatusAction::Cancel => OrderStatus::Pending,
            StatusAction::Complete => OrderStatus::Shipped,
        }
    }

    /// The status this action leads to.
    pub fn to_status(&self) -> OrderStatus {
        match self {
            StatusAction::Ship => OrderStatus::Shipped,
            StatusAction::Complete => OrderStatus::Completed,
            StatusAction::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Returns true if the action is allowed from `current`.
    pub fn allowed_from(&self, current: OrderStatus) -> bool {
        match self {
            StatusAction::Ship => current.can_ship(),
            StatusAction::Complete => current.can_complete(),
            StatusAction::Cancel => current.can_cancel(),
        }
    }

    /// Returns the action name used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusAction::Ship => "ship",
            StatusAction::Complete => "complete",
            StatusAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for StatusAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
