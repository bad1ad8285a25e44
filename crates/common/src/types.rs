use serde::{Deserialize, Serialize};

/// Declares a numeric row identifier.
///
/// Identifiers are assigned by the record store and only wrapped here with
/// `new`. They order by their numeric value, which the reservation path
/// relies on.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier as assigned by the store.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// Identifier of a registered business (the tenant that owns inventory and orders).
    BusinessId
);

row_id!(
    /// Identifier of an inventory item.
    ItemId
);

row_id!(
    /// Identifier of a placed order.
    OrderId
);
