//! Version-4 UUID newtypes for every identifier that crosses a stage or
//! crate boundary. Keeping each one a distinct type (rather than passing
//! bare `Uuid`s around) means a `TradeId` can never be accidentally handed
//! to a function expecting a `RunId`.

use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID, e.g. one decoded from a persisted record.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_id!(CorrelationId, "Workflow-spanning identifier propagated across every event and log record for one pipeline invocation.");
uuid_id!(CausationId, "Identifier of the immediate upstream message that produced the current one.");
uuid_id!(RunId, "Identifies the execution of one rebalance plan.");
uuid_id!(TradeId, "Identifies one plan item being executed within a run.");
uuid_id!(PlanId, "Identifies one immutable rebalance plan.");

/// A broker-assigned order identifier. Unlike the identifiers above this is
/// not a UUID, brokers mint their own order IDs in whatever format they
/// choose, so it is a thin wrapper over the exchange-assigned string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Constructor, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_of_different_kinds_are_distinguishable_types_with_unique_values() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn order_id_accepts_exchange_assigned_strings() {
        let id: OrderId = "XNAS-12345".into();
        assert_eq!(id.as_str(), "XNAS-12345");
    }

    #[test]
    fn ids_round_trip_through_json() {
        let id = TradeId::new();
        let json = serde_json::to_string(&id).unwrap();
        let decoded: TradeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, decoded);
    }
}
