//! Type-safe event identifier.
//!
//! [`EventId`] is a newtype over the `uint256`-sized event counter emitted
//! by the factory contract, narrowed to `i64` to match the `BIGINT` key of
//! `events_onchain`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// On-chain event identifier.
///
/// Assigned by the contract when the event vault is created and immutable
/// thereafter. Keys both the on-chain row and its metadata row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<EventId> for i64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_plain_integer() {
        assert_eq!(EventId::new(42).to_string(), "42");
    }

    #[test]
    fn parses_from_path_segment() {
        let Ok(id) = " 7 ".parse::<EventId>() else {
            panic!("valid id");
        };
        assert_eq!(id.get(), 7);
        assert!("abc".parse::<EventId>().is_err());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&EventId::new(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }
}
