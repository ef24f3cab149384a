//! Immutable on-chain event facts.
//!
//! Rows in `events_onchain` are written only by the indexer path and never
//! mutated by user-facing requests.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::address::{HexIdError, TxHash, WalletAddress};
use super::amount::{AmountError, TokenAmount};
use super::event_id::EventId;

/// Event facts emitted by the vault factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OnchainEvent {
    /// Contract-assigned identifier.
    pub event_id: EventId,
    /// Vault contract holding participant stakes.
    pub vault_address: WalletAddress,
    /// Wallet that created the event.
    pub organizer_address: WalletAddress,
    /// Stake per participant in token base units.
    pub stake_amount: TokenAmount,
    /// Participant cap enforced by the vault.
    pub max_participants: i64,
    /// Unix seconds after which registration closes.
    pub registration_deadline: i64,
    /// Unix seconds at which the event goes live.
    pub event_date: i64,
    /// Transaction that emitted the creation log.
    pub transaction_hash: TxHash,
    /// Block containing that transaction, when the indexer reports it.
    pub block_number: Option<i64>,
}

/// Raw indexer payload for a single event.
///
/// Field names follow the indexer's camelCase output; the snake_case
/// spelling is accepted as well.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IndexedEventPayload {
    /// Contract-assigned identifier.
    #[serde(alias = "eventId")]
    pub event_id: i64,
    /// Vault contract address.
    #[serde(alias = "vaultAddress", alias = "vault")]
    pub vault_address: String,
    /// Organizer wallet.
    #[serde(alias = "organizerAddress", alias = "organizer")]
    pub organizer_address: String,
    /// Stake per participant, decimal string or number.
    #[serde(alias = "stakeAmount")]
    #[schema(value_type = String)]
    pub stake_amount: serde_json::Value,
    /// Participant cap.
    #[serde(alias = "maxParticipants", alias = "max_participant")]
    pub max_participants: i64,
    /// Unix seconds.
    #[serde(alias = "registrationDeadline")]
    pub registration_deadline: i64,
    /// Unix seconds.
    #[serde(alias = "eventDate")]
    pub event_date: i64,
    /// Emitting transaction.
    #[serde(alias = "transactionHash", alias = "txHash")]
    pub transaction_hash: String,
    /// Block number, optional.
    #[serde(default, alias = "blockNumber")]
    pub block_number: Option<i64>,
}

/// Reasons an indexer payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOnchainEvent {
    /// Payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    Shape(String),
    /// Identifier was negative.
    #[error("event id must be non-negative, got {0}")]
    NegativeId(i64),
    /// An address field failed to parse.
    #[error("invalid {field}: {source}")]
    Address {
        /// Offending field name.
        field: &'static str,
        /// Parse failure.
        source: HexIdError,
    },
    /// Stake was not an integer amount.
    #[error("invalid stake_amount: {0}")]
    Stake(#[from] AmountError),
    /// Participant cap was zero or negative.
    #[error("max_participants must be positive, got {0}")]
    MaxParticipants(i64),
    /// Deadline was not strictly before the event date.
    #[error("registration_deadline {deadline} must precede event_date {event_date}")]
    Schedule {
        /// Registration deadline.
        deadline: i64,
        /// Event date.
        event_date: i64,
    },
}

impl OnchainEvent {
    /// Parses one element of an indexer batch.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOnchainEvent`] if the JSON does not match the
    /// payload shape or any field fails validation.
    pub fn from_json(value: serde_json::Value) -> Result<Self, InvalidOnchainEvent> {
        let payload: IndexedEventPayload = serde_json::from_value(value)
            .map_err(|e| InvalidOnchainEvent::Shape(e.to_string()))?;
        Self::try_from(payload)
    }
}

impl TryFrom<IndexedEventPayload> for OnchainEvent {
    type Error = InvalidOnchainEvent;

    fn try_from(p: IndexedEventPayload) -> Result<Self, Self::Error> {
        if p.event_id < 0 {
            return Err(InvalidOnchainEvent::NegativeId(p.event_id));
        }
        let vault_address = WalletAddress::parse(&p.vault_address)
            .map_err(|source| InvalidOnchainEvent::Address {
                field: "vault_address",
                source,
            })?;
        let organizer_address = WalletAddress::parse(&p.organizer_address).map_err(|source| {
            InvalidOnchainEvent::Address {
                field: "organizer_address",
                source,
            }
        })?;
        let transaction_hash = TxHash::parse(&p.transaction_hash).map_err(|source| {
            InvalidOnchainEvent::Address {
                field: "transaction_hash",
                source,
            }
        })?;
        let stake_raw = match &p.stake_amount {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        let stake_amount = TokenAmount::parse_integer(&stake_raw)?;
        if p.max_participants <= 0 {
            return Err(InvalidOnchainEvent::MaxParticipants(p.max_participants));
        }
        if p.registration_deadline >= p.event_date {
            return Err(InvalidOnchainEvent::Schedule {
                deadline: p.registration_deadline,
                event_date: p.event_date,
            });
        }

        Ok(Self {
            event_id: EventId::new(p.event_id),
            vault_address,
            organizer_address,
            stake_amount,
            max_participants: p.max_participants,
            registration_deadline: p.registration_deadline,
            event_date: p.event_date,
            transaction_hash,
            block_number: p.block_number,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "eventId": 42,
            "vaultAddress": "0x1111111111111111111111111111111111111111",
            "organizer": "0x2222222222222222222222222222222222222222",
            "stakeAmount": "5000000",
            "maxParticipants": 50,
            "registrationDeadline": 1_700_000_000_i64,
            "eventDate": 1_700_086_400_i64,
            "transactionHash": format!("0x{}", "ab".repeat(32)),
        })
    }

    #[test]
    fn parses_camel_case_payload() {
        let Ok(event) = OnchainEvent::from_json(payload()) else {
            panic!("payload should parse");
        };
        assert_eq!(event.event_id, EventId::new(42));
        assert_eq!(event.stake_amount.as_str(), "5000000");
        assert_eq!(event.block_number, None);
    }

    #[test]
    fn rejects_inverted_schedule() {
        let mut p = payload();
        p["eventDate"] = serde_json::json!(1_600_000_000_i64);
        assert!(matches!(
            OnchainEvent::from_json(p),
            Err(InvalidOnchainEvent::Schedule { .. })
        ));
    }

    #[test]
    fn rejects_fractional_stake() {
        let mut p = payload();
        p["stakeAmount"] = serde_json::json!("1.5");
        assert!(matches!(
            OnchainEvent::from_json(p),
            Err(InvalidOnchainEvent::Stake(_))
        ));
    }

    #[test]
    fn large_numeric_stake_is_exact() {
        let raw = payload()
            .to_string()
            .replace("\"5000000\"", "100000000000000000000");
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            panic!("payload is valid JSON");
        };
        let Ok(event) = OnchainEvent::from_json(value) else {
            panic!("payload should parse");
        };
        assert_eq!(event.stake_amount.as_str(), "100000000000000000000");
    }

    #[test]
    fn rejects_missing_field() {
        let mut p = payload();
        if let Some(obj) = p.as_object_mut() {
            obj.remove("vaultAddress");
        }
        assert!(matches!(
            OnchainEvent::from_json(p),
            Err(InvalidOnchainEvent::Shape(_))
        ));
    }

    #[test]
    fn rejects_bad_organizer() {
        let mut p = payload();
        p["organizer"] = serde_json::json!("0x12");
        assert!(matches!(
            OnchainEvent::from_json(p),
            Err(InvalidOnchainEvent::Address {
                field: "organizer_address",
                ..
            })
        ));
    }
}
