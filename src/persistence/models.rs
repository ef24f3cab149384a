//! Row types returned by the PostgreSQL queries and their conversion into
//! domain values.
//!
//! Numeric columns are selected as `::text` so amounts keep full precision.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Checkin, EventId, EventMetadata, EventRecord, EventStatus, OnchainEvent, Participant,
    ParticipantCounts, ParticipantWithProfile, Profile, SettlementSummary, TokenAmount, TxHash,
    WalletAddress,
};
use crate::error::GatewayError;

fn corrupt(table: &str, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::PersistenceError(format!("corrupt {table} row: {detail}"))
}

fn wallet(table: &str, raw: &str) -> Result<WalletAddress, GatewayError> {
    WalletAddress::parse(raw).map_err(|e| corrupt(table, e))
}

/// A `profiles` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    /// Primary key.
    pub id: Uuid,
    /// Lowercase wallet.
    pub wallet_address: String,
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = GatewayError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            wallet_address: wallet("profiles", &row.wallet_address)?,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `events_onchain` left-joined with metadata, organizer profile and
/// participant counts.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Contract event id.
    pub event_id: i64,
    /// Vault contract.
    pub vault_address: String,
    /// Organizer wallet.
    pub organizer_address: String,
    /// NUMERIC as text.
    pub stake_amount: String,
    /// Participant cap.
    pub max_participants: i64,
    /// Unix seconds.
    pub registration_deadline: i64,
    /// Unix seconds.
    pub event_date: i64,
    /// Emitting transaction.
    pub transaction_hash: String,
    /// Block of the emitting transaction.
    pub block_number: Option<i64>,
    /// `true` when a metadata row joined.
    pub has_metadata: bool,
    /// Metadata title.
    pub title: Option<String>,
    /// Metadata description.
    pub description: Option<String>,
    /// Metadata image.
    pub image_url: Option<String>,
    /// Stored status.
    pub status: Option<String>,
    /// Organizer profile id.
    pub organizer_id: Option<Uuid>,
    /// NUMERIC as text.
    pub total_yield_earned: Option<String>,
    /// NUMERIC as text.
    pub total_net_yield: Option<String>,
    /// Frozen registered count.
    pub settled_participants: Option<i64>,
    /// Frozen attended count.
    pub settled_attended: Option<i64>,
    /// Settlement time.
    pub settled_at: Option<DateTime<Utc>>,
    /// Organizer profile name.
    pub organizer_name: Option<String>,
    /// Live registered count.
    pub registered: i64,
    /// Live attended count.
    pub attended: i64,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = GatewayError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        const T: &str = "events_onchain";
        let event_id = EventId::new(row.event_id);
        let onchain = OnchainEvent {
            event_id,
            vault_address: wallet(T, &row.vault_address)?,
            organizer_address: wallet(T, &row.organizer_address)?,
            stake_amount: TokenAmount::parse_decimal(&row.stake_amount).map_err(|e| corrupt(T, e))?,
            max_participants: row.max_participants,
            registration_deadline: row.registration_deadline,
            event_date: row.event_date,
            transaction_hash: TxHash::parse(&row.transaction_hash).map_err(|e| corrupt(T, e))?,
            block_number: row.block_number,
        };

        let metadata = if row.has_metadata {
            let status: EventStatus = row
                .status
                .as_deref()
                .unwrap_or_default()
                .parse()
                .map_err(|e| corrupt("events_metadata", e))?;
            let settlement = settlement_from_columns(
                row.total_yield_earned.as_deref(),
                row.total_net_yield.as_deref(),
                row.settled_participants,
                row.settled_attended,
                row.settled_at,
            )?;
            Some(EventMetadata {
                event_id,
                title: row
                    .title
                    .unwrap_or_else(|| EventMetadata::placeholder_title(event_id)),
                description: row.description,
                image_url: row.image_url,
                status,
                organizer_id: row.organizer_id,
                settlement,
            })
        } else {
            None
        };

        Ok(Self {
            onchain,
            metadata,
            organizer_name: row.organizer_name,
            counts: ParticipantCounts {
                registered: row.registered,
                attended: row.attended,
            },
        })
    }
}

/// Settlement columns are all set together; anything partial reads as unsettled.
pub(crate) fn settlement_from_columns(
    total_yield_earned: Option<&str>,
    total_net_yield: Option<&str>,
    participants: Option<i64>,
    attended: Option<i64>,
    settled_at: Option<DateTime<Utc>>,
) -> Result<Option<SettlementSummary>, GatewayError> {
    let (Some(earned), Some(net), Some(participants), Some(attended), Some(settled_at)) =
        (total_yield_earned, total_net_yield, participants, attended, settled_at)
    else {
        return Ok(None);
    };
    Ok(Some(SettlementSummary {
        total_yield_earned: TokenAmount::parse_decimal(earned)
            .map_err(|e| corrupt("events_metadata", e))?,
        total_net_yield: TokenAmount::parse_decimal(net)
            .map_err(|e| corrupt("events_metadata", e))?,
        participants,
        attended,
        settled_at,
    }))
}

/// `participants` joined with the owning profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    /// Primary key.
    pub id: Uuid,
    /// Event joined.
    pub event_id: i64,
    /// Owning profile.
    pub user_id: Uuid,
    /// Owning wallet, from `profiles`.
    pub wallet_address: String,
    /// Attendance flag.
    pub is_attended: bool,
    /// Claim flag.
    pub is_claimed: bool,
    /// Deposit transaction.
    pub deposit_tx_hash: Option<String>,
    /// NUMERIC as text.
    pub deposit_amount: Option<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
    /// Profile name.
    pub name: Option<String>,
    /// Profile email.
    pub email: Option<String>,
}

impl TryFrom<ParticipantRow> for ParticipantWithProfile {
    type Error = GatewayError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        const T: &str = "participants";
        let participant = Participant {
            id: row.id,
            event_id: EventId::new(row.event_id),
            user_id: row.user_id,
            wallet_address: wallet(T, &row.wallet_address)?,
            is_attended: row.is_attended,
            is_claimed: row.is_claimed,
            deposit_tx_hash: row
                .deposit_tx_hash
                .as_deref()
                .map(TxHash::parse)
                .transpose()
                .map_err(|e| corrupt(T, e))?,
            deposit_amount: row
                .deposit_amount
                .as_deref()
                .map(TokenAmount::parse_decimal)
                .transpose()
                .map_err(|e| corrupt(T, e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Self {
            participant,
            name: row.name,
            email: row.email,
        })
    }
}

/// A `checkins` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckinRow {
    /// Primary key.
    pub id: Uuid,
    /// Event checked into.
    pub event_id: i64,
    /// Presenting wallet.
    pub wallet_address: String,
    /// QR payload.
    pub qr_data: String,
    /// Submission time.
    pub checked_in_at: DateTime<Utc>,
    /// Accepted flag.
    pub is_validated: bool,
    /// Review time.
    pub validated_at: Option<DateTime<Utc>>,
    /// Reviewer wallet.
    pub validated_by: Option<String>,
}

impl TryFrom<CheckinRow> for Checkin {
    type Error = GatewayError;

    fn try_from(row: CheckinRow) -> Result<Self, Self::Error> {
        const T: &str = "checkins";
        Ok(Self {
            id: row.id,
            event_id: EventId::new(row.event_id),
            wallet_address: wallet(T, &row.wallet_address)?,
            qr_data: row.qr_data,
            checked_in_at: row.checked_in_at,
            is_validated: row.is_validated,
            validated_at: row.validated_at,
            validated_by: row
                .validated_by
                .as_deref()
                .map(|raw| wallet(T, raw))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_row() -> EventRow {
        EventRow {
            event_id: 3,
            vault_address: "0x0000000000000000000000000000000000001003".to_string(),
            organizer_address: "0x2222222222222222222222222222222222222222".to_string(),
            stake_amount: "5000000".to_string(),
            max_participants: 10,
            registration_deadline: 100,
            event_date: 200,
            transaction_hash: format!("0x{:064x}", 3),
            block_number: None,
            has_metadata: false,
            title: None,
            description: None,
            image_url: None,
            status: None,
            organizer_id: None,
            total_yield_earned: None,
            total_net_yield: None,
            settled_participants: None,
            settled_attended: None,
            settled_at: None,
            organizer_name: None,
            registered: 2,
            attended: 1,
        }
    }

    #[test]
    fn event_row_without_metadata() {
        let record = EventRecord::try_from(event_row());
        assert!(matches!(record, Ok(ref r) if r.metadata.is_none() && r.counts.registered == 2));
    }

    #[test]
    fn event_row_with_bad_status_is_corrupt() {
        let mut row = event_row();
        row.has_metadata = true;
        row.status = Some("FINISHED".to_string());
        assert!(matches!(
            EventRecord::try_from(row),
            Err(GatewayError::PersistenceError(_))
        ));
    }

    #[test]
    fn partial_settlement_reads_as_unsettled() {
        let summary = settlement_from_columns(Some("1"), None, Some(1), Some(1), None);
        assert!(matches!(summary, Ok(None)));
    }
}
