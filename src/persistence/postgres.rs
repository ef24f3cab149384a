//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::{CheckinRow, EventRow, ParticipantRow, ProfileRow};
use super::{
    CheckinStore, EventFilter, EventStore, IngestOutcome, ParticipantStore, ProfileStore,
};
use crate::config::GatewayConfig;
use crate::domain::{
    Checkin, CheckinReview, EventId, EventMetadata, EventRecord, EventStatus, MetadataPatch,
    NewRegistration, OnchainEvent, Participant, ParticipantWithProfile, Profile, ProfilePatch,
    SettlementSummary, TokenAmount, WalletAddress,
};
use crate::error::GatewayError;

const EVENT_SELECT: &str = "\
SELECT o.event_id, o.vault_address, o.organizer_address, o.stake_amount::text AS stake_amount, \
       o.max_participants, o.registration_deadline, o.event_date, o.transaction_hash, \
       o.block_number, \
       (m.event_id IS NOT NULL) AS has_metadata, m.title, m.description, m.image_url, m.status, \
       m.organizer_id, m.total_yield_earned::text AS total_yield_earned, \
       m.total_net_yield::text AS total_net_yield, m.settled_participants, m.settled_attended, \
       m.settled_at, pr.name AS organizer_name, \
       (SELECT COUNT(*) FROM participants p WHERE p.event_id = o.event_id) AS registered, \
       (SELECT COUNT(*) FROM participants p \
        WHERE p.event_id = o.event_id AND p.is_attended) AS attended \
FROM events_onchain o \
LEFT JOIN events_metadata m ON m.event_id = o.event_id \
LEFT JOIN profiles pr ON pr.wallet_address = o.organizer_address";

const EVENT_FILTER: &str = "\
WHERE ($1::text IS NULL OR COALESCE(m.status, 'REGISTRATION_OPEN') = $1) \
  AND ($2::text IS NULL OR o.organizer_address = $2)";

const PARTICIPANT_SELECT: &str = "\
SELECT p.id, p.event_id, p.user_id, pr.wallet_address, p.is_attended, p.is_claimed, \
       p.deposit_tx_hash, p.deposit_amount::text AS deposit_amount, p.created_at, p.updated_at, \
       pr.name, pr.email \
FROM participants p JOIN profiles pr ON pr.id = p.user_id";

const PROFILE_COLUMNS: &str = "id, wallet_address, name, email, created_at, updated_at";

const CHECKIN_COLUMNS: &str = "id, event_id, wallet_address, qr_data, checked_in_at, \
                               is_validated, validated_at, validated_by";

/// Maps a unique-constraint violation to a conflict, anything else to a
/// persistence error.
fn unique_or(e: sqlx::Error, conflict: &str) -> GatewayError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => GatewayError::conflict(conflict),
        _ => GatewayError::from(e),
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, GatewayError>
where
    T: TryFrom<R, Error = GatewayError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn as_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool sized from `config` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        tracing::info!("database migrations applied");

        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_organizer_id(&self, organizer: &WalletAddress) -> Option<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM profiles WHERE wallet_address = $1")
            .bind(organizer.as_str())
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(organizer = %organizer, error = %e, "organizer lookup failed");
                None
            })
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn create_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        let sql = format!(
            "INSERT INTO profiles (id, wallet_address, name, email) VALUES ($1, $2, $3, $4) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(wallet.as_str())
            .bind(patch.name.as_deref())
            .bind(patch.email.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or(e, "profile already exists for this wallet"))?;
        row.try_into()
    }

    async fn find_profile(&self, wallet: &WalletAddress) -> Result<Option<Profile>, GatewayError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE wallet_address = $1");
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(wallet.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    async fn update_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>, GatewayError> {
        let sql = format!(
            "UPDATE profiles SET name = COALESCE($2, name), email = COALESCE($3, email), \
             updated_at = now() WHERE wallet_address = $1 RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(wallet.as_str())
            .bind(patch.name.as_deref())
            .bind(patch.email.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    async fn upsert_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        let sql = format!(
            "INSERT INTO profiles (id, wallet_address, name, email) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (wallet_address) DO UPDATE SET \
               name = COALESCE(EXCLUDED.name, profiles.name), \
               email = COALESCE(EXCLUDED.email, profiles.email), \
               updated_at = now() \
             RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(wallet.as_str())
            .bind(patch.name.as_deref())
            .bind(patch.email.as_deref())
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn find_event(&self, event_id: EventId) -> Result<Option<EventRecord>, GatewayError> {
        let sql = format!("{EVENT_SELECT} WHERE o.event_id = $1");
        sqlx::query_as::<_, EventRow>(&sql)
            .bind(event_id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(EventRecord::try_from)
            .transpose()
    }

    async fn list_events(
        &self,
        filter: &EventFilter,
    ) -> Result<(Vec<EventRecord>, u64), GatewayError> {
        let status = filter.status.map(EventStatus::as_str);
        let organizer = filter.organizer.as_ref().map(WalletAddress::as_str);

        let count_sql = format!(
            "SELECT COUNT(*) FROM events_onchain o \
             LEFT JOIN events_metadata m ON m.event_id = o.event_id {EVENT_FILTER}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(status)
            .bind(organizer)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{EVENT_SELECT} {EVENT_FILTER} ORDER BY o.event_id DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(status)
            .bind(organizer)
            .bind(as_i64(filter.limit))
            .bind(as_i64(filter.offset))
            .fetch_all(&self.pool)
            .await?;

        Ok((collect(rows)?, u64::try_from(total).unwrap_or(0)))
    }

    async fn list_active_events(&self) -> Result<Vec<EventRecord>, GatewayError> {
        let sql = format!(
            "{EVENT_SELECT} \
             WHERE COALESCE(m.status, 'REGISTRATION_OPEN') NOT IN ('VOIDED', 'SETTLED') \
             ORDER BY o.event_id"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn ingest_event(&self, event: &OnchainEvent) -> Result<IngestOutcome, GatewayError> {
        let organizer_id = self.find_organizer_id(&event.organizer_address).await;

        let mut tx = self.pool.begin().await?;

        let (stored_id, onchain_inserted) = sqlx::query_as::<_, (i64, bool)>(
            "INSERT INTO events_onchain \
               (event_id, vault_address, organizer_address, stake_amount, max_participants, \
                registration_deadline, event_date, transaction_hash, block_number) \
             VALUES ($1, $2, $3, $4::numeric, $5, $6, $7, $8, $9) \
             ON CONFLICT (transaction_hash) DO UPDATE SET \
               vault_address = EXCLUDED.vault_address, \
               organizer_address = EXCLUDED.organizer_address, \
               stake_amount = EXCLUDED.stake_amount, \
               max_participants = EXCLUDED.max_participants, \
               registration_deadline = EXCLUDED.registration_deadline, \
               event_date = EXCLUDED.event_date, \
               block_number = COALESCE(EXCLUDED.block_number, events_onchain.block_number), \
               indexed_at = now() \
             RETURNING event_id, (xmax = 0) AS inserted",
        )
        .bind(event.event_id.get())
        .bind(event.vault_address.as_str())
        .bind(event.organizer_address.as_str())
        .bind(event.stake_amount.as_str())
        .bind(event.max_participants)
        .bind(event.registration_deadline)
        .bind(event.event_date)
        .bind(event.transaction_hash.as_str())
        .bind(event.block_number)
        .fetch_one(&mut *tx)
        .await?;

        let stored_id = EventId::new(stored_id);
        let created = sqlx::query(
            "INSERT INTO events_metadata (event_id, title, status, organizer_id) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(stored_id.get())
        .bind(EventMetadata::placeholder_title(stored_id))
        .bind(EventStatus::RegistrationOpen.as_str())
        .bind(organizer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(IngestOutcome {
            event_id: stored_id,
            onchain_inserted,
            metadata_created: created.rows_affected() == 1,
        })
    }

    async fn save_metadata(
        &self,
        event_id: EventId,
        patch: &MetadataPatch,
        organizer_id: Option<Uuid>,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO events_metadata (event_id, title, description, image_url, organizer_id) \
             VALUES ($1, COALESCE($2, $5), $3, $4, $6) \
             ON CONFLICT (event_id) DO UPDATE SET \
               title = COALESCE($2, events_metadata.title), \
               description = COALESCE($3, events_metadata.description), \
               image_url = COALESCE($4, events_metadata.image_url), \
               organizer_id = COALESCE(events_metadata.organizer_id, $6), \
               updated_at = now()",
        )
        .bind(event_id.get())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.image_url.as_deref())
        .bind(EventMetadata::placeholder_title(event_id))
        .bind(organizer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn compare_and_set_status(
        &self,
        event_id: EventId,
        expected: EventStatus,
        next: EventStatus,
    ) -> Result<bool, GatewayError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO events_metadata (event_id, title) VALUES ($1, $2) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id.get())
        .bind(EventMetadata::placeholder_title(event_id))
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE events_metadata SET status = $3, updated_at = now() \
             WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id.get())
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn settle_event(
        &self,
        event_id: EventId,
        expected: EventStatus,
        total_yield_earned: &TokenAmount,
        total_net_yield: &TokenAmount,
    ) -> Result<Option<SettlementSummary>, GatewayError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO events_metadata (event_id, title) VALUES ($1, $2) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id.get())
        .bind(EventMetadata::placeholder_title(event_id))
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, (String, String, i64, i64, DateTime<Utc>)>(
            "UPDATE events_metadata SET \
               status = 'SETTLED', \
               total_yield_earned = $3::numeric, \
               total_net_yield = $4::numeric, \
               settled_participants = (SELECT COUNT(*) FROM participants p WHERE p.event_id = $1), \
               settled_attended = (SELECT COUNT(*) FROM participants p \
                                   WHERE p.event_id = $1 AND p.is_attended), \
               settled_at = now(), \
               updated_at = now() \
             WHERE event_id = $1 AND status = $2 \
             RETURNING total_yield_earned::text, total_net_yield::text, \
                       settled_participants, settled_attended, settled_at",
        )
        .bind(event_id.get())
        .bind(expected.as_str())
        .bind(total_yield_earned.as_str())
        .bind(total_net_yield.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((earned, net, participants, attended, settled_at)) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        tx.commit().await?;

        super::models::settlement_from_columns(
            Some(&earned),
            Some(&net),
            Some(participants),
            Some(attended),
            Some(settled_at),
        )
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for PostgresStore {
    async fn register_participant(
        &self,
        registration: &NewRegistration,
        max_participants: i64,
    ) -> Result<Participant, GatewayError> {
        let event_id = registration.event_id;
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent registrations for one event.
        let locked = sqlx::query_scalar::<_, i64>(
            "SELECT event_id FROM events_onchain WHERE event_id = $1 FOR UPDATE",
        )
        .bind(event_id.get())
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(GatewayError::EventNotFound(event_id));
        }

        let already = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM participants WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id.get())
        .bind(registration.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(GatewayError::conflict("user already registered for this event"));
        }

        let registered =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants WHERE event_id = $1")
                .bind(event_id.get())
                .fetch_one(&mut *tx)
                .await?;
        if registered >= max_participants {
            return Err(GatewayError::conflict("event is full"));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO participants (id, event_id, user_id, deposit_tx_hash, deposit_amount) \
             VALUES ($1, $2, $3, $4, $5::numeric)",
        )
        .bind(id)
        .bind(event_id.get())
        .bind(registration.user_id)
        .bind(registration.deposit_tx_hash.as_str())
        .bind(registration.deposit_amount.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_or(e, "user already registered for this event"))?;

        let sql = format!("{PARTICIPANT_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ParticipantRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(ParticipantWithProfile::try_from(row)?.participant)
    }

    async fn find_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<Option<Participant>, GatewayError> {
        let sql = format!("{PARTICIPANT_SELECT} WHERE p.event_id = $1 AND pr.wallet_address = $2");
        let row = sqlx::query_as::<_, ParticipantRow>(&sql)
            .bind(event_id.get())
            .bind(wallet.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| ParticipantWithProfile::try_from(r).map(|p| p.participant))
            .transpose()
    }

    async fn withdraw_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "DELETE FROM participants p USING profiles pr \
             WHERE pr.id = p.user_id AND p.event_id = $1 AND pr.wallet_address = $2 \
               AND NOT p.is_attended",
        )
        .bind(event_id.get())
        .bind(wallet.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ParticipantWithProfile>, GatewayError> {
        let sql = format!("{PARTICIPANT_SELECT} WHERE p.event_id = $1 ORDER BY p.created_at ASC");
        let rows = sqlx::query_as::<_, ParticipantRow>(&sql)
            .bind(event_id.get())
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn attended_wallets(
        &self,
        event_id: EventId,
    ) -> Result<Vec<WalletAddress>, GatewayError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT pr.wallet_address FROM participants p JOIN profiles pr ON pr.id = p.user_id \
             WHERE p.event_id = $1 AND p.is_attended ORDER BY p.created_at ASC",
        )
        .bind(event_id.get())
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|raw| {
                WalletAddress::parse(raw).map_err(|e| {
                    GatewayError::PersistenceError(format!("corrupt profiles row: {e}"))
                })
            })
            .collect()
    }

    async fn mark_attended(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "UPDATE participants p SET is_attended = TRUE, updated_at = now() FROM profiles pr \
             WHERE pr.id = p.user_id AND p.event_id = $1 AND pr.wallet_address = $2",
        )
        .bind(event_id.get())
        .bind(wallet.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_claimed(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "UPDATE participants p SET is_claimed = TRUE, updated_at = now() FROM profiles pr \
             WHERE pr.id = p.user_id AND p.event_id = $1 AND pr.wallet_address = $2 \
               AND p.is_attended AND NOT p.is_claimed",
        )
        .bind(event_id.get())
        .bind(wallet.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CheckinStore for PostgresStore {
    async fn create_checkin(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
        qr_data: &str,
    ) -> Result<Checkin, GatewayError> {
        let sql = format!(
            "INSERT INTO checkins (id, event_id, wallet_address, qr_data) VALUES ($1, $2, $3, $4) \
             RETURNING {CHECKIN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CheckinRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(event_id.get())
            .bind(wallet.as_str())
            .bind(qr_data)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or(e, "already checked in to this event"))?;
        row.try_into()
    }

    async fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, GatewayError> {
        let sql = format!("SELECT {CHECKIN_COLUMNS} FROM checkins WHERE id = $1");
        sqlx::query_as::<_, CheckinRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Checkin::try_from)
            .transpose()
    }

    async fn review_checkin(
        &self,
        id: Uuid,
        review: &CheckinReview,
    ) -> Result<Option<Checkin>, GatewayError> {
        let sql = format!(
            "UPDATE checkins SET is_validated = $2, validated_at = $3, validated_by = $4 \
             WHERE id = $1 AND NOT is_validated RETURNING {CHECKIN_COLUMNS}"
        );
        sqlx::query_as::<_, CheckinRow>(&sql)
            .bind(id)
            .bind(review.is_valid)
            .bind(review.reviewed_at)
            .bind(review.reviewer.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Checkin::try_from)
            .transpose()
    }

    async fn list_checkins(&self, event_id: EventId) -> Result<Vec<Checkin>, GatewayError> {
        let sql = format!(
            "SELECT {CHECKIN_COLUMNS} FROM checkins WHERE event_id = $1 ORDER BY checked_in_at DESC"
        );
        let rows = sqlx::query_as::<_, CheckinRow>(&sql)
            .bind(event_id.get())
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }
}
