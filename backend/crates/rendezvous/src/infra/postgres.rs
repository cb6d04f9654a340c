//! PostgreSQL Repository Implementations
//!
//! Each registry operation is either one conditional statement or one
//! transaction that locks the rows it reads (`FOR UPDATE`). The claim path
//! uses `FOR UPDATE SKIP LOCKED`, so two claimers never get the same slot;
//! the loser sees no waiting slot and creates its own.

use crate::domain::entities::{Entry, EntryKind};
use crate::domain::repository::{
    AnonymousSlot, CodeRegistry, DirectedSlot, IdentityRepository,
};
use crate::domain::value_objects::{Code, Identity, PairKey};
use crate::error::{RendezvousError, RendezvousResult};
use sqlx::{PgPool, Postgres, Transaction};

const KIND_ANONYMOUS: i16 = 0;
const KIND_DIRECTED: i16 = 1;

/// Transaction-scoped advisory lock key for anonymous slot requests
const ANONYMOUS_SLOT_LOCK: i64 = 0x5244_565A_534C_4F54;

const CLAIM_WAITING_SQL: &str = r#"
    UPDATE rendezvous_entries
    SET parties = 2
    WHERE parties = 1
      AND code = (
        SELECT code
        FROM rendezvous_entries
        WHERE kind = $1 AND parties = 1 AND expires_at_ms > $2
        ORDER BY created_at_ms, code
        LIMIT 1
        FOR UPDATE SKIP LOCKED
      )
    RETURNING code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRendezvousRepository {
    pool: PgPool,
}

impl PgRendezvousRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_row(
        tx: &mut Transaction<'_, Postgres>,
        entry: &Entry,
    ) -> RendezvousResult<bool> {
        let columns = EntryColumns::from(entry);
        let inserted = sqlx::query(
            r#"
            INSERT INTO rendezvous_entries (
                code,
                kind,
                parties,
                sender,
                receiver,
                pair_low,
                pair_high,
                accepted,
                created_at_ms,
                expires_at_ms
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(entry.code.as_str())
        .bind(columns.kind)
        .bind(columns.parties)
        .bind(columns.sender)
        .bind(columns.receiver)
        .bind(columns.pair_low)
        .bind(columns.pair_high)
        .bind(columns.accepted)
        .bind(entry.created_at_ms)
        .bind(entry.expires_at_ms)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn evict_expired_code(
        tx: &mut Transaction<'_, Postgres>,
        code: &Code,
        now_ms: i64,
    ) -> RendezvousResult<()> {
        sqlx::query("DELETE FROM rendezvous_entries WHERE code = $1 AND expires_at_ms <= $2")
            .bind(code.as_str())
            .bind(now_ms)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn evict_expired_pair(
        tx: &mut Transaction<'_, Postgres>,
        pair: &PairKey,
        now_ms: i64,
    ) -> RendezvousResult<()> {
        sqlx::query(
            r#"
            DELETE FROM rendezvous_entries
            WHERE kind = $1 AND pair_low = $2 AND pair_high = $3 AND expires_at_ms <= $4
            "#,
        )
        .bind(KIND_DIRECTED)
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .bind(now_ms)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn select_directed_for_update(
        tx: &mut Transaction<'_, Postgres>,
        pair: &PairKey,
        now_ms: i64,
    ) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            FROM rendezvous_entries
            WHERE kind = $1 AND pair_low = $2 AND pair_high = $3 AND expires_at_ms > $4
            FOR UPDATE
            "#,
        )
        .bind(KIND_DIRECTED)
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .bind(now_ms)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn select_live_for_update(
        tx: &mut Transaction<'_, Postgres>,
        code: &Code,
        now_ms: i64,
    ) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            FROM rendezvous_entries
            WHERE code = $1 AND expires_at_ms > $2
            FOR UPDATE
            "#,
        )
        .bind(code.as_str())
        .bind(now_ms)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }
}

impl CodeRegistry for PgRendezvousRepository {
    async fn insert(&self, entry: &Entry, now_ms: i64) -> RendezvousResult<()> {
        let mut tx = self.pool.begin().await?;

        Self::evict_expired_code(&mut tx, &entry.code, now_ms).await?;
        if let Some(pair) = entry.pair_key() {
            Self::evict_expired_pair(&mut tx, &pair, now_ms).await?;
        }

        if !Self::insert_row(&mut tx, entry).await? {
            let code_taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM rendezvous_entries WHERE code = $1)",
            )
            .bind(entry.code.as_str())
            .fetch_one(&mut *tx)
            .await?;

            return Err(if code_taken {
                RendezvousError::DuplicateCode
            } else {
                RendezvousError::AlreadyExists
            });
        }

        tx.commit().await?;
        tracing::debug!(code = %entry.code, "Entry stored");
        Ok(())
    }

    async fn get(&self, code: &Code, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            WITH evicted AS (
                DELETE FROM rendezvous_entries WHERE code = $1 AND expires_at_ms <= $2
            )
            SELECT code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            FROM rendezvous_entries
            WHERE code = $1 AND expires_at_ms > $2
            "#,
        )
        .bind(code.as_str())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_waiting_anonymous(&self, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            WITH evicted AS (
                DELETE FROM rendezvous_entries
                WHERE kind = $1 AND parties = 1 AND expires_at_ms <= $2
            )
            SELECT code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            FROM rendezvous_entries
            WHERE kind = $1 AND parties = 1 AND expires_at_ms > $2
            ORDER BY created_at_ms, code
            LIMIT 1
            "#,
        )
        .bind(KIND_ANONYMOUS)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn claim_waiting_anonymous(&self, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(CLAIM_WAITING_SQL)
            .bind(KIND_ANONYMOUS)
            .bind(now_ms)
            .fetch_optional(&self.pool)
            .await?;

        let claimed = row.map(EntryRow::into_entry).transpose()?;
        if let Some(entry) = &claimed {
            tracing::debug!(code = %entry.code, "Claimed waiting slot");
        }
        Ok(claimed)
    }

    async fn claim_or_insert_anonymous(
        &self,
        candidate: &Entry,
        now_ms: i64,
    ) -> RendezvousResult<AnonymousSlot> {
        let mut tx = self.pool.begin().await?;

        // serializes slot requests so two callers cannot both miss the
        // claim and create separate waiting codes
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ANONYMOUS_SLOT_LOCK)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, EntryRow>(CLAIM_WAITING_SQL)
            .bind(KIND_ANONYMOUS)
            .bind(now_ms)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(row) = row {
            let claimed = row.into_entry()?;
            tx.commit().await?;
            tracing::debug!(code = %claimed.code, "Claimed waiting slot");
            return Ok(AnonymousSlot::Claimed(claimed));
        }

        Self::evict_expired_code(&mut tx, &candidate.code, now_ms).await?;
        if !Self::insert_row(&mut tx, candidate).await? {
            return Err(RendezvousError::DuplicateCode);
        }

        tx.commit().await?;
        tracing::debug!(code = %candidate.code, "Waiting slot stored");
        Ok(AnonymousSlot::Created(candidate.clone()))
    }

    async fn find_directed(&self, pair: &PairKey, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            WITH evicted AS (
                DELETE FROM rendezvous_entries
                WHERE kind = $1 AND pair_low = $2 AND pair_high = $3 AND expires_at_ms <= $4
            )
            SELECT code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            FROM rendezvous_entries
            WHERE kind = $1 AND pair_low = $2 AND pair_high = $3 AND expires_at_ms > $4
            "#,
        )
        .bind(KIND_DIRECTED)
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_or_insert_directed(
        &self,
        entry: &Entry,
        now_ms: i64,
    ) -> RendezvousResult<DirectedSlot> {
        let pair = entry
            .pair_key()
            .ok_or_else(|| RendezvousError::Internal("expected a directed entry".to_string()))?;

        let mut tx = self.pool.begin().await?;
        Self::evict_expired_pair(&mut tx, &pair, now_ms).await?;
        Self::evict_expired_code(&mut tx, &entry.code, now_ms).await?;

        if let Some(existing) = Self::select_directed_for_update(&mut tx, &pair, now_ms).await? {
            tx.commit().await?;
            return Ok(DirectedSlot::Existing(existing));
        }

        if Self::insert_row(&mut tx, entry).await? {
            tx.commit().await?;
            tracing::debug!(code = %entry.code, "Directed entry stored");
            return Ok(DirectedSlot::Created(entry.clone()));
        }

        // lost a race for the pair, or the code is taken
        match Self::select_directed_for_update(&mut tx, &pair, now_ms).await? {
            Some(existing) => {
                tx.commit().await?;
                Ok(DirectedSlot::Existing(existing))
            }
            None => Err(RendezvousError::DuplicateCode),
        }
    }

    async fn update<F>(&self, code: &Code, now_ms: i64, mutate: F) -> RendezvousResult<Entry>
    where
        F: FnOnce(&mut Entry) -> RendezvousResult<()> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let mut next = Self::select_live_for_update(&mut tx, code, now_ms)
            .await?
            .ok_or(RendezvousError::NotFound)?;

        mutate(&mut next)?;
        next.code = code.clone();

        let columns = EntryColumns::from(&next);
        let result = sqlx::query(
            r#"
            UPDATE rendezvous_entries
            SET kind = $2,
                parties = $3,
                sender = $4,
                receiver = $5,
                pair_low = $6,
                pair_high = $7,
                accepted = $8,
                created_at_ms = $9,
                expires_at_ms = $10
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .bind(columns.kind)
        .bind(columns.parties)
        .bind(columns.sender)
        .bind(columns.receiver)
        .bind(columns.pair_low)
        .bind(columns.pair_high)
        .bind(columns.accepted)
        .bind(next.created_at_ms)
        .bind(next.expires_at_ms)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(RendezvousError::AlreadyExists);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(next)
    }

    async fn remove(&self, code: &Code) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            DELETE FROM rendezvous_entries
            WHERE code = $1
            RETURNING code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn remove_if<P>(
        &self,
        code: &Code,
        now_ms: i64,
        predicate: P,
    ) -> RendezvousResult<Option<Entry>>
    where
        P: FnOnce(&Entry) -> bool + Send,
    {
        let mut tx = self.pool.begin().await?;
        let Some(entry) = Self::select_live_for_update(&mut tx, code, now_ms).await? else {
            return Ok(None);
        };
        if !predicate(&entry) {
            return Ok(None);
        }

        sqlx::query("DELETE FROM rendezvous_entries WHERE code = $1")
            .bind(code.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn remove_directed(
        &self,
        pair: &PairKey,
        now_ms: i64,
    ) -> RendezvousResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            DELETE FROM rendezvous_entries
            WHERE kind = $1 AND pair_low = $2 AND pair_high = $3
            RETURNING code, kind, parties, sender, receiver, accepted, created_at_ms, expires_at_ms
            "#,
        )
        .bind(KIND_DIRECTED)
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .fetch_optional(&self.pool)
        .await?;

        // an expired row is deleted all the same but reported as absent
        Ok(row
            .map(EntryRow::into_entry)
            .transpose()?
            .filter(|entry| entry.is_live(now_ms)))
    }

    async fn remove_expired_before(&self, now_ms: i64) -> RendezvousResult<u64> {
        let removed = sqlx::query("DELETE FROM rendezvous_entries WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed)
    }

    async fn count(&self) -> RendezvousResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rendezvous_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl IdentityRepository for PgRendezvousRepository {
    async fn register(&self, identity: &Identity, now_ms: i64) -> RendezvousResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO rendezvous_identities (identity, created_at_ms)
            VALUES ($1, $2)
            ON CONFLICT (identity) DO NOTHING
            "#,
        )
        .bind(identity.as_str())
        .bind(now_ms)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(RendezvousError::AlreadyExists);
        }
        Ok(())
    }

    async fn exists(&self, identity: &Identity) -> RendezvousResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM rendezvous_identities WHERE identity = $1)",
        )
        .bind(identity.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

/// Entry flattened into table columns
struct EntryColumns<'a> {
    kind: i16,
    parties: i16,
    sender: Option<&'a str>,
    receiver: Option<&'a str>,
    pair_low: Option<String>,
    pair_high: Option<String>,
    accepted: bool,
}

impl<'a> From<&'a Entry> for EntryColumns<'a> {
    fn from(entry: &'a Entry) -> Self {
        match &entry.kind {
            EntryKind::Anonymous { parties } => Self {
                kind: KIND_ANONYMOUS,
                parties: i16::from(*parties),
                sender: None,
                receiver: None,
                pair_low: None,
                pair_high: None,
                accepted: false,
            },
            EntryKind::Directed {
                sender,
                receiver,
                accepted,
            } => {
                let pair = PairKey::new(sender.clone(), receiver.clone());
                Self {
                    kind: KIND_DIRECTED,
                    parties: 2,
                    sender: Some(sender.as_str()),
                    receiver: Some(receiver.as_str()),
                    pair_low: Some(pair.low().to_string()),
                    pair_high: Some(pair.high().to_string()),
                    accepted: *accepted,
                }
            }
        }
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct EntryRow {
    code: String,
    kind: i16,
    parties: i16,
    sender: Option<String>,
    receiver: Option<String>,
    accepted: bool,
    created_at_ms: i64,
    expires_at_ms: i64,
}

impl EntryRow {
    fn into_entry(self) -> RendezvousResult<Entry> {
        let kind = match (self.kind, self.sender, self.receiver) {
            (KIND_ANONYMOUS, _, _) => EntryKind::Anonymous {
                parties: u8::try_from(self.parties).map_err(|_| {
                    RendezvousError::Internal(format!("invalid parties {}", self.parties))
                })?,
            },
            (KIND_DIRECTED, Some(sender), Some(receiver)) => EntryKind::Directed {
                sender: Identity::from_db(sender),
                receiver: Identity::from_db(receiver),
                accepted: self.accepted,
            },
            (kind, _, _) => {
                return Err(RendezvousError::Internal(format!(
                    "malformed entry row {} (kind {kind})",
                    self.code
                )));
            }
        };

        Ok(Entry {
            code: Code::new(self.code),
            kind,
            created_at_ms: self.created_at_ms,
            expires_at_ms: self.expires_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // What an INSERT of `entry` reads back as
    fn stored(entry: &Entry) -> EntryRow {
        let columns = EntryColumns::from(entry);
        EntryRow {
            code: entry.code.as_str().to_string(),
            kind: columns.kind,
            parties: columns.parties,
            sender: columns.sender.map(str::to_string),
            receiver: columns.receiver.map(str::to_string),
            accepted: columns.accepted,
            created_at_ms: entry.created_at_ms,
            expires_at_ms: entry.expires_at_ms,
        }
    }

    fn identity(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    #[test]
    fn test_anonymous_columns() {
        let mut entry = Entry::anonymous(Code::new("ABC123"), 1_000, 60_000);
        let columns = EntryColumns::from(&entry);
        assert_eq!(columns.kind, KIND_ANONYMOUS);
        assert_eq!(columns.parties, 1);
        assert!(columns.sender.is_none() && columns.receiver.is_none());
        assert!(columns.pair_low.is_none() && columns.pair_high.is_none());
        assert!(!columns.accepted);

        entry.claim().unwrap();
        assert_eq!(EntryColumns::from(&entry).parties, 2);
        assert_eq!(stored(&entry).into_entry().unwrap(), entry);
    }

    #[test]
    fn test_directed_columns_order_pair() {
        let mut entry = Entry::directed(
            Code::new("XYZ789"),
            identity("bob"),
            identity("alice"),
            1_000,
            300_000,
        );
        let columns = EntryColumns::from(&entry);
        assert_eq!(columns.kind, KIND_DIRECTED);
        assert_eq!(columns.parties, 2);
        assert_eq!(columns.sender, Some("bob"));
        assert_eq!(columns.receiver, Some("alice"));
        assert_eq!(columns.pair_low.as_deref(), Some("alice"));
        assert_eq!(columns.pair_high.as_deref(), Some("bob"));
        assert!(!columns.accepted);

        let pair = PairKey::new(identity("alice"), identity("bob"));
        entry.accept(&pair).unwrap();
        assert!(EntryColumns::from(&entry).accepted);

        let restored = stored(&entry).into_entry().unwrap();
        assert_eq!(restored, entry);
        assert_eq!(restored.expires_at_ms, 301_000);
    }

    #[test]
    fn test_malformed_rows_are_internal_errors() {
        let entry = Entry::directed(
            Code::new("XYZ789"),
            identity("alice"),
            identity("bob"),
            0,
            1_000,
        );

        let mut missing_receiver = stored(&entry);
        missing_receiver.receiver = None;
        assert!(matches!(
            missing_receiver.into_entry(),
            Err(RendezvousError::Internal(msg)) if msg.contains("XYZ789")
        ));

        let mut unknown_kind = stored(&entry);
        unknown_kind.kind = 7;
        assert!(matches!(
            unknown_kind.into_entry(),
            Err(RendezvousError::Internal(msg)) if msg.contains("kind 7")
        ));

        let mut bad_parties = stored(&Entry::anonymous(Code::new("ABC123"), 0, 1_000));
        bad_parties.parties = -1;
        assert!(matches!(
            bad_parties.into_entry(),
            Err(RendezvousError::Internal(_))
        ));
    }
}
