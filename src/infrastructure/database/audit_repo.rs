use crate::domain::models::{AuditAction, AuditEntry};
use crate::domain::ports::audit_store::AuditTrailStore;
use crate::domain::ports::errors::StoreError;
use crate::infrastructure::database::utils::parse_datetime;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Insert one audit entry through the given transaction.
///
/// Shared by `SqliteAuditStore::append` and the instance repository's
/// transactional writes, so the append-only mapping lives in one place: a
/// duplicate (instance, sequence) primary key surfaces as
/// `AppendOnlyViolation`, everything else passes through.
pub(crate) async fn insert_entry(
    tx: &mut Transaction<'_, Sqlite>,
    entry: &AuditEntry,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r"
        INSERT INTO audit_entries (
            instance_id, sequence_number, actor_id, action,
            stage_index, stage_name, comment, attachment_ref, recorded_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(entry.instance_id.to_string())
    .bind(entry.sequence_number as i64)
    .bind(entry.actor_id.to_string())
    .bind(entry.action.as_str())
    .bind(entry.stage_index as i64)
    .bind(&entry.stage_name)
    .bind(&entry.comment)
    .bind(&entry.attachment_ref)
    .bind(entry.recorded_at.to_rfc3339())
    .execute(&mut **tx)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::AppendOnlyViolation {
                instance_id: entry.instance_id,
                sequence_number: entry.sequence_number,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// SQLite implementation of `AuditTrailStore`.
///
/// The schema carries the other half of the append-only contract: BEFORE
/// UPDATE and BEFORE DELETE triggers abort any mutation attempt, so even
/// code reaching past this type cannot rewrite history.
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Helper to convert a database row to an audit entry
    fn row_to_entry(&self, row: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry, StoreError> {
        use sqlx::Row;

        let action_raw = row.get::<String, _>("action");
        let action = AuditAction::from_str(&action_raw)
            .ok_or_else(|| StoreError::InvalidField(format!("unknown audit action '{action_raw}'")))?;

        Ok(AuditEntry {
            instance_id: Uuid::parse_str(row.get::<String, _>("instance_id").as_str())?,
            sequence_number: row.get::<i64, _>("sequence_number") as u64,
            actor_id: Uuid::parse_str(row.get::<String, _>("actor_id").as_str())?,
            action,
            stage_index: row.get::<i64, _>("stage_index") as usize,
            stage_name: row.get("stage_name"),
            comment: row.get("comment"),
            attachment_ref: row.get("attachment_ref"),
            recorded_at: parse_datetime(row.get::<String, _>("recorded_at").as_str())?,
        })
    }
}

#[async_trait]
impl AuditTrailStore for SqliteAuditStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        insert_entry(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn read_all(&self, instance_id: Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM audit_entries WHERE instance_id = ? ORDER BY sequence_number ASC",
        )
        .bind(instance_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|r| self.row_to_entry(r)).collect()
    }

    async fn next_sequence(&self, instance_id: Uuid) -> Result<u64, StoreError> {
        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM audit_entries WHERE instance_id = ?",
        )
        .bind(instance_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(next as u64)
    }
}
