use thiserror::Error;
use uuid::Uuid;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid field value: {0}")]
    InvalidField(String),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Migration error: {0}")]
    Migration(String),

    /// Optimistic lock conflict - the instance was modified by another
    /// writer. The caller should re-read the instance and retry.
    #[error(
        "Version conflict for instance {id}: expected version {expected_version}, but the instance was modified"
    )]
    VersionConflict { id: Uuid, expected_version: u64 },

    /// An audit entry slot was written twice, or a committed entry was
    /// mutated. The trail is append-only; this is always a defect.
    #[error("Append-only violation for audit entry ({instance_id}, {sequence_number})")]
    AppendOnlyViolation {
        instance_id: Uuid,
        sequence_number: u64,
    },
}

/// User/role directory lookup errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory lookup failed: {0}")]
    LookupFailed(String),
}

/// Notification channel delivery errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
