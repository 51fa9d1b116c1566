use crate::domain::models::AuditEntry;
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Port for the append-only audit trail.
///
/// There are deliberately no update or delete operations: the schema itself
/// rejects mutation, and a duplicate (instance, sequence) append surfaces as
/// `AppendOnlyViolation`.
#[async_trait]
pub trait AuditTrailStore: Send + Sync {
    /// Append one entry
    async fn append(&self, entry: &AuditEntry) -> Result<(), StoreError>;

    /// Full trail for an instance, ordered by sequence number. An unknown
    /// instance yields an empty trail
    async fn read_all(&self, instance_id: Uuid) -> Result<Vec<AuditEntry>, StoreError>;

    /// Next free sequence number for an instance (1 for a fresh instance)
    async fn next_sequence(&self, instance_id: Uuid) -> Result<u64, StoreError>;
}
