use crate::domain::models::{AuditEntry, WorkflowInstance, WorkflowStatus};
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Filters for querying workflow instances
#[derive(Default, Debug, Clone)]
pub struct InstanceFilters {
    pub status: Option<WorkflowStatus>,
    pub template_name: Option<String>,
    pub initiator_id: Option<Uuid>,
    pub subject_ref: Option<String>,
    pub limit: Option<i64>,
}

/// Repository port for workflow instance persistence.
///
/// The two write operations each take the audit entry recording the change
/// and commit it in the same transaction as the instance row, which is what
/// keeps per-instance sequence numbers gap-free.
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// Insert a freshly submitted instance together with its first audit
    /// entry, atomically
    async fn insert(
        &self,
        instance: &WorkflowInstance,
        entry: &AuditEntry,
    ) -> Result<(), StoreError>;

    /// Persist a transitioned instance together with the audit entry that
    /// records the transition, atomically. The update is conditioned on
    /// `expected_version`; if another writer got there first no row matches
    /// and the call fails with `VersionConflict`
    async fn update_versioned(
        &self,
        instance: &WorkflowInstance,
        expected_version: u64,
        entry: &AuditEntry,
    ) -> Result<(), StoreError>;

    /// Get an instance by ID
    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstance>, StoreError>;

    /// List instances with optional filters
    async fn list(&self, filters: InstanceFilters) -> Result<Vec<WorkflowInstance>, StoreError>;

    /// Count instances matching filters
    async fn count(&self, filters: InstanceFilters) -> Result<i64, StoreError>;
}
