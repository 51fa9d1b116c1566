use crate::domain::models::{AuditEntry, WorkflowInstance, WorkflowStatus};
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::instance_repository::{InstanceFilters, InstanceRepository};
use crate::infrastructure::database::audit_repo;
use crate::infrastructure::database::utils::parse_datetime;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// SQLite implementation of `InstanceRepository`.
///
/// Both write paths commit the instance row and its audit entry in a single
/// transaction. `update_versioned` additionally conditions the UPDATE on the
/// version the caller read, so concurrent writers serialize: the loser
/// matches zero rows and the whole transaction, audit entry included, rolls
/// back.
pub struct SqliteInstanceRepository {
    pool: SqlitePool,
}

impl SqliteInstanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Helper to convert a database row to a workflow instance
    fn row_to_instance(&self, row: &sqlx::sqlite::SqliteRow) -> Result<WorkflowInstance, StoreError> {
        use sqlx::Row;

        let status_raw = row.get::<String, _>("status");
        let status = WorkflowStatus::from_str(&status_raw)
            .ok_or_else(|| StoreError::InvalidField(format!("unknown status '{status_raw}'")))?;

        let snapshot_raw = row.get::<String, _>("template_snapshot");
        let template_snapshot = serde_json::from_str(&snapshot_raw)?;

        let closed_at = row
            .get::<Option<String>, _>("closed_at")
            .map(|s| parse_datetime(&s))
            .transpose()?;

        Ok(WorkflowInstance {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())?,
            template_id: Uuid::parse_str(row.get::<String, _>("template_id").as_str())?,
            template_name: row.get("template_name"),
            template_snapshot,
            subject_ref: row.get("subject_ref"),
            initiator_id: Uuid::parse_str(row.get::<String, _>("initiator_id").as_str())?,
            current_stage_index: row.get::<i64, _>("current_stage_index") as usize,
            status,
            version: row.get::<i64, _>("version") as u64,
            created_at: parse_datetime(row.get::<String, _>("created_at").as_str())?,
            updated_at: parse_datetime(row.get::<String, _>("updated_at").as_str())?,
            closed_at,
        })
    }
}

#[async_trait]
impl InstanceRepository for SqliteInstanceRepository {
    async fn insert(
        &self,
        instance: &WorkflowInstance,
        entry: &AuditEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO workflow_instances (
                id, template_id, template_name, template_snapshot,
                subject_ref, initiator_id, current_stage_index, status,
                version, created_at, updated_at, closed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(instance.id.to_string())
        .bind(instance.template_id.to_string())
        .bind(&instance.template_name)
        .bind(serde_json::to_string(&instance.template_snapshot)?)
        .bind(&instance.subject_ref)
        .bind(instance.initiator_id.to_string())
        .bind(instance.current_stage_index as i64)
        .bind(instance.status.as_str())
        .bind(instance.version as i64)
        .bind(instance.created_at.to_rfc3339())
        .bind(instance.updated_at.to_rfc3339())
        .bind(instance.closed_at.map(|t| t.to_rfc3339()))
        .execute(&mut *tx)
        .await?;

        audit_repo::insert_entry(&mut tx, entry).await?;
        tx.commit().await?;

        debug!(
            instance_id = %instance.id,
            template = %instance.template_name,
            "inserted workflow instance"
        );
        Ok(())
    }

    async fn update_versioned(
        &self,
        instance: &WorkflowInstance,
        expected_version: u64,
        entry: &AuditEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Only the mutable columns; the snapshot is written once at insert
        // and never rewritten.
        let result = sqlx::query(
            r"
            UPDATE workflow_instances
            SET current_stage_index = ?, status = ?, version = ?,
                updated_at = ?, closed_at = ?
            WHERE id = ? AND version = ?
            ",
        )
        .bind(instance.current_stage_index as i64)
        .bind(instance.status.as_str())
        .bind(instance.version as i64)
        .bind(instance.updated_at.to_rfc3339())
        .bind(instance.closed_at.map(|t| t.to_rfc3339()))
        .bind(instance.id.to_string())
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::VersionConflict {
                id: instance.id,
                expected_version,
            });
        }

        audit_repo::insert_entry(&mut tx, entry).await?;
        tx.commit().await?;

        debug!(
            instance_id = %instance.id,
            version = instance.version,
            status = %instance.status,
            "updated workflow instance"
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstance>, StoreError> {
        let row = sqlx::query("SELECT * FROM workflow_instances WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_instance(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filters: InstanceFilters) -> Result<Vec<WorkflowInstance>, StoreError> {
        let mut query = String::from("SELECT * FROM workflow_instances WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filters.status {
            query.push_str(" AND status = ?");
            bindings.push(status.to_string());
        }

        if let Some(template_name) = &filters.template_name {
            query.push_str(" AND template_name = ?");
            bindings.push(template_name.clone());
        }

        if let Some(initiator_id) = &filters.initiator_id {
            query.push_str(" AND initiator_id = ?");
            bindings.push(initiator_id.to_string());
        }

        if let Some(subject_ref) = &filters.subject_ref {
            query.push_str(" AND subject_ref = ?");
            bindings.push(subject_ref.clone());
        }

        query.push_str(" ORDER BY created_at ASC");

        if let Some(limit) = filters.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        // Build and execute query
        let mut query_builder = sqlx::query(&query);
        for binding in bindings {
            query_builder = query_builder.bind(binding);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;

        rows.iter().map(|row| self.row_to_instance(row)).collect()
    }

    async fn count(&self, filters: InstanceFilters) -> Result<i64, StoreError> {
        let mut query = String::from("SELECT COUNT(*) as count FROM workflow_instances WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filters.status {
            query.push_str(" AND status = ?");
            bindings.push(status.to_string());
        }

        if let Some(template_name) = &filters.template_name {
            query.push_str(" AND template_name = ?");
            bindings.push(template_name.clone());
        }

        if let Some(initiator_id) = &filters.initiator_id {
            query.push_str(" AND initiator_id = ?");
            bindings.push(initiator_id.to_string());
        }

        if let Some(subject_ref) = &filters.subject_ref {
            query.push_str(" AND subject_ref = ?");
            bindings.push(subject_ref.clone());
        }

        let mut query_builder = sqlx::query_scalar(&query);
        for binding in bindings {
            query_builder = query_builder.bind(binding);
        }

        let count: i64 = query_builder.fetch_one(&self.pool).await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AuditAction, WorkflowTemplate};
    use crate::domain::models::template::{ActorRule, StageDefinition};
    use crate::domain::ports::template_repository::TemplateRepository;
    use crate::infrastructure::database::{Database, SqliteTemplateRepository};

    fn sample_template() -> WorkflowTemplate {
        WorkflowTemplate::new(
            "purchase-approval",
            vec![
                StageDefinition::new("HOD", ActorRule::ByRole { role: "hod".to_string() }),
                StageDefinition::new("Finance", ActorRule::ByRole { role: "finance".to_string() }),
            ],
        )
    }

    async fn setup() -> (Database, SqliteInstanceRepository, WorkflowTemplate) {
        let db = Database::connect_in_memory().await.unwrap();
        let templates = SqliteTemplateRepository::new(db.pool().clone());
        let template = sample_template();
        templates.insert(&template).await.unwrap();
        let repo = SqliteInstanceRepository::new(db.pool().clone());
        (db, repo, template)
    }

    fn submit_entry(instance: &WorkflowInstance) -> AuditEntry {
        AuditEntry::new(
            instance.id,
            1,
            instance.initiator_id,
            AuditAction::Submit,
            0,
            "HOD",
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let (_db, repo, template) = setup().await;
        let instance = WorkflowInstance::submit(&template, "PR-2024-001", Uuid::new_v4());
        repo.insert(&instance, &submit_entry(&instance)).await.unwrap();

        let loaded = repo.get(instance.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, instance.id);
        assert_eq!(loaded.template_name, "purchase-approval");
        assert_eq!(loaded.subject_ref, "PR-2024-001");
        assert_eq!(loaded.status, WorkflowStatus::Active);
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.template_snapshot.len(), 2);
        assert_eq!(loaded.template_snapshot[1].name, "Finance");
        assert!(loaded.closed_at.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_db, repo, _template) = setup().await;
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_versioned_persists_transition() {
        let (_db, repo, template) = setup().await;
        let mut instance = WorkflowInstance::submit(&template, "PR-2024-002", Uuid::new_v4());
        repo.insert(&instance, &submit_entry(&instance)).await.unwrap();

        let read_version = instance.version;
        instance.apply_approve().unwrap();
        let entry = AuditEntry::new(
            instance.id,
            2,
            Uuid::new_v4(),
            AuditAction::Approve,
            0,
            "HOD",
        );
        repo.update_versioned(&instance, read_version, &entry)
            .await
            .unwrap();

        let loaded = repo.get(instance.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.current_stage_index, 1);
        assert_eq!(loaded.status, WorkflowStatus::Active);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let (_db, repo, template) = setup().await;
        let mut instance = WorkflowInstance::submit(&template, "PR-2024-003", Uuid::new_v4());
        repo.insert(&instance, &submit_entry(&instance)).await.unwrap();

        instance.apply_approve().unwrap();
        let entry = AuditEntry::new(
            instance.id,
            2,
            Uuid::new_v4(),
            AuditAction::Approve,
            0,
            "HOD",
        );
        repo.update_versioned(&instance, 1, &entry).await.unwrap();

        // Second writer still holds version 1.
        let result = repo.update_versioned(&instance, 1, &entry).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected_version: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_audit_append_rolls_back_instance_row() {
        let (_db, repo, template) = setup().await;
        let mut instance = WorkflowInstance::submit(&template, "PR-2024-004", Uuid::new_v4());
        repo.insert(&instance, &submit_entry(&instance)).await.unwrap();

        instance.apply_approve().unwrap();
        // Sequence 1 already exists, so the audit insert inside the
        // transaction fails and the instance update must roll back with it.
        let colliding = AuditEntry::new(
            instance.id,
            1,
            Uuid::new_v4(),
            AuditAction::Approve,
            0,
            "HOD",
        );
        let result = repo.update_versioned(&instance, 1, &colliding).await;
        assert!(matches!(result, Err(StoreError::AppendOnlyViolation { .. })));

        let loaded = repo.get(instance.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1, "instance row must not have advanced");
        assert_eq!(loaded.current_stage_index, 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_initiator() {
        let (_db, repo, template) = setup().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let first = WorkflowInstance::submit(&template, "PR-1", alice);
        repo.insert(&first, &submit_entry(&first)).await.unwrap();

        let mut second = WorkflowInstance::submit(&template, "PR-2", bob);
        repo.insert(&second, &submit_entry(&second)).await.unwrap();
        second.apply_decline().unwrap();
        let decline = AuditEntry::new(second.id, 2, bob, AuditAction::Decline, 0, "HOD")
            .with_comment("not this quarter");
        repo.update_versioned(&second, 1, &decline).await.unwrap();

        let active = repo
            .list(InstanceFilters {
                status: Some(WorkflowStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].subject_ref, "PR-1");

        let by_bob = repo
            .list(InstanceFilters {
                initiator_id: Some(bob),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_bob.len(), 1);
        assert_eq!(by_bob[0].subject_ref, "PR-2");

        let total = repo.count(InstanceFilters::default()).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let (_db, repo, template) = setup().await;
        for i in 0..5 {
            let instance = WorkflowInstance::submit(&template, format!("PR-{i}"), Uuid::new_v4());
            repo.insert(&instance, &submit_entry(&instance)).await.unwrap();
        }

        let limited = repo
            .list(InstanceFilters {
                limit: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 3);
    }
}
