use crate::domain::models::{StageDefinition, WorkflowTemplate};
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::template_repository::TemplateRepository;
use crate::infrastructure::database::utils::parse_datetime;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

/// SQLite implementation of `TemplateRepository`.
pub struct SqliteTemplateRepository {
    pool: SqlitePool,
}

impl SqliteTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Helper to convert a database row to a template
    fn row_to_template(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<WorkflowTemplate, StoreError> {
        use sqlx::Row;

        let stages: Vec<StageDefinition> = serde_json::from_str(&row.get::<String, _>("stages"))?;

        Ok(WorkflowTemplate {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())?,
            name: row.get("name"),
            description: row.get("description"),
            stages,
            created_at: parse_datetime(row.get::<String, _>("created_at").as_str())?,
            updated_at: parse_datetime(row.get::<String, _>("updated_at").as_str())?,
        })
    }
}

#[async_trait]
impl TemplateRepository for SqliteTemplateRepository {
    async fn insert(&self, template: &WorkflowTemplate) -> Result<(), StoreError> {
        let id = template.id.to_string();
        let stages = serde_json::to_string(&template.stages)?;
        let created_at = template.created_at.to_rfc3339();
        let updated_at = template.updated_at.to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO workflow_templates (id, name, description, stages, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(stages)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, template: &WorkflowTemplate) -> Result<(), StoreError> {
        let id = template.id.to_string();
        let stages = serde_json::to_string(&template.stages)?;
        let updated_at = template.updated_at.to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE workflow_templates SET
                name = ?,
                description = ?,
                stages = ?,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&template.name)
        .bind(&template.description)
        .bind(stages)
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(template.id));
        }

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowTemplate>, StoreError> {
        let row = sqlx::query("SELECT * FROM workflow_templates WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.row_to_template(&r)?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<WorkflowTemplate>, StoreError> {
        let row = sqlx::query("SELECT * FROM workflow_templates WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.row_to_template(&r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<WorkflowTemplate>, StoreError> {
        let rows = sqlx::query("SELECT * FROM workflow_templates ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|r| self.row_to_template(r)).collect()
    }
}
