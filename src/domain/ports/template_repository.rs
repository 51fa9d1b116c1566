use crate::domain::models::WorkflowTemplate;
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository port for workflow template persistence
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a new template
    async fn insert(&self, template: &WorkflowTemplate) -> Result<(), StoreError>;

    /// Replace an existing template record (same id)
    async fn update(&self, template: &WorkflowTemplate) -> Result<(), StoreError>;

    /// Get a template by ID
    async fn get(&self, id: Uuid) -> Result<Option<WorkflowTemplate>, StoreError>;

    /// Get a template by its unique name
    async fn get_by_name(&self, name: &str) -> Result<Option<WorkflowTemplate>, StoreError>;

    /// List all templates ordered by name
    async fn list(&self) -> Result<Vec<WorkflowTemplate>, StoreError>;
}
