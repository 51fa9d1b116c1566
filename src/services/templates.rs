//! Template management.
//!
//! Templates are administrator-edited; everyone else only reads them.
//! Edits never touch in-flight instances, which carry their own stage
//! snapshots.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::template::{TemplateDefinition, WorkflowTemplate};
use crate::domain::ports::{TemplateRepository, UserDirectory};

/// Administrator-gated template catalogue.
pub struct TemplateService<T, D>
where
    T: TemplateRepository,
    D: UserDirectory,
{
    templates: Arc<T>,
    directory: Arc<D>,
}

impl<T, D> TemplateService<T, D>
where
    T: TemplateRepository,
    D: UserDirectory,
{
    pub fn new(templates: Arc<T>, directory: Arc<D>) -> Self {
        Self { templates, directory }
    }

    /// Create or replace a template from an administrator-supplied
    /// definition. Upserts by name: an existing template keeps its id and
    /// gets the new stage list and description.
    ///
    /// # Errors
    /// `AdministratorRequired` for non-administrators, `InvalidTemplate`
    /// when the definition fails validation.
    #[instrument(skip(self, definition), fields(template = %definition.name), err)]
    pub async fn apply(
        &self,
        actor_id: Uuid,
        definition: TemplateDefinition,
    ) -> EngineResult<WorkflowTemplate> {
        self.require_administrator(actor_id, "template apply").await?;

        let candidate = WorkflowTemplate::from_definition(definition);
        candidate.validate().map_err(EngineError::InvalidTemplate)?;

        let existing = self
            .templates
            .get_by_name(&candidate.name)
            .await
            .map_err(EngineError::from_store)?;

        match existing {
            Some(mut template) => {
                template
                    .replace_stages(candidate.stages)
                    .map_err(EngineError::InvalidTemplate)?;
                template.description = candidate.description;
                self.templates
                    .update(&template)
                    .await
                    .map_err(EngineError::from_store)?;
                info!(template = %template.name, stages = template.stages.len(), "template replaced");
                Ok(template)
            }
            None => {
                self.templates
                    .insert(&candidate)
                    .await
                    .map_err(EngineError::from_store)?;
                info!(template = %candidate.name, stages = candidate.stages.len(), "template created");
                Ok(candidate)
            }
        }
    }

    /// All templates, ordered by name.
    pub async fn list(&self) -> EngineResult<Vec<WorkflowTemplate>> {
        self.templates.list().await.map_err(EngineError::from_store)
    }

    /// Fetch one template by name.
    pub async fn get(&self, name: &str) -> EngineResult<WorkflowTemplate> {
        self.templates
            .get_by_name(name)
            .await
            .map_err(EngineError::from_store)?
            .ok_or_else(|| EngineError::TemplateNotFound(name.to_string()))
    }

    async fn require_administrator(&self, actor_id: Uuid, operation: &str) -> EngineResult<()> {
        if self.directory.is_administrator(actor_id).await? {
            Ok(())
        } else {
            Err(EngineError::AdministratorRequired {
                actor_id,
                operation: operation.to_string(),
            })
        }
    }
}
