//! Actor resolution: turning a stage's actor rule into concrete users.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::template::{ActorRule, StageDefinition};
use crate::domain::models::WorkflowInstance;
use crate::domain::ports::directory::UserDirectory;
use crate::domain::ports::errors::DirectoryError;

/// Resolves the permitted actor set for an instance's current stage.
///
/// Resolution happens fresh at validation time and again when notifying the
/// next stage, so role membership changes take effect mid-flight. An empty
/// result is an error here: a stage nobody can act on means the instance is
/// stalled, and the engine alerts administrators.
pub struct ActorResolver<D: UserDirectory> {
    directory: Arc<D>,
}

impl<D: UserDirectory> ActorResolver<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Resolve the eligible actor set for `stage` on `instance`.
    ///
    /// # Errors
    /// `ActorResolution` when the rule yields no users or the directory
    /// lookup itself fails.
    pub async fn resolve(
        &self,
        stage: &StageDefinition,
        instance: &WorkflowInstance,
    ) -> EngineResult<HashSet<Uuid>> {
        let resolved = match &stage.actor_rule {
            ActorRule::ByRole { role } => self
                .directory
                .users_with_role(role)
                .await
                .map_err(|e| self.lookup_failed(stage, instance, e))?,
            ActorRule::ByRelation { relation } => self
                .directory
                .related_user(&instance.subject_ref, relation)
                .await
                .map_err(|e| self.lookup_failed(stage, instance, e))?
                .into_iter()
                .collect(),
            ActorRule::Explicit { user_id } => HashSet::from([*user_id]),
        };

        if resolved.is_empty() {
            return Err(EngineError::ActorResolution {
                id: instance.id,
                stage: stage.name.clone(),
                rule: stage.actor_rule.describe(),
                reason: "resolved to no eligible actors".to_string(),
            });
        }

        debug!(
            instance_id = %instance.id,
            stage = %stage.name,
            actors = resolved.len(),
            "resolved stage actors"
        );
        Ok(resolved)
    }

    fn lookup_failed(
        &self,
        stage: &StageDefinition,
        instance: &WorkflowInstance,
        err: DirectoryError,
    ) -> EngineError {
        EngineError::ActorResolution {
            id: instance.id,
            stage: stage.name.clone(),
            rule: stage.actor_rule.describe(),
            reason: err.to_string(),
        }
    }
}
