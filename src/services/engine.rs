//! The approval workflow engine.
//!
//! Drives instances through their stage chains: validates who may act,
//! applies the transition, commits it together with its audit entry under
//! the optimistic version check, and only then fires hooks and fans out
//! notifications. The engine never retries internally; a version conflict
//! is returned to the caller, who re-fetches and resubmits.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::template::{StageAction, StageDefinition};
use crate::domain::models::{AuditAction, AuditEntry, WorkflowInstance, WorkflowStatus};
use crate::domain::ports::{
    AuditTrailStore, InstanceFilters, InstanceRepository, StoreError, TemplateRepository,
    UserDirectory,
};
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::export::{self, ExportFormat};
use crate::services::hooks::HookRegistry;
use crate::services::resolver::ActorResolver;

/// One actor's request to act on an instance.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub instance_id: Uuid,
    pub actor_id: Uuid,
    pub action: StageAction,
    /// Version the actor last read; the act fails with
    /// `ConcurrentModification` if the instance has moved on
    pub expected_version: u64,
    pub comment: Option<String>,
    pub attachment_ref: Option<String>,
}

impl ActionRequest {
    pub fn new(instance_id: Uuid, actor_id: Uuid, action: StageAction, expected_version: u64) -> Self {
        Self {
            instance_id,
            actor_id,
            action,
            expected_version,
            comment: None,
            attachment_ref: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_attachment(mut self, attachment_ref: impl Into<String>) -> Self {
        self.attachment_ref = Some(attachment_ref.into());
        self
    }
}

/// Multi-stage approval engine over pluggable persistence, directory,
/// notification, and hook collaborators.
pub struct WorkflowEngine<T, I, A, D>
where
    T: TemplateRepository,
    I: InstanceRepository,
    A: AuditTrailStore,
    D: UserDirectory,
{
    templates: Arc<T>,
    instances: Arc<I>,
    audit: Arc<A>,
    directory: Arc<D>,
    resolver: ActorResolver<D>,
    dispatcher: Arc<NotificationDispatcher>,
    hooks: Arc<HookRegistry>,
}

impl<T, I, A, D> WorkflowEngine<T, I, A, D>
where
    T: TemplateRepository,
    I: InstanceRepository,
    A: AuditTrailStore,
    D: UserDirectory,
{
    pub fn new(
        templates: Arc<T>,
        instances: Arc<I>,
        audit: Arc<A>,
        directory: Arc<D>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            templates,
            instances,
            audit,
            resolver: ActorResolver::new(directory.clone()),
            directory,
            dispatcher,
            hooks: Arc::new(HookRegistry::new()),
        }
    }

    /// Attach a hook registry. Hooks fire after a terminal transition has
    /// committed.
    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Submit a new instance against a named template.
    ///
    /// The instance starts at stage 0 with version 1 and captures the
    /// template's stage list as its immutable snapshot. Stage-0 actors are
    /// notified best-effort: a stalled first stage alerts administrators
    /// but does not fail the submission.
    ///
    /// # Errors
    /// `TemplateNotFound` for an unknown name, `InvalidTemplate` if the
    /// stored template fails validation.
    #[instrument(skip(self, initial_comment), err)]
    pub async fn submit(
        &self,
        template_name: &str,
        subject_ref: &str,
        initiator_id: Uuid,
        initial_comment: Option<String>,
    ) -> EngineResult<WorkflowInstance> {
        let template = self
            .templates
            .get_by_name(template_name)
            .await
            .map_err(EngineError::from_store)?
            .ok_or_else(|| EngineError::TemplateNotFound(template_name.to_string()))?;
        template.validate().map_err(EngineError::InvalidTemplate)?;

        let instance = WorkflowInstance::submit(&template, subject_ref, initiator_id);
        let first_stage = Self::stage_of(&instance)?;

        let mut entry = AuditEntry::new(
            instance.id,
            1,
            initiator_id,
            AuditAction::Submit,
            0,
            first_stage.name.clone(),
        );
        if let Some(comment) = normalize(initial_comment) {
            entry = entry.with_comment(comment);
        }

        self.instances
            .insert(&instance, &entry)
            .await
            .map_err(EngineError::from_store)?;

        info!(
            instance_id = %instance.id,
            template = %instance.template_name,
            subject_ref = %instance.subject_ref,
            "workflow instance submitted"
        );

        self.notify_after_transition(&instance).await;
        Ok(instance)
    }

    /// Apply one actor's action to an instance.
    ///
    /// Validation order: the instance must exist and still be active, the
    /// caller's `expected_version` must match, the actor must be in the
    /// resolved set for the current stage, and the action must be allowed
    /// there. Approve advances the cursor (or settles the instance on the
    /// last stage), decline settles it immediately at any stage, attach
    /// records a document without moving.
    ///
    /// The transition and its audit entry commit atomically before any hook
    /// or notification runs.
    #[instrument(skip(self, request), fields(instance_id = %request.instance_id, action = %request.action), err)]
    pub async fn act(&self, request: ActionRequest) -> EngineResult<WorkflowInstance> {
        let mut instance = self.load(request.instance_id).await?;

        if instance.status.is_terminal() {
            return Err(EngineError::TerminalState {
                id: instance.id,
                status: instance.status,
            });
        }

        if instance.version != request.expected_version {
            return Err(EngineError::ConcurrentModification {
                id: instance.id,
                expected_version: request.expected_version,
            });
        }

        let stage = Self::stage_of(&instance)?;
        let stage_index = instance.current_stage_index;

        let actors = match self.resolver.resolve(&stage, &instance).await {
            Ok(actors) => actors,
            Err(err) => {
                if let EngineError::ActorResolution { stage: stage_name, rule, .. } = &err {
                    self.alert_stalled(&instance, stage_name, rule).await;
                }
                return Err(err);
            }
        };

        if !actors.contains(&request.actor_id) {
            return Err(EngineError::UnauthorizedActor {
                id: instance.id,
                actor_id: request.actor_id,
                stage: stage.name.clone(),
            });
        }

        if !stage.allows(request.action) {
            return Err(EngineError::InvalidAction {
                action: request.action.to_string(),
                stage: stage.name.clone(),
                reason: "not in the stage's allowed actions".to_string(),
            });
        }

        let comment = normalize(request.comment);
        let attachment_ref = normalize(request.attachment_ref);

        if request.action == StageAction::Decline && comment.is_none() {
            return Err(EngineError::InvalidAction {
                action: request.action.to_string(),
                stage: stage.name.clone(),
                reason: "decline requires a non-empty comment".to_string(),
            });
        }
        if request.action == StageAction::Attach && attachment_ref.is_none() {
            return Err(EngineError::InvalidAction {
                action: request.action.to_string(),
                stage: stage.name.clone(),
                reason: "attach requires an attachment reference".to_string(),
            });
        }

        match request.action {
            StageAction::Approve => instance.apply_approve(),
            StageAction::Decline => instance.apply_decline(),
            StageAction::Attach => instance.apply_attach(),
        }
        .map_err(|reason| EngineError::InvalidAction {
            action: request.action.to_string(),
            stage: stage.name.clone(),
            reason,
        })?;

        let sequence = self
            .audit
            .next_sequence(instance.id)
            .await
            .map_err(EngineError::from_store)?;
        let mut entry = AuditEntry::new(
            instance.id,
            sequence,
            request.actor_id,
            AuditAction::from(request.action),
            stage_index,
            stage.name.clone(),
        );
        if let Some(comment) = comment {
            entry = entry.with_comment(comment);
        }
        if let Some(attachment_ref) = attachment_ref {
            entry = entry.with_attachment(attachment_ref);
        }

        self.instances
            .update_versioned(&instance, request.expected_version, &entry)
            .await
            .map_err(EngineError::from_store)?;

        info!(
            instance_id = %instance.id,
            action = %request.action,
            stage = %stage.name,
            version = instance.version,
            status = %instance.status,
            "workflow action committed"
        );

        match instance.status {
            WorkflowStatus::Approved => self.hooks.fire_approved(&instance).await,
            WorkflowStatus::Declined => self.hooks.fire_declined(&instance).await,
            _ => {}
        }

        self.notify_after_transition(&instance).await;
        Ok(instance)
    }

    /// Withdraw an active instance.
    ///
    /// Only the original initiator or an administrator may cancel. The
    /// update is conditioned on the version just read, so a concurrent
    /// action surfaces as `ConcurrentModification` here too.
    #[instrument(skip(self, comment), err)]
    pub async fn cancel(
        &self,
        instance_id: Uuid,
        actor_id: Uuid,
        comment: Option<String>,
    ) -> EngineResult<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;

        if instance.status.is_terminal() {
            return Err(EngineError::TerminalState {
                id: instance.id,
                status: instance.status,
            });
        }

        let stage = Self::stage_of(&instance)?;
        let stage_index = instance.current_stage_index;

        let authorized = actor_id == instance.initiator_id
            || self.directory.is_administrator(actor_id).await?;
        if !authorized {
            return Err(EngineError::UnauthorizedActor {
                id: instance.id,
                actor_id,
                stage: stage.name.clone(),
            });
        }

        let expected_version = instance.version;
        instance.apply_cancel().map_err(|reason| EngineError::InvalidAction {
            action: "cancel".to_string(),
            stage: stage.name.clone(),
            reason,
        })?;

        let sequence = self
            .audit
            .next_sequence(instance.id)
            .await
            .map_err(EngineError::from_store)?;
        let mut entry = AuditEntry::new(
            instance.id,
            sequence,
            actor_id,
            AuditAction::Cancel,
            stage_index,
            stage.name.clone(),
        );
        if let Some(comment) = normalize(comment) {
            entry = entry.with_comment(comment);
        }

        self.instances
            .update_versioned(&instance, expected_version, &entry)
            .await
            .map_err(EngineError::from_store)?;

        info!(
            instance_id = %instance.id,
            actor_id = %actor_id,
            "workflow instance cancelled"
        );

        self.notify_after_transition(&instance).await;
        Ok(instance)
    }

    /// The full ordered audit trail for an instance. Available for any
    /// status; an unknown id yields an empty trail.
    pub async fn audit_trail(&self, instance_id: Uuid) -> EngineResult<Vec<AuditEntry>> {
        self.audit
            .read_all(instance_id)
            .await
            .map_err(EngineError::from_store)
    }

    /// Render an instance's audit trail as a compliance export.
    ///
    /// A pure projection of the committed entries: exporting an unchanged
    /// instance twice yields identical bytes.
    pub async fn export(&self, instance_id: Uuid, format: ExportFormat) -> EngineResult<Vec<u8>> {
        let instance = self.load(instance_id).await?;
        let entries = self.audit_trail(instance_id).await?;
        export::render(format, &instance, &entries).map_err(|e| EngineError::Export(e.to_string()))
    }

    /// Fetch one instance.
    pub async fn get(&self, instance_id: Uuid) -> EngineResult<WorkflowInstance> {
        self.load(instance_id).await
    }

    /// List instances matching the given filters.
    pub async fn list(&self, filters: InstanceFilters) -> EngineResult<Vec<WorkflowInstance>> {
        self.instances
            .list(filters)
            .await
            .map_err(EngineError::from_store)
    }

    /// Active instances whose current stage the given user may act on.
    /// Stalled stages resolve to nobody and appear in no queue.
    pub async fn pending_for(&self, user_id: Uuid) -> EngineResult<Vec<WorkflowInstance>> {
        let active = self
            .instances
            .list(InstanceFilters {
                status: Some(WorkflowStatus::Active),
                ..Default::default()
            })
            .await
            .map_err(EngineError::from_store)?;

        let mut pending = Vec::new();
        for instance in active {
            let stage = match Self::stage_of(&instance) {
                Ok(stage) => stage,
                Err(_) => continue,
            };
            match self.resolver.resolve(&stage, &instance).await {
                Ok(actors) if actors.contains(&user_id) => pending.push(instance),
                Ok(_) | Err(_) => {}
            }
        }
        Ok(pending)
    }

    async fn load(&self, instance_id: Uuid) -> EngineResult<WorkflowInstance> {
        self.instances
            .get(instance_id)
            .await
            .map_err(EngineError::from_store)?
            .ok_or(EngineError::InstanceNotFound(instance_id))
    }

    /// Stage under the instance's cursor. Missing only if the stored
    /// snapshot was corrupted.
    fn stage_of(instance: &WorkflowInstance) -> EngineResult<StageDefinition> {
        instance.current_stage().cloned().ok_or_else(|| {
            EngineError::Store(StoreError::InvalidField(format!(
                "instance {} has no stage at index {}",
                instance.id, instance.current_stage_index
            )))
        })
    }

    /// Post-commit notification: terminal instances notify the initiator,
    /// active ones notify the (re-resolved) current stage's actors. A stage
    /// that now resolves to nobody alerts administrators instead.
    async fn notify_after_transition(&self, instance: &WorkflowInstance) {
        if instance.status.is_terminal() {
            self.dispatcher.notify_terminal(instance).await;
            return;
        }

        let stage = match Self::stage_of(instance) {
            Ok(stage) => stage,
            Err(e) => {
                warn!(instance_id = %instance.id, error = %e, "cannot notify current stage");
                return;
            }
        };

        match self.resolver.resolve(&stage, instance).await {
            Ok(actors) => {
                self.dispatcher
                    .notify_action_required(instance, &stage.name, &actors)
                    .await;
            }
            Err(EngineError::ActorResolution { stage: stage_name, rule, .. }) => {
                self.alert_stalled(instance, &stage_name, &rule).await;
            }
            Err(e) => {
                warn!(
                    instance_id = %instance.id,
                    stage = %stage.name,
                    error = %e,
                    "post-transition actor resolution failed"
                );
            }
        }
    }

    async fn alert_stalled(&self, instance: &WorkflowInstance, stage_name: &str, rule: &str) {
        warn!(
            instance_id = %instance.id,
            stage = %stage_name,
            rule = %rule,
            "stage resolves to no eligible actors; alerting administrators"
        );
        match self.directory.administrators().await {
            Ok(admins) if !admins.is_empty() => {
                self.dispatcher
                    .notify_stalled(instance, stage_name, rule, &admins)
                    .await;
            }
            Ok(_) => warn!(
                instance_id = %instance.id,
                "no administrators configured to receive the stalled-stage alert"
            ),
            Err(e) => warn!(
                instance_id = %instance.id,
                error = %e,
                "administrator lookup failed while alerting a stalled stage"
            ),
        }
    }
}

fn normalize(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
