//! Workflow instance domain model.
//!
//! An instance is one approval flow in flight (or settled): a snapshot of
//! its template's stage list, a cursor into that list, and a status. All
//! state changes go through the `apply_*` methods; they refuse any
//! transition out of a terminal status, so terminality is a property of the
//! model rather than a convention callers are trusted to follow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::template::{StageDefinition, WorkflowTemplate};

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Waiting on the actor gate at `current_stage_index`
    Active,
    /// Every stage approved
    Approved,
    /// Declined at some stage; terminal
    Declined,
    /// Withdrawn by the initiator or an administrator; terminal
    Cancelled,
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "approved" => Some(Self::Approved),
            "declined" | "rejected" => Some(Self::Declined),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined | Self::Cancelled)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single approval flow, created from a template at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Unique identifier
    pub id: Uuid,
    /// Template this instance was created from
    pub template_id: Uuid,
    /// Template name at submission time
    pub template_name: String,
    /// Stage list captured at submission; immutable for the instance's
    /// lifetime, so template edits never invalidate in-flight work
    pub template_snapshot: Vec<StageDefinition>,
    /// Opaque reference to the domain entity under approval
    pub subject_ref: String,
    /// User who submitted the instance
    pub initiator_id: Uuid,
    /// Cursor into `template_snapshot`; frozen at its last value once terminal
    pub current_stage_index: usize,
    /// Current status
    pub status: WorkflowStatus,
    /// Version for optimistic locking, starting at 1
    pub version: u64,
    /// When submitted
    pub created_at: DateTime<Utc>,
    /// When last changed
    pub updated_at: DateTime<Utc>,
    /// When a terminal status was reached
    pub closed_at: Option<DateTime<Utc>>,
}

impl WorkflowInstance {
    /// Create an instance at stage 0 from a validated template, capturing
    /// the stage-list snapshot.
    pub fn submit(
        template: &WorkflowTemplate,
        subject_ref: impl Into<String>,
        initiator_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            template_id: template.id,
            template_name: template.name.clone(),
            template_snapshot: template.stages.clone(),
            subject_ref: subject_ref.into(),
            initiator_id,
            current_stage_index: 0,
            status: WorkflowStatus::Active,
            version: 1,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    /// Stage the cursor points at. For terminal instances this is the stage
    /// where the flow settled.
    pub fn current_stage(&self) -> Option<&StageDefinition> {
        self.template_snapshot.get(self.current_stage_index)
    }

    pub fn is_last_stage(&self) -> bool {
        self.current_stage_index + 1 == self.template_snapshot.len()
    }

    /// Check if the instance is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply an approval: advance one stage, or settle as Approved when the
    /// cursor is on the last stage.
    pub fn apply_approve(&mut self) -> Result<(), String> {
        self.ensure_active("approve")?;
        if self.is_last_stage() {
            self.status = WorkflowStatus::Approved;
            self.closed_at = Some(Utc::now());
        } else {
            self.current_stage_index += 1;
        }
        self.touch();
        Ok(())
    }

    /// Apply a decline: terminal at any stage, cursor frozen in place.
    pub fn apply_decline(&mut self) -> Result<(), String> {
        self.ensure_active("decline")?;
        self.status = WorkflowStatus::Declined;
        self.closed_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Apply a cancellation (initiator/administrator withdrawal).
    pub fn apply_cancel(&mut self) -> Result<(), String> {
        self.ensure_active("cancel")?;
        self.status = WorkflowStatus::Cancelled;
        self.closed_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Record an attachment: a self-loop that bumps the version but leaves
    /// cursor and status alone.
    pub fn apply_attach(&mut self) -> Result<(), String> {
        self.ensure_active("attach")?;
        self.touch();
        Ok(())
    }

    fn ensure_active(&self, action: &str) -> Result<(), String> {
        if self.status != WorkflowStatus::Active {
            return Err(format!(
                "Cannot {action}: instance {} is {}",
                self.id,
                self.status.as_str()
            ));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.template_snapshot.len() < 2 {
            return Err("Instance snapshot needs at least 2 stages".to_string());
        }
        if self.current_stage_index >= self.template_snapshot.len() {
            return Err(format!(
                "Stage index {} out of bounds for {} stages",
                self.current_stage_index,
                self.template_snapshot.len()
            ));
        }
        if self.version == 0 {
            return Err("Version starts at 1".to_string());
        }
        if self.subject_ref.trim().is_empty() {
            return Err("Subject reference cannot be empty".to_string());
        }
        Ok(())
    }
}
