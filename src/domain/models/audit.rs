//! Audit trail domain model.
//!
//! Every transition an instance goes through leaves exactly one entry,
//! numbered 1..n per instance with no gaps. Entries are never updated or
//! deleted; the trail is the authoritative history a compliance export
//! replays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::template::StageAction;

/// What an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Instance created at stage 0
    Submit,
    Approve,
    Decline,
    Attach,
    Cancel,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Decline => "decline",
            Self::Attach => "attach",
            Self::Cancel => "cancel",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "submit" => Some(Self::Submit),
            "approve" => Some(Self::Approve),
            "decline" => Some(Self::Decline),
            "attach" => Some(Self::Attach),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<StageAction> for AuditAction {
    fn from(action: StageAction) -> Self {
        match action {
            StageAction::Approve => Self::Approve,
            StageAction::Decline => Self::Decline,
            StageAction::Attach => Self::Attach,
        }
    }
}

/// One immutable entry in an instance's trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Instance this entry belongs to
    pub instance_id: Uuid,
    /// Strictly increasing per instance, starting at 1, gap-free
    pub sequence_number: u64,
    /// Who acted
    pub actor_id: Uuid,
    /// What they did
    pub action: AuditAction,
    /// Stage index at the time of the action
    pub stage_index: usize,
    /// Stage name at the time of the action
    pub stage_name: String,
    /// Free-form comment (mandatory for decline)
    pub comment: Option<String>,
    /// Opaque attachment reference
    pub attachment_ref: Option<String>,
    /// When recorded
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        instance_id: Uuid,
        sequence_number: u64,
        actor_id: Uuid,
        action: AuditAction,
        stage_index: usize,
        stage_name: impl Into<String>,
    ) -> Self {
        Self {
            instance_id,
            sequence_number,
            actor_id,
            action,
            stage_index,
            stage_name: stage_name.into(),
            comment: None,
            attachment_ref: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attach a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach an opaque attachment reference.
    pub fn with_attachment(mut self, attachment_ref: impl Into<String>) -> Self {
        self.attachment_ref = Some(attachment_ref.into());
        self
    }
}
