//! Engine-level error taxonomy.
//!
//! Every operation returns one of these as a typed result. The engine never
//! retries internally: a `ConcurrentModification` asks the caller to
//! re-fetch and resubmit, an `ActorResolution` asks an administrator to
//! reassign the stalled stage.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::WorkflowStatus;
use crate::domain::ports::errors::{DirectoryError, StoreError};

/// Errors surfaced by the workflow engine and its services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Template malformed at submission time; no instance was created.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Action attempted on an instance that already settled.
    #[error("Instance {id} is {status}; no further actions are accepted")]
    TerminalState { id: Uuid, status: WorkflowStatus },

    /// Optimistic-lock conflict. The caller should re-fetch the instance
    /// and resubmit with the current version.
    #[error(
        "Instance {id} was modified concurrently: expected version {expected_version}; re-fetch and retry"
    )]
    ConcurrentModification { id: Uuid, expected_version: u64 },

    /// Actor is not in the resolved set for the current stage.
    #[error("Actor {actor_id} is not authorized to act on instance {id} at stage '{stage}'")]
    UnauthorizedActor {
        id: Uuid,
        actor_id: Uuid,
        stage: String,
    },

    /// Action not permitted here (not in the stage's allowed set, a decline
    /// without a comment, or an attach without an attachment).
    #[error("Action '{action}' is not valid at stage '{stage}': {reason}")]
    InvalidAction {
        action: String,
        stage: String,
        reason: String,
    },

    /// The current stage resolves to zero eligible actors; the instance is
    /// stalled until an administrator reassigns the stage's rule.
    #[error("Stage '{stage}' on instance {id} resolves to no eligible actors ({rule}): {reason}")]
    ActorResolution {
        id: Uuid,
        stage: String,
        rule: String,
        reason: String,
    },

    /// The append-only audit trail was asked to overwrite an entry. Always
    /// a defect, never expected in normal operation.
    #[error("Audit trail immutability violated for instance {id} at sequence {sequence}")]
    ImmutabilityViolation { id: Uuid, sequence: u64 },

    /// Operation reserved to administrators (template management).
    #[error("Actor {actor_id} is not an administrator; '{operation}' is restricted")]
    AdministratorRequired { actor_id: Uuid, operation: String },

    /// Audit export rendering failure.
    #[error("Export failed: {0}")]
    Export(String),

    /// No instance with this id.
    #[error("Instance not found: {0}")]
    InstanceNotFound(Uuid),

    /// No template with this name.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Underlying persistence failure.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Directory lookup failure outside stage resolution (e.g. the
    /// administrator check on cancel).
    #[error("Directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Lift a storage error, translating the two variants that carry
    /// engine-level meaning.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { id, expected_version } => {
                Self::ConcurrentModification { id, expected_version }
            }
            StoreError::AppendOnlyViolation { instance_id, sequence_number } => {
                Self::ImmutabilityViolation { id: instance_id, sequence: sequence_number }
            }
            other => Self::Store(other),
        }
    }
}
