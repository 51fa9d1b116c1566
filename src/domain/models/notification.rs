//! Notification domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a notification was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Recipient gates the instance's current stage
    ActionRequired,
    /// The instance the recipient initiated reached a terminal status
    TerminalResolution,
    /// A stage resolved to zero eligible actors; sent to administrators
    StalledStage,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionRequired => "action_required",
            Self::TerminalResolution => "terminal_resolution",
            Self::StalledStage => "stalled_stage",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "action_required" => Some(Self::ActionRequired),
            "terminal_resolution" => Some(Self::TerminalResolution),
            "stalled_stage" => Some(Self::StalledStage),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message addressed to one recipient about one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Target user
    pub recipient_id: Uuid,
    /// Instance the message is about
    pub instance_id: Uuid,
    /// Why it was sent
    pub kind: NotificationKind,
    /// Rendered message text
    pub message: String,
    /// Whether the recipient has seen it (in-app channel only)
    pub read: bool,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: Uuid,
        instance_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            instance_id,
            kind,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}
