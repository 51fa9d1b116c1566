//! Workflow template domain model.
//!
//! A template is the administrator-edited definition of an approval chain:
//! an ordered list of stages, each gated by an actor rule. Instances capture
//! a snapshot of the stage list at submission time, so later template edits
//! never touch in-flight work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An action an actor can submit at a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    /// Advance to the next stage, or settle the instance on the last stage
    Approve,
    /// Terminate the instance at any stage
    Decline,
    /// Record an attachment without advancing
    Attach,
}

impl StageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Decline => "decline",
            Self::Attach => "attach",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "decline" | "reject" => Some(Self::Decline),
            "attach" => Some(Self::Attach),
            _ => None,
        }
    }
}

impl std::fmt::Display for StageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the permitted actor set for a stage is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActorRule {
    /// Every current holder of a role may act
    ByRole { role: String },
    /// A single user related to the instance's subject
    /// (e.g. "department_head_of_requester")
    ByRelation { relation: String },
    /// One explicitly assigned user
    Explicit { user_id: Uuid },
}

impl ActorRule {
    /// Human-readable form for logs and stalled-stage alerts.
    pub fn describe(&self) -> String {
        match self {
            Self::ByRole { role } => format!("role '{role}'"),
            Self::ByRelation { relation } => format!("relation '{relation}'"),
            Self::Explicit { user_id } => format!("user {user_id}"),
        }
    }
}

impl std::fmt::Display for ActorRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

fn default_allowed_actions() -> Vec<StageAction> {
    vec![StageAction::Approve, StageAction::Decline, StageAction::Attach]
}

/// One gate in a template's ordered stage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Display name, unique within the template (e.g. "HOD", "Finance")
    pub name: String,
    /// Who may act at this stage
    pub actor_rule: ActorRule,
    /// Actions this stage accepts; defaults to all of them
    #[serde(default = "default_allowed_actions")]
    pub allowed_actions: Vec<StageAction>,
}

impl StageDefinition {
    pub fn new(name: impl Into<String>, actor_rule: ActorRule) -> Self {
        Self {
            name: name.into(),
            actor_rule,
            allowed_actions: default_allowed_actions(),
        }
    }

    /// Restrict the stage to a specific action set.
    pub fn with_actions(mut self, actions: Vec<StageAction>) -> Self {
        self.allowed_actions = actions;
        self
    }

    pub fn allows(&self, action: StageAction) -> bool {
        self.allowed_actions.contains(&action)
    }
}

/// The administrator-facing shape of a template: what a YAML template file
/// contains, and what `TemplateService::apply` consumes. Carries no id or
/// timestamps; those belong to the stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stages: Vec<StageDefinition>,
}

/// An administrator-edited approval chain definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    /// Unique identifier
    pub id: Uuid,
    /// Unique name callers submit against (e.g. "procurement-request")
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Ordered stage list; order defines the only valid forward path
    pub stages: Vec<StageDefinition>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last edited
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTemplate {
    /// Create a new template from a name and stage list.
    pub fn new(name: impl Into<String>, stages: Vec<StageDefinition>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            stages,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a template from an administrator-supplied definition.
    pub fn from_definition(definition: TemplateDefinition) -> Self {
        let mut template = Self::new(definition.name, definition.stages);
        template.description = definition.description;
        template
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replace the ordered stage list (administrator edit). Instances that
    /// already captured a snapshot are unaffected.
    pub fn replace_stages(&mut self, stages: Vec<StageDefinition>) -> Result<(), String> {
        let previous = std::mem::replace(&mut self.stages, stages);
        if let Err(e) = self.validate() {
            self.stages = previous;
            return Err(e);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Stage at the given index, if any.
    pub fn stage(&self, index: usize) -> Option<&StageDefinition> {
        self.stages.get(index)
    }

    /// Validate template structure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Template name cannot be empty".to_string());
        }
        if self.stages.len() < 2 {
            return Err(format!(
                "Template '{}' needs at least 2 stages, got {}",
                self.name,
                self.stages.len()
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(format!("Template '{}' has a stage with an empty name", self.name));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(format!(
                    "Template '{}' has duplicate stage name '{}'",
                    self.name, stage.name
                ));
            }
            if !stage.allows(StageAction::Approve) {
                return Err(format!(
                    "Stage '{}' must allow approve; a stage nobody can pass blocks the whole chain",
                    stage.name
                ));
            }
        }
        Ok(())
    }
}
