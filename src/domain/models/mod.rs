pub mod audit;
pub mod config;
pub mod instance;
pub mod notification;
pub mod template;

pub use audit::{AuditAction, AuditEntry};
pub use config::{
    Config, DatabaseConfig, DirectoryConfig, LoggingConfig, NotificationsConfig, RelationBinding,
};
pub use instance::{WorkflowInstance, WorkflowStatus};
pub use notification::{Notification, NotificationKind};
pub use template::{ActorRule, StageAction, StageDefinition, TemplateDefinition, WorkflowTemplate};
