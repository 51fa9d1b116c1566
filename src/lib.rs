//! Signoff - Multi-stage approval workflows
//!
//! Signoff routes a subject (a purchase requisition, a leave request, an
//! invoice) through an ordered chain of approval stages, keeping an
//! append-only audit trail of every decision and notifying whoever the
//! next stage resolves to.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): templates, instances, audit entries, and
//!   the port traits the engine is generic over
//! - **Service Layer** (`services`): the workflow engine, actor resolution,
//!   notification dispatch, and audit export
//! - **Infrastructure Layer** (`infrastructure`): SQLite persistence, the
//!   static user directory, and notification channels
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use signoff::cli::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::init().await?;
//!     let pending = ctx.engine.pending_for(my_user_id).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{EngineError, EngineResult};
pub use domain::models::{
    ActorRule, AuditAction, AuditEntry, Config, DatabaseConfig, LoggingConfig, Notification,
    NotificationKind, StageAction, StageDefinition, TemplateDefinition, WorkflowInstance,
    WorkflowStatus, WorkflowTemplate,
};
pub use domain::ports::{
    AuditTrailStore, InstanceFilters, InstanceRepository, NotificationChannel, SideEffectHook,
    TemplateRepository, UserDirectory,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ActionRequest, ExportFormat, WorkflowEngine};
