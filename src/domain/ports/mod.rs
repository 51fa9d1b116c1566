//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters
//! and embedding applications implement:
//! - TemplateRepository / InstanceRepository / AuditTrailStore: persistence
//! - UserDirectory: external user/role directory lookups
//! - NotificationChannel: notification delivery transports
//! - SideEffectHook: per-domain terminal-state callbacks
//!
//! These traits are the contracts that keep the engine independent of any
//! specific infrastructure.

pub mod audit_store;
pub mod directory;
pub mod errors;
pub mod hooks;
pub mod instance_repository;
pub mod notifier;
pub mod template_repository;

pub use audit_store::AuditTrailStore;
pub use directory::UserDirectory;
pub use errors::{ChannelError, DirectoryError, StoreError};
pub use hooks::SideEffectHook;
pub use instance_repository::{InstanceFilters, InstanceRepository};
pub use notifier::NotificationChannel;
pub use template_repository::TemplateRepository;
