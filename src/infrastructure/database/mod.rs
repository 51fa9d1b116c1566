//! SQLite persistence for templates, instances, and the audit trail.

pub mod audit_repo;
pub mod connection;
pub mod instance_repo;
pub mod template_repo;
pub mod utils;

pub use audit_repo::SqliteAuditStore;
pub use connection::Database;
pub use instance_repo::SqliteInstanceRepository;
pub use template_repo::SqliteTemplateRepository;
