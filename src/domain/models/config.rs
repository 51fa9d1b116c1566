//! Configuration domain model.
//!
//! Sections mirror the crate's moving parts: database, logging, the static
//! user directory backing actor resolution, and notification channels.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Main configuration structure for Signoff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Static user directory (roles, relations, administrators)
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Notification channel toggles
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            directory: DirectoryConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections kept warm
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_database_path() -> String {
    ".signoff/signoff.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    2
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// One (subject, relation) -> user binding for relation-based actor rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RelationBinding {
    /// Subject reference the binding applies to
    pub subject_ref: String,

    /// Relation name (e.g. "department_head_of_requester")
    pub relation: String,

    /// Resolved user
    pub user_id: Uuid,
}

/// Static user directory backing the shipped `UserDirectory` implementation.
/// Larger deployments swap this for a real directory adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DirectoryConfig {
    /// Role name -> current holders
    #[serde(default)]
    pub roles: HashMap<String, Vec<Uuid>>,

    /// Relation bindings, looked up by (subject_ref, relation)
    #[serde(default)]
    pub relations: Vec<RelationBinding>,

    /// Users allowed to cancel any instance and manage templates
    #[serde(default)]
    pub administrators: Vec<Uuid>,
}

/// Notification channel toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationsConfig {
    /// Persist notifications to the in-app inbox table
    #[serde(default = "default_channel_enabled")]
    pub in_app: bool,

    /// Emit notifications as structured log events
    #[serde(default = "default_channel_enabled")]
    pub log: bool,
}

const fn default_channel_enabled() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            in_app: default_channel_enabled(),
            log: default_channel_enabled(),
        }
    }
}
