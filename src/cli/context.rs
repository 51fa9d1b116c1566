//! Shared wiring for CLI commands.
//!
//! Builds the engine and its collaborators once per invocation from the
//! loaded configuration.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::models::Config;
use crate::domain::ports::NotificationChannel;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{
    Database, SqliteAuditStore, SqliteInstanceRepository, SqliteTemplateRepository,
};
use crate::infrastructure::directory::StaticDirectory;
use crate::infrastructure::notify::{InAppChannel, LogChannel};
use crate::services::{DispatchMode, NotificationDispatcher, TemplateService, WorkflowEngine};

/// The engine as wired by the CLI.
pub type SqliteEngine = WorkflowEngine<
    SqliteTemplateRepository,
    SqliteInstanceRepository,
    SqliteAuditStore,
    StaticDirectory,
>;

/// Everything a command handler needs.
pub struct AppContext {
    pub config: Config,
    pub engine: SqliteEngine,
    pub templates: TemplateService<SqliteTemplateRepository, StaticDirectory>,
    pub inbox: InAppChannel,
    db: Database,
}

impl AppContext {
    /// Load configuration and wire the engine against the configured
    /// database.
    pub async fn init() -> Result<Self> {
        let config = ConfigLoader::load().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Wire the engine from an already loaded configuration.
    pub async fn with_config(config: Config) -> Result<Self> {
        let db = Database::connect(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let template_repo = Arc::new(SqliteTemplateRepository::new(db.pool().clone()));
        let instance_repo = Arc::new(SqliteInstanceRepository::new(db.pool().clone()));
        let audit_store = Arc::new(SqliteAuditStore::new(db.pool().clone()));
        let directory = Arc::new(StaticDirectory::new(&config.directory));

        let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
        if config.notifications.in_app {
            channels.push(Arc::new(InAppChannel::new(db.pool().clone())));
        }
        if config.notifications.log {
            channels.push(Arc::new(LogChannel::new()));
        }

        // The process exits as soon as the command returns, so deliver
        // inline rather than on a spawned task that may never run.
        let dispatcher =
            Arc::new(NotificationDispatcher::new(channels).with_mode(DispatchMode::Inline));

        let engine = WorkflowEngine::new(
            template_repo.clone(),
            instance_repo,
            audit_store,
            directory.clone(),
            dispatcher,
        );
        let templates = TemplateService::new(template_repo, directory);
        let inbox = InAppChannel::new(db.pool().clone());

        Ok(Self {
            config,
            engine,
            templates,
            inbox,
            db,
        })
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.db.close().await;
    }
}
