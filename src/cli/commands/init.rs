//! Implementation of the `signoff init` command.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::cli::types::InitArgs;
use crate::domain::models::{Config, DatabaseConfig};
use crate::infrastructure::database::Database;

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub config_written: bool,
    pub database_initialized: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push("\nDefault configuration written to .signoff/config.yaml".to_string());
        }
        if self.database_initialized {
            lines.push("Database initialized at .signoff/signoff.db".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let signoff_dir = target_path.join(".signoff");

    // Check if already initialized
    if signoff_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path,
            config_written: false,
            database_initialized: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    // If forcing, remove existing
    if args.force && signoff_dir.exists() {
        fs::remove_dir_all(&signoff_dir)
            .await
            .context("Failed to remove existing .signoff directory")?;
    }

    fs::create_dir_all(&signoff_dir)
        .await
        .with_context(|| format!("Failed to create {signoff_dir:?}"))?;

    // Write the default configuration so operators have something to edit
    let config_path = signoff_dir.join("config.yaml");
    let config_yaml = serde_yaml::to_string(&Config::default())
        .context("Failed to render default configuration")?;
    fs::write(&config_path, config_yaml)
        .await
        .with_context(|| format!("Failed to write {config_path:?}"))?;

    // Opening the database runs migrations
    let db_config = DatabaseConfig {
        path: signoff_dir.join("signoff.db").display().to_string(),
        ..DatabaseConfig::default()
    };
    let db = Database::connect(&db_config)
        .await
        .context("Failed to initialize database")?;
    db.close().await;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path,
        config_written: true,
        database_initialized: true,
    };

    output(&output_data, json_mode);
    Ok(())
}
