//! Workflow template CLI commands.

use anyhow::{Context, Result};
use std::path::PathBuf;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::TemplateCommands;
use crate::domain::models::TemplateDefinition;

#[derive(Debug, serde::Serialize)]
struct TemplateAppliedOutput {
    name: String,
    template_id: Uuid,
    stage_count: usize,
    stages: Vec<String>,
}

impl CommandOutput for TemplateAppliedOutput {
    fn to_human(&self) -> String {
        format!(
            "Template '{}' applied.\n  ID: {}\n  Chain: {}",
            self.name,
            self.template_id,
            self.stages.join(" > ")
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(command: TemplateCommands, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = match command {
        TemplateCommands::Apply { file, actor } => handle_apply(&ctx, file, actor, json_mode).await,
        TemplateCommands::List => handle_list(&ctx, json_mode).await,
        TemplateCommands::Show { name } => handle_show(&ctx, &name, json_mode).await,
    };
    ctx.close().await;
    result
}

/// Handle template apply command
async fn handle_apply(
    ctx: &AppContext,
    file: PathBuf,
    actor: Uuid,
    json_mode: bool,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {file:?}"))?;
    let definition: TemplateDefinition = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse template definition {file:?}"))?;

    let template = ctx
        .templates
        .apply(actor, definition)
        .await
        .context("Failed to apply template")?;

    let out = TemplateAppliedOutput {
        name: template.name.clone(),
        template_id: template.id,
        stage_count: template.stages.len(),
        stages: template.stages.iter().map(|s| s.name.clone()).collect(),
    };
    output(&out, json_mode);
    Ok(())
}

/// Handle template list command
async fn handle_list(ctx: &AppContext, json: bool) -> Result<()> {
    let templates = ctx
        .templates
        .list()
        .await
        .context("Failed to list templates")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
    } else if templates.is_empty() {
        println!("No templates stored. Use 'signoff template apply <file>' to add one.");
    } else {
        println!("{}", TableFormatter::new().format_templates(&templates));
    }

    Ok(())
}

/// Handle template show command
async fn handle_show(ctx: &AppContext, name: &str, json: bool) -> Result<()> {
    let template = ctx
        .templates
        .get(name)
        .await
        .with_context(|| format!("Failed to retrieve template '{name}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&template)?);
    } else {
        println!("Template: {}", template.name);
        if !template.description.is_empty() {
            println!("Description: {}", template.description);
        }
        println!(
            "Updated at: {}",
            template.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("Stages ({}):", template.stages.len());
        for (i, stage) in template.stages.iter().enumerate() {
            println!("  {}. {} [{}]", i + 1, stage.name, stage.actor_rule);
            let actions = stage
                .allowed_actions
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("     Actions: {actions}");
        }
    }

    Ok(())
}
