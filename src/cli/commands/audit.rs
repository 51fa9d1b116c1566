//! Audit trail display and export commands.

use anyhow::{Context, Result};
use std::io::Write;

use crate::cli::context::AppContext;
use crate::cli::output::TableFormatter;
use crate::cli::types::AuditArgs;
use crate::services::ExportFormat;

pub async fn execute(args: AuditArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_audit(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

async fn handle_audit(ctx: &AppContext, args: AuditArgs, json: bool) -> Result<()> {
    let entries = ctx
        .engine
        .audit_trail(args.instance_id)
        .await
        .context("Failed to read audit trail")?;

    let Some(format_str) = args.format.as_deref() else {
        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else if entries.is_empty() {
            println!("No audit entries for {}.", args.instance_id);
        } else {
            println!("{}", TableFormatter::new().format_audit_trail(&entries));
        }
        return Ok(());
    };

    let format = ExportFormat::from_str(format_str).ok_or_else(|| {
        anyhow::anyhow!("Unknown export format '{format_str}'. Valid values: csv, pdf")
    })?;

    let bytes = ctx
        .engine
        .export(args.instance_id, format)
        .await
        .context("Failed to render export")?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {path:?}"))?;
            if json {
                let summary = serde_json::json!({
                    "instance_id": args.instance_id,
                    "format": format.as_str(),
                    "path": path,
                    "bytes": bytes.len(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Exported {} audit entr{} to {} ({} bytes)",
                    entries.len(),
                    if entries.len() == 1 { "y" } else { "ies" },
                    path.display(),
                    bytes.len()
                );
            }
        }
        None => {
            // Raw bytes on stdout so the export can be piped
            std::io::stdout()
                .write_all(&bytes)
                .context("Failed to write export to stdout")?;
        }
    }

    Ok(())
}
