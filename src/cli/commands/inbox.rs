//! In-app notification inbox commands.

use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::TableFormatter;
use crate::cli::types::InboxArgs;

pub async fn execute(args: InboxArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_inbox(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

async fn handle_inbox(ctx: &AppContext, args: InboxArgs, json: bool) -> Result<()> {
    if let Some(id) = args.mark_read {
        ctx.inbox
            .mark_read(id)
            .await
            .with_context(|| format!("Failed to mark notification {id} read"))?;
        if json {
            let summary = serde_json::json!({ "marked_read": id });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Notification {id} marked read.");
        }
        return Ok(());
    }

    if args.mark_all_read {
        let marked = ctx
            .inbox
            .mark_all_read(args.user)
            .await
            .context("Failed to mark notifications read")?;
        if json {
            let summary = serde_json::json!({ "marked_read": marked });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Marked {marked} notification(s) read.");
        }
        return Ok(());
    }

    let notifications = ctx
        .inbox
        .inbox(args.user, args.all)
        .await
        .context("Failed to read inbox")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notifications)?);
    } else if notifications.is_empty() {
        println!("Inbox is empty.");
    } else {
        println!("{}", TableFormatter::new().format_notifications(&notifications));
    }

    Ok(())
}
