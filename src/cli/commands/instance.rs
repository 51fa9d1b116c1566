//! Instance lifecycle CLI commands: submit, approve, decline, attach,
//! cancel, show, list, pending.

use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::TableFormatter;
use crate::cli::types::{ActArgs, CancelArgs, ListArgs, PendingArgs, ShowArgs, SubmitArgs};
use crate::domain::models::{StageAction, WorkflowInstance, WorkflowStatus};
use crate::domain::ports::InstanceFilters;
use crate::services::ActionRequest;

pub async fn execute_submit(args: SubmitArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_submit(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

pub async fn execute_act(args: ActArgs, action: StageAction, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_act(&ctx, args, action, json_mode).await;
    ctx.close().await;
    result
}

pub async fn execute_cancel(args: CancelArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_cancel(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

pub async fn execute_show(args: ShowArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_show(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

pub async fn execute_list(args: ListArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_list(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

pub async fn execute_pending(args: PendingArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::init().await?;
    let result = handle_pending(&ctx, args, json_mode).await;
    ctx.close().await;
    result
}

/// Handle instance submit command
async fn handle_submit(ctx: &AppContext, args: SubmitArgs, json: bool) -> Result<()> {
    let instance = ctx
        .engine
        .submit(&args.template, &args.subject, args.actor, args.comment)
        .await
        .with_context(|| format!("Failed to submit '{}'", args.subject))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        println!("Instance submitted successfully!");
        println!("  Instance ID: {}", instance.id);
        println!("  Subject: {}", instance.subject_ref);
        println!("  Template: {}", instance.template_name);
        if let Some(stage) = instance.current_stage() {
            println!(
                "  Waiting on stage: {} ({})",
                stage.name, stage.actor_rule
            );
        }
        println!("  Version: {}", instance.version);
    }

    Ok(())
}

/// Handle approve, decline, and attach commands
async fn handle_act(
    ctx: &AppContext,
    args: ActArgs,
    action: StageAction,
    json: bool,
) -> Result<()> {
    // When no version was given, act against the instance as currently
    // stored. Passing one explicitly keeps the read-then-decide guarantee.
    let expected_version = match args.version {
        Some(version) => version,
        None => {
            ctx.engine
                .get(args.instance_id)
                .await
                .context("Failed to retrieve instance")?
                .version
        }
    };

    let mut request = ActionRequest::new(args.instance_id, args.actor, action, expected_version);
    if let Some(comment) = args.comment {
        request = request.with_comment(comment);
    }
    if let Some(attachment) = args.attachment {
        request = request.with_attachment(attachment);
    }

    let instance = ctx
        .engine
        .act(request)
        .await
        .with_context(|| format!("Failed to {} instance {}", action.as_str(), args.instance_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        match action {
            StageAction::Approve => println!("Approval recorded!"),
            StageAction::Decline => println!("Decline recorded!"),
            StageAction::Attach => println!("Attachment recorded!"),
        }
        print_transition(&instance);
    }

    Ok(())
}

/// Handle instance cancel command
async fn handle_cancel(ctx: &AppContext, args: CancelArgs, json: bool) -> Result<()> {
    let instance = ctx
        .engine
        .cancel(args.instance_id, args.actor, args.comment)
        .await
        .with_context(|| format!("Failed to cancel instance {}", args.instance_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        println!("Instance cancelled.");
        print_transition(&instance);
    }

    Ok(())
}

fn print_transition(instance: &WorkflowInstance) {
    println!("  Instance: {}", instance.id);
    println!("  Status: {}", instance.status);
    if instance.status == WorkflowStatus::Active {
        if let Some(stage) = instance.current_stage() {
            println!(
                "  Now at stage: {} ({}/{})",
                stage.name,
                instance.current_stage_index + 1,
                instance.template_snapshot.len()
            );
        }
    }
    println!("  Version: {}", instance.version);
}

/// Handle instance show command
async fn handle_show(ctx: &AppContext, args: ShowArgs, json: bool) -> Result<()> {
    let instance = ctx
        .engine
        .get(args.instance_id)
        .await
        .context("Failed to retrieve instance")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        println!("Instance Details:");
        println!("  ID: {}", instance.id);
        println!("  Subject: {}", instance.subject_ref);
        println!("  Template: {}", instance.template_name);
        println!("  Status: {}", instance.status);
        println!("  Initiator: {}", instance.initiator_id);
        println!("  Version: {}", instance.version);
        println!(
            "  Created at: {}",
            instance.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!(
            "  Updated at: {}",
            instance.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(closed_at) = instance.closed_at {
            println!(
                "  Closed at: {}",
                closed_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }

        println!("  Stages:");
        for (i, stage) in instance.template_snapshot.iter().enumerate() {
            let marker = if i == instance.current_stage_index {
                if instance.status == WorkflowStatus::Active {
                    ">"
                } else {
                    "x"
                }
            } else if i < instance.current_stage_index {
                "+"
            } else {
                " "
            };
            println!("    {} {}. {} [{}]", marker, i + 1, stage.name, stage.actor_rule);
        }
    }

    Ok(())
}

/// Handle instance list command
async fn handle_list(ctx: &AppContext, args: ListArgs, json: bool) -> Result<()> {
    let status = args
        .status
        .as_deref()
        .map(|s| {
            WorkflowStatus::from_str(s).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown status '{s}'. Valid values: active, approved, declined, cancelled"
                )
            })
        })
        .transpose()?;

    let filters = InstanceFilters {
        status,
        template_name: args.template,
        initiator_id: args.initiator,
        subject_ref: args.subject,
        limit: Some(args.limit),
    };

    let instances = ctx
        .engine
        .list(filters)
        .await
        .context("Failed to list instances")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else {
        if instances.is_empty() {
            println!("No instances found.");
            return Ok(());
        }

        println!("{}", TableFormatter::new().format_instances(&instances));
        println!("\nShowing {} instance(s)", instances.len());
    }

    Ok(())
}

/// Handle pending command
async fn handle_pending(ctx: &AppContext, args: PendingArgs, json: bool) -> Result<()> {
    let instances = ctx
        .engine
        .pending_for(args.user)
        .await
        .context("Failed to resolve pending queue")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else {
        if instances.is_empty() {
            println!("Nothing is waiting on {}.", args.user);
            return Ok(());
        }

        println!("Waiting on {}:", args.user);
        println!("{}", TableFormatter::new().format_instances(&instances));
    }

    Ok(())
}
