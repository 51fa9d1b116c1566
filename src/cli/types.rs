//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "signoff")]
#[command(about = "Signoff - Multi-stage approval workflows", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize Signoff configuration and database
    Init(InitArgs),

    /// Workflow template management (administrators)
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Submit a subject for approval
    Submit(SubmitArgs),

    /// Approve the current stage of an instance
    Approve(ActArgs),

    /// Decline an instance; a comment is mandatory
    Decline(ActArgs),

    /// Attach supporting material to the current stage
    Attach(ActArgs),

    /// Cancel an active instance (initiator or administrator)
    Cancel(CancelArgs),

    /// Show details for a specific instance
    Show(ShowArgs),

    /// List workflow instances
    List(ListArgs),

    /// List instances waiting on a user's approval
    Pending(PendingArgs),

    /// Show or export an instance's audit trail
    Audit(AuditArgs),

    /// Read a user's in-app notification inbox
    Inbox(InboxArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Create or update a template from a YAML definition file
    Apply {
        /// Path to the template definition (YAML)
        file: PathBuf,

        /// Acting administrator
        #[arg(long, env = "SIGNOFF_ACTOR")]
        actor: Uuid,
    },

    /// List stored templates
    List,

    /// Show one template's stage chain
    Show {
        /// Template name
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Template name to submit against
    pub template: String,

    /// Subject reference, e.g. a purchase requisition number
    pub subject: String,

    /// Submitting user
    #[arg(long, env = "SIGNOFF_ACTOR")]
    pub actor: Uuid,

    /// Optional comment recorded on the submit entry
    #[arg(short, long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug)]
pub struct ActArgs {
    /// Instance ID
    pub instance_id: Uuid,

    /// Acting user
    #[arg(long, env = "SIGNOFF_ACTOR")]
    pub actor: Uuid,

    /// Instance version the decision was made against; defaults to the
    /// currently stored version
    #[arg(short = 'V', long)]
    pub version: Option<u64>,

    /// Free-form comment (mandatory for decline)
    #[arg(short, long)]
    pub comment: Option<String>,

    /// Attachment reference (mandatory for attach)
    #[arg(short, long)]
    pub attachment: Option<String>,
}

#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Instance ID
    pub instance_id: Uuid,

    /// Acting user (must be the initiator or an administrator)
    #[arg(long, env = "SIGNOFF_ACTOR")]
    pub actor: Uuid,

    /// Optional cancellation comment
    #[arg(short, long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Instance ID
    pub instance_id: Uuid,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status: active, approved, declined, cancelled
    #[arg(short, long)]
    pub status: Option<String>,

    /// Filter by template name
    #[arg(short, long)]
    pub template: Option<String>,

    /// Filter by initiator
    #[arg(long)]
    pub initiator: Option<Uuid>,

    /// Filter by subject reference
    #[arg(long)]
    pub subject: Option<String>,

    /// Maximum number of instances to display
    #[arg(short, long, default_value = "50")]
    pub limit: i64,
}

#[derive(Args, Debug)]
pub struct PendingArgs {
    /// User whose pending queue to show
    #[arg(long, env = "SIGNOFF_ACTOR")]
    pub user: Uuid,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Instance ID
    pub instance_id: Uuid,

    /// Export format: csv or pdf (omit for a table)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Write the export to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InboxArgs {
    /// Inbox owner
    #[arg(long, env = "SIGNOFF_ACTOR")]
    pub user: Uuid,

    /// Include notifications already marked read
    #[arg(short, long)]
    pub all: bool,

    /// Mark one notification read
    #[arg(long, value_name = "NOTIFICATION_ID")]
    pub mark_read: Option<Uuid>,

    /// Mark every unread notification read
    #[arg(long)]
    pub mark_all_read: bool,
}
