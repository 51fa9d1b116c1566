//! Table output formatting for CLI commands
//!
//! Provides formatted table output for instances, templates, audit trails,
//! and notifications using comfy-table. Supports color-coded cells,
//! automatic column sizing, and accessibility features.

use crate::domain::models::{
    AuditAction, AuditEntry, Notification, WorkflowInstance, WorkflowStatus, WorkflowTemplate,
};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format a list of workflow instances as a table
    pub fn format_instances(&self, instances: &[WorkflowInstance]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Subject").add_attribute(Attribute::Bold),
            Cell::new("Template").add_attribute(Attribute::Bold),
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Ver").add_attribute(Attribute::Bold),
            Cell::new("Updated").add_attribute(Attribute::Bold),
        ]);

        for instance in instances {
            let id_short = &instance.id.to_string()[..8];
            let subject = truncate_text(&instance.subject_ref, 30);

            // The cursor is frozen once terminal, so this still names the
            // stage a declined instance stopped at.
            let stage = instance
                .current_stage()
                .map(|s| {
                    format!(
                        "{} ({}/{})",
                        s.name,
                        instance.current_stage_index + 1,
                        instance.template_snapshot.len()
                    )
                })
                .unwrap_or_else(|| "-".to_string());

            let status_cell = if self.use_colors {
                Cell::new(instance.status.to_string()).fg(status_color(&instance.status))
            } else {
                Cell::new(format!(
                    "{} {}",
                    status_icon(&instance.status),
                    instance.status
                ))
            };

            table.add_row(vec![
                Cell::new(id_short),
                Cell::new(&subject),
                Cell::new(truncate_text(&instance.template_name, 25)),
                Cell::new(truncate_text(&stage, 25)),
                status_cell,
                Cell::new(instance.version.to_string()),
                Cell::new(format_relative_time(&instance.updated_at)),
            ]);
        }

        table.to_string()
    }

    /// Format a list of workflow templates as a table
    pub fn format_templates(&self, templates: &[WorkflowTemplate]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Stages").add_attribute(Attribute::Bold),
            Cell::new("Chain").add_attribute(Attribute::Bold),
        ]);

        for template in templates {
            let chain = template
                .stages
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(" > ");

            table.add_row(vec![
                Cell::new(&template.name),
                Cell::new(truncate_text(&template.description, 40)),
                Cell::new(template.stages.len().to_string()),
                Cell::new(truncate_text(&chain, 50)),
            ]);
        }

        table.to_string()
    }

    /// Format an instance's audit trail as a table
    pub fn format_audit_trail(&self, entries: &[AuditEntry]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Recorded").add_attribute(Attribute::Bold),
            Cell::new("Actor").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Comment").add_attribute(Attribute::Bold),
            Cell::new("Attachment").add_attribute(Attribute::Bold),
        ]);

        for entry in entries {
            let actor_short = &entry.actor_id.to_string()[..8];

            let action_cell = if self.use_colors {
                Cell::new(entry.action.to_string()).fg(action_color(&entry.action))
            } else {
                Cell::new(entry.action.to_string())
            };

            table.add_row(vec![
                Cell::new(entry.sequence_number.to_string()),
                Cell::new(entry.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string()),
                Cell::new(actor_short),
                action_cell,
                Cell::new(format!("{} {}", entry.stage_index, entry.stage_name)),
                Cell::new(truncate_text(entry.comment.as_deref().unwrap_or("-"), 40)),
                Cell::new(entry.attachment_ref.as_deref().unwrap_or("-")),
            ]);
        }

        table.to_string()
    }

    /// Format a user's notification inbox as a table
    pub fn format_notifications(&self, notifications: &[Notification]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Received").add_attribute(Attribute::Bold),
            Cell::new("Kind").add_attribute(Attribute::Bold),
            Cell::new("Instance").add_attribute(Attribute::Bold),
            Cell::new("Message").add_attribute(Attribute::Bold),
            Cell::new("Read").add_attribute(Attribute::Bold),
        ]);

        for notification in notifications {
            let id_short = &notification.id.to_string()[..8];
            let instance_short = &notification.instance_id.to_string()[..8];

            let read_cell = if notification.read {
                Cell::new("yes")
            } else if self.use_colors {
                Cell::new("unread").fg(Color::Yellow)
            } else {
                Cell::new("unread")
            };

            table.add_row(vec![
                Cell::new(id_short),
                Cell::new(format_relative_time(&notification.created_at)),
                Cell::new(notification.kind.to_string()),
                Cell::new(instance_short),
                Cell::new(truncate_text(&notification.message, 60)),
                read_cell,
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        // Use UTF-8 preset for nice borders
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        // Apply max width if set
        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check for dumb terminal
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

/// Map instance status to color
fn status_color(status: &WorkflowStatus) -> Color {
    match status {
        WorkflowStatus::Active => Color::Cyan,
        WorkflowStatus::Approved => Color::Green,
        WorkflowStatus::Declined => Color::Red,
        WorkflowStatus::Cancelled => Color::DarkGrey,
    }
}

/// Map instance status to icon
fn status_icon(status: &WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Active => "⟳",
        WorkflowStatus::Approved => "✓",
        WorkflowStatus::Declined => "✗",
        WorkflowStatus::Cancelled => "⊘",
    }
}

/// Map audit action to color
fn action_color(action: &AuditAction) -> Color {
    match action {
        AuditAction::Submit => Color::White,
        AuditAction::Approve => Color::Green,
        AuditAction::Decline => Color::Red,
        AuditAction::Attach => Color::Cyan,
        AuditAction::Cancel => Color::DarkGrey,
    }
}

/// Truncate text to max byte length with ellipsis
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    // The budget is in bytes; back off to a char boundary so multi-byte
    // text never splits mid-character.
    let cut = max_len.saturating_sub(3);
    let boundary = text
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= cut)
        .last()
        .unwrap_or(0);
    format!("{}...", &text[..boundary])
}

/// Format relative time (e.g., "2 hours ago")
fn format_relative_time(datetime: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(*datetime);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        datetime.format("%Y-%m-%d").to_string()
    }
}
