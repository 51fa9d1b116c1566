//! Compliance export of audit trails.
//!
//! Pure projections: the same instance and entries always render to the
//! same bytes, so repeated exports of an unchanged trail are
//! byte-identical. Nothing here touches storage or the clock.

use thiserror::Error;

use crate::domain::models::{AuditEntry, WorkflowInstance};

/// Supported export renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Export rendering errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export buffer error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render an instance's audit trail in the requested format.
pub fn render(
    format: ExportFormat,
    instance: &WorkflowInstance,
    entries: &[AuditEntry],
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => render_csv(entries),
        ExportFormat::Pdf => Ok(render_pdf(instance, entries)),
    }
}

/// CSV projection: fixed header, one row per entry, RFC3339 timestamps.
pub fn render_csv(entries: &[AuditEntry]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([
        "sequence",
        "recorded_at",
        "actor_id",
        "action",
        "stage_index",
        "stage_name",
        "comment",
        "attachment_ref",
    ])?;

    for entry in entries {
        writer.write_record([
            entry.sequence_number.to_string().as_str(),
            entry.recorded_at.to_rfc3339().as_str(),
            entry.actor_id.to_string().as_str(),
            entry.action.as_str(),
            entry.stage_index.to_string().as_str(),
            entry.stage_name.as_str(),
            entry.comment.as_deref().unwrap_or(""),
            entry.attachment_ref.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// PDF projection: a minimal paginated document, monospaced, one line per
/// entry plus continuation lines for comments and attachments. The
/// document carries no producer metadata or creation timestamp.
pub fn render_pdf(instance: &WorkflowInstance, entries: &[AuditEntry]) -> Vec<u8> {
    let lines = trail_lines(instance, entries);
    assemble_pdf(&lines)
}

fn trail_lines(instance: &WorkflowInstance, entries: &[AuditEntry]) -> Vec<String> {
    let mut lines = vec![
        "Audit Trail".to_string(),
        format!("Instance:  {}", instance.id),
        format!("Template:  {}", instance.template_name),
        format!("Subject:   {}", instance.subject_ref),
        format!("Status:    {}", instance.status),
        String::new(),
        format!(
            "{:>4}  {:<25}  {:<36}  {:<8}  Stage",
            "Seq", "Recorded", "Actor", "Action"
        ),
    ];

    for entry in entries {
        lines.push(format!(
            "{:>4}  {:<25}  {:<36}  {:<8}  [{}] {}",
            entry.sequence_number,
            entry.recorded_at.to_rfc3339(),
            entry.actor_id,
            entry.action.as_str(),
            entry.stage_index,
            entry.stage_name,
        ));
        if let Some(comment) = &entry.comment {
            lines.push(format!("      comment: {comment}"));
        }
        if let Some(attachment_ref) = &entry.attachment_ref {
            lines.push(format!("      attachment: {attachment_ref}"));
        }
    }

    lines
}

const LINES_PER_PAGE: usize = 54;

/// Hand-assembled PDF 1.4. Object layout is fixed: catalog, page tree,
/// font, then a page/content pair per page, so identical input lines
/// always produce identical bytes.
fn assemble_pdf(lines: &[String]) -> Vec<u8> {
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    let page_count = pages.len();
    let object_count = 3 + 2 * page_count;

    // Object ids: 1 catalog, 2 page tree, 3 font, then (page, contents)
    // pairs from 4.
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    let mut objects: Vec<Vec<u8>> = Vec::with_capacity(object_count);
    objects.push(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec());
    objects.push(
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            page_count
        )
        .into_bytes(),
    );
    objects.push(
        b"3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>\nendobj\n".to_vec(),
    );

    for (i, page_lines) in pages.iter().enumerate() {
        let page_id = 4 + 2 * i;
        let contents_id = page_id + 1;

        objects.push(
            format!(
                "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {contents_id} 0 R >>\nendobj\n"
            )
            .into_bytes(),
        );

        let mut stream = String::from("BT\n/F1 9 Tf\n50 770 Td\n13 TL\n");
        for line in *page_lines {
            stream.push('(');
            stream.push_str(&escape_pdf_text(line));
            stream.push_str(") Tj T*\n");
        }
        stream.push_str("ET\n");

        let mut object = format!("{contents_id} 0 obj\n<< /Length {} >>\nstream\n", stream.len())
            .into_bytes();
        object.extend_from_slice(stream.as_bytes());
        object.extend_from_slice(b"endstream\nendobj\n");
        objects.push(object);
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(object_count);
    for object in &objects {
        offsets.push(out.len());
        out.extend_from_slice(object);
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}

fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}
