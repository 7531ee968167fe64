//! Input extraction: turns uploaded résumé files and job-posting URLs into plain text.
//!
//! PDF parsing is CPU-bound and can panic on malformed input, so it runs on the
//! blocking pool where a panic surfaces as a `JoinError` instead of taking the
//! worker down.

use docx_rs::{
    read_docx, DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table,
    TableCellContent, TableChild, TableRowChild,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub mod job_posting;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type '{0}'. Upload a PDF, DOCX or TXT file.")]
    UnsupportedFileType(String),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to extract text from DOCX: {0}")]
    Docx(String),

    #[error("No readable text found in {0}")]
    Empty(String),

    #[error("Failed to fetch URL: {0}")]
    Fetch(String),
}

/// Where the résumé text came from. Reported back in `source_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeSource {
    Text,
    Pdf,
    Docx,
    Txt,
}

impl ResumeSource {
    /// File kind from the upload's extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(ResumeSource::Pdf),
            "docx" => Ok(ResumeSource::Docx),
            "txt" => Ok(ResumeSource::Txt),
            _ => Err(ExtractionError::UnsupportedFileType(filename.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Extracts trimmed, non-empty text from an uploaded résumé.
pub async fn extract_resume_file(
    file: UploadedFile,
) -> Result<(String, ResumeSource), ExtractionError> {
    let source = ResumeSource::from_filename(&file.filename)?;
    let filename = file.filename;
    let bytes = file.bytes;

    let text = match source {
        ResumeSource::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ExtractionError::Pdf(format!("parser aborted: {e}")))?
        .map_err(ExtractionError::Pdf)?,
        ResumeSource::Docx => tokio::task::spawn_blocking(move || docx_text(&bytes))
            .await
            .map_err(|e| ExtractionError::Docx(format!("parser aborted: {e}")))??,
        ResumeSource::Txt | ResumeSource::Text => String::from_utf8_lossy(&bytes).into_owned(),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractionError::Empty(filename));
    }
    debug!("Extracted {} chars from {filename} ({source:?})", text.len());
    Ok((text, source))
}

/// Paragraph and table-cell text of a DOCX, one paragraph per line.
///
/// Only visible run text is kept: field instructions and tracked deletions are
/// dropped, tracked insertions and hyperlink text are kept.
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => table_lines(table, &mut lines),
            _ => {}
        }
    }

    Ok(lines
        .iter()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn table_lines(table: &Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                if let TableCellContent::Paragraph(paragraph) = content {
                    lines.push(paragraph_text(paragraph));
                }
            }
        }
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        push_paragraph_child(child, &mut out);
    }
    out
}

fn push_paragraph_child(child: &ParagraphChild, out: &mut String) {
    match child {
        ParagraphChild::Run(run) => push_run(run, out),
        ParagraphChild::Insert(insert) => {
            for child in &insert.children {
                if let InsertChild::Run(run) = child {
                    push_run(run, out);
                }
            }
        }
        ParagraphChild::Hyperlink(link) => {
            for child in &link.children {
                push_paragraph_child(child, out);
            }
        }
        // deletions, comments, bookmarks
        _ => {}
    }
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => out.push_str(&text.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            // field codes, deleted text, drawings
            _ => {}
        }
    }
}
