//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::Context;
use console::style;

use crate::models::{ExtractionResult, ExtractionStatus, SourceDocument};
use crate::utils::resolve_media_type;

/// Read a file into a document, resolving its media type unless one was given.
pub async fn load_document(path: &Path, mime_type: Option<&str>) -> anyhow::Result<SourceDocument> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let media_type = match mime_type {
        Some(mime) => mime.to_string(),
        None => resolve_media_type(path, &content),
    };
    let document = SourceDocument::from_file(path, media_type, content);
    tracing::debug!(
        "{}: {} ({} bytes)",
        document.name(),
        document.media_type(),
        document.byte_size()
    );
    Ok(document)
}

pub fn status_label(status: ExtractionStatus) -> console::StyledObject<&'static str> {
    match status {
        ExtractionStatus::Completed => style("✓ completed").green(),
        ExtractionStatus::LowQuality => style("! low quality").yellow(),
        ExtractionStatus::Failed => style("✗ failed").red(),
    }
}

/// One-line summary of a result.
pub fn summary_line(name: &str, result: &ExtractionResult) -> String {
    let mut line = format!(
        "{:<14} {}  {} chars, {} pages, confidence {:.0}",
        status_label(result.status),
        name,
        result.extracted_chars,
        result.pages,
        result.confidence
    );
    if result.ocr_needed {
        line.push_str(", OCR");
    }
    line
}

/// Human-readable rendering of a single result.
pub fn print_result(name: &str, result: &ExtractionResult) {
    println!("{}", summary_line(name, result));
    if let Some(ref message) = result.message {
        println!("  {}", style(message).dim());
    }
    if result.is_failed() {
        return;
    }
    println!("{}", "-".repeat(50));
    println!("{}", result.text);
}
