//! Poppler's pdftotext, page by page.

use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{PageSource, PdfStrategy};
use crate::models::{FailureReason, PAGE_BREAK};
use crate::utils::{check_binary, output_with_timeout, CommandError};

/// Runs `pdftotext -layout` once per page.
///
/// The most tolerant of the structural strategies; it copes with broken
/// xref tables that trip up in-process parsers.
#[derive(Debug, Clone)]
pub struct PdfToTextStrategy {
    timeout: Duration,
}

impl PdfToTextStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PdfStrategy for PdfToTextStrategy {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn open<'a>(&'a self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, FailureReason> {
        if !check_binary("pdftotext") {
            return Err(FailureReason::ToolMissing(
                "pdftotext (install poppler-utils)".to_string(),
            ));
        }

        let mut file = tempfile::Builder::new()
            .prefix("docsift-pdf-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| FailureReason::Unreadable(e.to_string()))?;
        file.write_all(content)
            .and_then(|_| file.flush())
            .map_err(|e| FailureReason::Unreadable(e.to_string()))?;

        match pdf_page_count(file.path(), self.timeout)? {
            Some(pages) => Ok(Box::new(PopplerPages {
                file,
                timeout: self.timeout,
                pages,
            })),
            None => {
                // No pdfinfo; one whole-document run split on form feeds instead.
                debug!("pdfinfo unavailable, extracting whole document in one pass");
                let text = run_pdftotext(file.path(), None, self.timeout)?;
                Ok(Box::new(SplitPages::from_text(&text)))
            }
        }
    }
}

/// Document on disk, read one page per pdftotext invocation.
struct PopplerPages {
    file: NamedTempFile,
    timeout: Duration,
    pages: u32,
}

impl PageSource for PopplerPages {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn page_text(&self, page: u32) -> Result<String, String> {
        run_pdftotext(self.file.path(), Some(page), self.timeout).map_err(|e| e.to_string())
    }
}

/// Pages already extracted in one pass.
pub(super) struct SplitPages(Vec<String>);

impl SplitPages {
    /// Split whole-document output on form feeds, dropping the empty tail
    /// after the final page break.
    pub(super) fn from_text(text: &str) -> Self {
        let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self(pages)
    }
}

impl PageSource for SplitPages {
    fn page_count(&self) -> u32 {
        self.0.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, String> {
        self.0
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .ok_or_else(|| format!("page {} out of range", page))
    }
}

/// Page count from pdfinfo, or `None` if pdfinfo can't be used.
fn pdf_page_count(path: &Path, timeout: Duration) -> Result<Option<u32>, FailureReason> {
    if !check_binary("pdfinfo") {
        return Ok(None);
    }

    let output = match output_with_timeout(Command::new("pdfinfo").arg(path), timeout) {
        Ok(output) => output,
        Err(e) => {
            debug!("pdfinfo failed: {}", e);
            return Ok(None);
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_stderr(&stderr));
    }

    Ok(parse_page_count(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_page_count(pdfinfo: &str) -> Option<u32> {
    pdfinfo
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

fn run_pdftotext(path: &Path, page: Option<u32>, timeout: Duration) -> Result<String, FailureReason> {
    let mut cmd = Command::new("pdftotext");
    cmd.args(["-layout", "-enc", "UTF-8"]);
    if let Some(page) = page {
        let page = page.to_string();
        cmd.args(["-f", &page, "-l", &page]);
    }
    cmd.arg(path).arg("-");

    let output = output_with_timeout(&mut cmd, timeout).map_err(|e| match e {
        CommandError::NotFound => FailureReason::ToolMissing("pdftotext".to_string()),
        other => FailureReason::Unreadable(format!("pdftotext: {}", other)),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_stderr(&stderr));
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    // Single-page runs end with their own form feed.
    if page.is_some() && text.ends_with(PAGE_BREAK) {
        text.pop();
    }
    Ok(text)
}

fn classify_stderr(stderr: &str) -> FailureReason {
    if stderr.to_lowercase().contains("password") {
        FailureReason::Encrypted
    } else {
        FailureReason::Unreadable(stderr.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let info = "Producer:       LibreOffice\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_split_pages_drops_trailing_break() {
        let pages = SplitPages::from_text("one\x0Ctwo\x0C");
        assert_eq!(pages.page_count(), 2);
        assert_eq!(pages.page_text(2).unwrap(), "two");
        assert!(pages.page_text(3).is_err());
    }

    #[test]
    fn test_classify_stderr() {
        assert_eq!(
            classify_stderr("Command Line Error: Incorrect password"),
            FailureReason::Encrypted
        );
        assert!(matches!(
            classify_stderr("Syntax Error: Couldn't find trailer dictionary"),
            FailureReason::Unreadable(_)
        ));
    }
}
