//! In-process extraction through lopdf's text layer.

use lopdf::Document;

use super::{classify_parse_error, PageSource, PdfStrategy};
use crate::models::FailureReason;

/// Parses the document with lopdf and extracts text per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfStrategy;

impl PdfStrategy for LopdfStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn open<'a>(&'a self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, FailureReason> {
        let doc = Document::load_mem(content).map_err(|e| classify_parse_error(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(FailureReason::Encrypted);
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(Box::new(LopdfPages { doc, page_numbers }))
    }
}

struct LopdfPages {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> u32 {
        self.page_numbers.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, String> {
        let number = self
            .page_numbers
            .get(page.saturating_sub(1) as usize)
            .ok_or_else(|| format!("page {} out of range", page))?;
        self.doc.extract_text(&[*number]).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::pdf::test_support::build_pdf;
    use crate::models::{SourceDocument, PAGE_BREAK};

    #[test]
    fn test_extracts_pages_in_order() {
        let pdf = build_pdf(&[
            &["First page of the quarterly report with plenty of words"],
            &["Second page continues the discussion of the figures"],
        ]);
        let doc = SourceDocument::new("report.pdf", "application/pdf", pdf);

        let attempt = LopdfStrategy.attempt(&doc, 50);
        let pages = attempt.outcome.unwrap();
        assert_eq!(pages.page_count, 2);

        let parts: Vec<&str> = pages.text.split(PAGE_BREAK).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains("First page"));
        assert!(parts[1].contains("Second page"));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let doc = SourceDocument::new("bad.pdf", "application/pdf", b"%PDF-1.4 nonsense".to_vec());
        let attempt = LopdfStrategy.attempt(&doc, 50);
        assert!(!attempt.succeeded());
    }
}
