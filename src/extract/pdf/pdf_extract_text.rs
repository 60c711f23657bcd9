//! Whole-document extraction with the pdf-extract crate.
//!
//! pdf-extract handles font encodings (ToUnicode maps, Type3 fonts) that
//! lopdf's simple text layer misses, but it can panic on malformed input and
//! only extracts the document in one pass. Page boundaries come from the
//! form feeds it emits between pages.

use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{classify_parse_error, panic_message, PageSource, PdfStrategy};
use crate::models::{FailureReason, PAGE_BREAK};

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractStrategy;

impl PdfStrategy for PdfExtractStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn open<'a>(&'a self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, FailureReason> {
        let text = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(content)))
            .map_err(|panic| FailureReason::EnginePanic(panic_message(&panic)))?
            .map_err(|e| classify_parse_error(e.to_string()))?;

        let declared = lopdf::Document::load_mem(content)
            .map(|doc| doc.get_pages().len() as u32)
            .ok();

        Ok(Box::new(FormFeedPages::new(&text, declared)))
    }
}

/// One-pass output split into pages.
struct FormFeedPages {
    pages: Vec<String>,
}

impl FormFeedPages {
    /// Split on form feeds, then reconcile with the declared page count.
    ///
    /// Output without page breaks lands on page one; missing trailing pages
    /// are empty.
    fn new(text: &str, declared: Option<u32>) -> Self {
        let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }

        if let Some(declared) = declared.map(|d| d as usize) {
            if pages.len() < declared {
                pages.resize(declared, String::new());
            } else if pages.len() > declared && declared > 0 {
                let overflow = pages.split_off(declared);
                if let Some(last) = pages.last_mut() {
                    for extra in overflow {
                        last.push('\n');
                        last.push_str(&extra);
                    }
                }
            }
        }

        Self { pages }
    }
}

impl PageSource for FormFeedPages {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, String> {
        self.pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .ok_or_else(|| format!("page {} out of range", page))
    }
}
