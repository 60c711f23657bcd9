//! PDF structural text extraction.
//!
//! Each strategy reads embedded text directly (no OCR) with its own
//! tolerance for malformed structure. Strategies share one capability,
//! [`PdfStrategy::attempt`]: open the document, pull text page by page, and
//! reject the result if it is too thin to be useful.
//!
//! Page failures are isolated: a page that errors (or panics inside the
//! engine) is logged and left out, and the remaining pages still count.

mod content_stream;
mod lopdf_text;
mod pdf_extract_text;
mod pdftotext;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tracing::warn;

use super::error::ExtractionError;
use super::normalize::TextNormalizer;
use crate::models::{
    ExtractedPages, ExtractionAttempt, FailureReason, SourceDocument, PAGE_BREAK,
};

pub use content_stream::ContentStreamStrategy;
pub use lopdf_text::LopdfStrategy;
pub use pdf_extract_text::PdfExtractStrategy;
pub use pdftotext::PdfToTextStrategy;

/// Default strategy priority, most tolerant of malformed structure first.
pub const DEFAULT_STRATEGIES: &[&str] = &["pdftotext", "lopdf", "pdf-extract"];

/// An opened document that can hand out text one page at a time.
pub trait PageSource {
    /// Total declared page count.
    fn page_count(&self) -> u32;

    /// Text of a single 1-based page.
    fn page_text(&self, page: u32) -> Result<String, String>;
}

/// One PDF text extraction strategy in the cascade.
pub trait PdfStrategy: Send + Sync {
    /// Short identifier used in configuration and diagnostics.
    fn name(&self) -> &'static str;

    /// Open the document for page-level extraction.
    fn open<'a>(&'a self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, FailureReason>;

    /// Run this strategy against a document.
    ///
    /// Succeeds only when the aggregate text reaches `min_chars`; anything
    /// thinner is reported as [`FailureReason::InsufficientText`].
    fn attempt(&self, document: &SourceDocument, min_chars: usize) -> ExtractionAttempt {
        let opened = catch_unwind(AssertUnwindSafe(|| self.open(document.content())));
        match opened {
            Ok(Ok(source)) => collect_pages(self.name(), source.as_ref(), min_chars),
            Ok(Err(reason)) => ExtractionAttempt::failure(self.name(), reason),
            Err(panic) => {
                ExtractionAttempt::failure(self.name(), FailureReason::EnginePanic(panic_message(&panic)))
            }
        }
    }
}

/// Build a strategy by configured name.
pub fn create_strategy(name: &str, tool_timeout: Duration) -> Option<Box<dyn PdfStrategy>> {
    match name.to_lowercase().as_str() {
        "pdftotext" | "poppler" => Some(Box::new(PdfToTextStrategy::new(tool_timeout))),
        "lopdf" => Some(Box::new(LopdfStrategy)),
        "pdf-extract" | "pdf_extract" => Some(Box::new(PdfExtractStrategy)),
        "content-stream" | "lenient" => Some(Box::new(ContentStreamStrategy)),
        _ => None,
    }
}

/// Extract every page of an opened document, isolating page failures.
///
/// Page texts are concatenated in page-number order, separated by
/// [`PAGE_BREAK`]. The reported page count is the document's declared
/// count, including pages that failed or held no text.
///
/// The length gate counts characters of the normalized text, so layout
/// padding and undecodable glyphs can't carry a strategy past it.
pub fn collect_pages(strategy: &str, source: &dyn PageSource, min_chars: usize) -> ExtractionAttempt {
    let page_count = source.page_count();
    let mut texts = Vec::with_capacity(page_count as usize);
    let mut failed_pages = Vec::new();

    for page in 1..=page_count {
        let result = catch_unwind(AssertUnwindSafe(|| source.page_text(page)))
            .unwrap_or_else(|panic| Err(format!("engine panicked: {}", panic_message(&panic))));

        match result {
            Ok(text) => texts.push(text),
            Err(reason) => {
                let err = ExtractionError::PageExtraction { page, reason };
                warn!("{}: {}", strategy, err);
                failed_pages.push(page);
            }
        }
    }

    let text = texts.join(&PAGE_BREAK.to_string());
    let chars = TextNormalizer::new()
        .normalize(&text, page_count)
        .chars()
        .count();
    if chars < min_chars {
        return ExtractionAttempt::failure(
            strategy,
            FailureReason::InsufficientText { chars, min_chars },
        );
    }

    ExtractionAttempt::success(
        strategy,
        ExtractedPages {
            text,
            page_count,
            failed_pages,
            usable_chars: chars,
        },
    )
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Map a parser error to a failure reason, recognising password protection.
pub(crate) fn classify_parse_error(detail: String) -> FailureReason {
    let lower = detail.to_lowercase();
    if lower.contains("encrypt") || lower.contains("password") || lower.contains("decrypt") {
        FailureReason::Encrypted
    } else {
        FailureReason::Unreadable(detail)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory PDF fixtures built with lopdf.

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry, each page showing its lines with Tj.
    pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for lines in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![14.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            for line in lines.iter() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
