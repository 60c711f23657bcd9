//! Document text extraction.
//!
//! - `pdf`: the PDF strategy cascade (pdftotext, lopdf, pdf-extract, and a
//!   lenient content-stream pass)
//! - `docx`: DOCX body text with an estimated page count
//! - `normalize`: whitespace, encoding and header/footer cleanup
//! - `confidence`: density-based confidence for structural extraction
//! - `scan`: "looks like a scan" check for PDF text
//! - `orchestrator`: the per-document state machine tying it together

mod cancel;
mod confidence;
mod docx;
mod error;
mod normalize;
mod orchestrator;
pub mod pdf;
mod scan;

pub use cancel::CancelToken;
pub use confidence::{ConfidenceScorer, SATURATION_DENSITY};
pub use docx::{DocxExtractor, DocxText, DEFAULT_WORDS_PER_PAGE};
pub use error::{CascadeFailure, ExtractionError};
pub use normalize::TextNormalizer;
pub use orchestrator::{Orchestrator, Stage};
pub use pdf::{PageSource, PdfStrategy};
pub use scan::{ScanHeuristic, DEFAULT_MIN_ALNUM_RATIO, DEFAULT_MIN_CHARS_PER_PAGE};

