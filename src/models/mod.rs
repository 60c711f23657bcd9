//! Data models for the extraction pipeline.

mod document;
mod result;

pub use document::{DocumentFormat, SourceDocument, DOCX_MIME_TYPE};
pub use result::{
    ExtractedPages, ExtractionAttempt, ExtractionResult, ExtractionStatus, FailureReason,
    StrategyFailure, PAGE_BREAK,
};
