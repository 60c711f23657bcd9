//! Extraction error taxonomy.
//!
//! Per-page and per-strategy problems are absorbed inside the cascade; only
//! the variants here reach the orchestrator boundary, where they become a
//! `failed` result rather than a propagated error.

use thiserror::Error;

use crate::models::{FailureReason, StrategyFailure};
use crate::ocr::OcrError;

const PDF_REMEDIATION: &str = "Try re-exporting the PDF from the application that created it, \
     re-saving or printing it to a new PDF, or converting it to DOCX or an image";

/// Errors that end extraction of a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Page {page} extraction failed: {reason}")]
    PageExtraction { page: u32, reason: String },

    #[error("Recognition failed: {0}")]
    Recognition(#[from] OcrError),

    #[error("DOCX parse failed: {0}")]
    DocxParse(String),

    #[error("{0}")]
    Exhausted(CascadeFailure),

    #[error("Extraction cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Message safe to show to the person who uploaded the document.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat(media_type) => format!(
                "Files of type '{}' are not supported. Upload a PDF, a Word document (.docx), \
                 or an image (PNG, JPEG, TIFF).",
                media_type
            ),
            Self::PageExtraction { page, .. } => {
                format!("Page {} of the document could not be read.", page)
            }
            Self::Recognition(OcrError::Timeout(_)) => {
                "Reading text from the image took too long. Try a smaller or \
                 lower-resolution image, or upload a PDF with selectable text."
                    .to_string()
            }
            Self::Recognition(_) => "Could not read text from the image. Try a clearer, \
                 higher-resolution scan, or convert it to PNG or a PDF with selectable text."
                .to_string(),
            Self::DocxParse(_) => "The Word document could not be opened. Re-save it from \
                 Word as .docx, or export it to PDF and upload that instead."
                .to_string(),
            Self::Exhausted(failure) => failure.user_message(),
            Self::Cancelled => "Extraction was cancelled.".to_string(),
        }
    }
}

/// Aggregated failure of the PDF cascade: one entry per strategy attempted,
/// in the order they were tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeFailure {
    pub failures: Vec<StrategyFailure>,
}

impl CascadeFailure {
    pub fn new(failures: Vec<StrategyFailure>) -> Self {
        Self { failures }
    }

    /// Names of the strategies that were attempted.
    pub fn strategies(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.strategy.as_str()).collect()
    }

    fn is_encrypted(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.reason == FailureReason::Encrypted)
    }

    pub fn user_message(&self) -> String {
        if self.is_encrypted() {
            return "This PDF is password protected. Remove the password (for example by \
                    printing it to a new PDF) and upload it again."
                .to_string();
        }
        format!(
            "No readable text could be extracted from this PDF (tried: {}). {}.",
            self.strategies().join(", "),
            PDF_REMEDIATION
        )
    }
}

impl std::fmt::Display for CascadeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "All PDF extraction strategies failed")?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        write!(f, ". {}", PDF_REMEDIATION)
    }
}
