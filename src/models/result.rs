//! Extraction attempt and result models.

use serde::{Deserialize, Serialize};

/// Page separator used between pages of a multi-page extraction.
///
/// Matches the form feed pdftotext emits, so page boundaries survive until
/// the normalizer has had a chance to look for repeating headers and footers.
pub const PAGE_BREAK: char = '\x0C';

/// Final quality verdict of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Completed,
    LowQuality,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::LowQuality => "low_quality",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline's sole output, one per document.
///
/// Construct through [`ExtractionResult::classify`] or
/// [`ExtractionResult::failed`] so the status invariants always hold:
/// `failed` carries no text and zero confidence, `low_quality` means fewer
/// than the minimum characters, `completed` means at least that many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub text: String,
    pub extracted_chars: usize,
    pub pages: u32,
    pub ocr_needed: bool,
    pub confidence: f32,
    pub status: ExtractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// Build a successful (possibly low-quality) result from normalized text.
    pub fn classify(
        text: String,
        pages: u32,
        ocr_needed: bool,
        confidence: f32,
        min_chars: usize,
    ) -> Self {
        let extracted_chars = text.chars().count();
        let (status, message) = if extracted_chars < min_chars {
            (
                ExtractionStatus::LowQuality,
                Some(format!(
                    "Only {} characters extracted (minimum {}); text may be unreliable",
                    extracted_chars, min_chars
                )),
            )
        } else {
            (ExtractionStatus::Completed, None)
        };

        Self {
            text,
            extracted_chars,
            pages,
            ocr_needed,
            confidence: confidence.clamp(0.0, 100.0),
            status,
            message,
            error: None,
        }
    }

    /// Build a failed result. Text is discarded and confidence is zero.
    pub fn failed(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            text: String::new(),
            extracted_chars: 0,
            pages: 0,
            ocr_needed: false,
            confidence: 0.0,
            status: ExtractionStatus::Failed,
            message,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ExtractionStatus::Failed
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Text gathered by one strategy across a document's pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPages {
    /// Page texts in page order, joined by [`PAGE_BREAK`].
    pub text: String,
    /// Total declared page count of the document, not just pages with text.
    pub page_count: u32,
    /// Pages whose extraction failed and were left out of `text`.
    pub failed_pages: Vec<u32>,
    /// Characters left once `text` is normalized; the measure results are
    /// classified by.
    pub usable_chars: usize,
}

/// Why a single strategy did not produce usable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Parsed, but the aggregate text was below the minimum length.
    InsufficientText { chars: usize, min_chars: usize },
    /// The document is password protected.
    Encrypted,
    /// The document structure could not be parsed.
    Unreadable(String),
    /// An external tool the strategy depends on is not installed.
    ToolMissing(String),
    /// The underlying engine panicked on this input.
    EnginePanic(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientText { chars, min_chars } => write!(
                f,
                "extracted only {} characters (minimum {})",
                chars, min_chars
            ),
            Self::Encrypted => write!(f, "document is password protected"),
            Self::Unreadable(detail) => write!(f, "could not parse document: {}", detail),
            Self::ToolMissing(tool) => write!(f, "{} is not installed", tool),
            Self::EnginePanic(detail) => write!(f, "extraction engine crashed: {}", detail),
        }
    }
}

/// One entry of an aggregated cascade failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: FailureReason,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Outcome of one cascade step. Transient; never outlives the orchestration call.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: String,
    pub outcome: Result<ExtractedPages, FailureReason>,
}

impl ExtractionAttempt {
    pub fn success(strategy: impl Into<String>, pages: ExtractedPages) -> Self {
        Self {
            strategy: strategy.into(),
            outcome: Ok(pages),
        }
    }

    pub fn failure(strategy: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            strategy: strategy.into(),
            outcome: Err(reason),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Human-readable summary for logs.
    pub fn diagnostic(&self) -> String {
        match &self.outcome {
            Ok(pages) if pages.failed_pages.is_empty() => format!(
                "{}: {} characters from {} pages",
                self.strategy,
                pages.usable_chars,
                pages.page_count
            ),
            Ok(pages) => format!(
                "{}: {} characters from {} pages ({} pages skipped)",
                self.strategy,
                pages.usable_chars,
                pages.page_count,
                pages.failed_pages.len()
            ),
            Err(reason) => format!("{}: {}", self.strategy, reason),
        }
    }

    /// Split into the extracted pages or the aggregated-error entry.
    pub fn into_result(self) -> Result<ExtractedPages, StrategyFailure> {
        let strategy = self.strategy;
        self.outcome
            .map_err(|reason| StrategyFailure { strategy, reason })
    }
}
