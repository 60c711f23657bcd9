//! Batch extraction events and summary.

use crate::models::{ExtractionResult, ExtractionStatus};

/// Events emitted while a batch is processed.
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    /// Batch started
    BatchStarted { total_documents: usize },
    /// A worker picked up a document
    DocumentStarted { index: usize, name: String },
    /// A document reached its final status
    DocumentFinished {
        index: usize,
        name: String,
        status: ExtractionStatus,
        extracted_chars: usize,
    },
    /// Every document has a result
    BatchComplete {
        completed: usize,
        low_quality: usize,
        failed: usize,
    },
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// One result per input document, in input order.
    pub results: Vec<ExtractionResult>,
    pub completed: usize,
    pub low_quality: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub(super) fn from_results(results: Vec<ExtractionResult>) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            completed: count(ExtractionStatus::Completed),
            low_quality: count(ExtractionStatus::LowQuality),
            failed: count(ExtractionStatus::Failed),
            results,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}
