//! Batch extraction service.
//!
//! Runs many documents through one shared [`Orchestrator`] on a bounded
//! pool of blocking workers: a semaphore caps the documents in flight, and
//! the next document starts as soon as any worker frees up. Separated from
//! UI concerns: progress goes out as [`ExtractionEvent`]s and the caller
//! decides how to render them.

mod types;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::warn;

use crate::extract::{CancelToken, Orchestrator};
use crate::models::{ExtractionResult, SourceDocument};

pub use types::{BatchSummary, ExtractionEvent};

/// Service for extracting text from many documents at once.
pub struct BatchExtractor {
    orchestrator: Arc<Orchestrator>,
    workers: usize,
}

impl BatchExtractor {
    pub fn new(orchestrator: Arc<Orchestrator>, workers: usize) -> Self {
        Self {
            orchestrator,
            workers: workers.max(1),
        }
    }

    /// Extract every document.
    ///
    /// Documents are independent: each gets its own pipeline run and a
    /// failure in one never affects another. Results come back in input
    /// order even though workers finish in any order. Once `cancel` fires,
    /// documents not yet finished come back as cancelled failures.
    pub async fn process(
        &self,
        documents: Vec<SourceDocument>,
        event_tx: mpsc::Sender<ExtractionEvent>,
        cancel: CancelToken,
    ) -> BatchSummary {
        let total = documents.len();
        let _ = event_tx
            .send(ExtractionEvent::BatchStarted {
                total_documents: total,
            })
            .await;

        let processed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut results: Vec<Option<ExtractionResult>> = vec![None; total];
        let mut handles = Vec::with_capacity(total);

        for (index, document) in documents.into_iter().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Worker pool closed before document {}: {}", index, e);
                    results[index] = Some(ExtractionResult::failed(
                        format!("worker pool closed: {}", e),
                        None,
                    ));
                    continue;
                }
            };

            let orchestrator = self.orchestrator.clone();
            let event_tx = event_tx.clone();
            let cancel = cancel.clone();
            let processed = processed.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let name = document.name().to_string();

                // Blocking send since we're in spawn_blocking
                let _ = event_tx.blocking_send(ExtractionEvent::DocumentStarted {
                    index,
                    name: name.clone(),
                });

                let result = orchestrator.extract_with_cancel(&document, &cancel);

                let _ = event_tx.blocking_send(ExtractionEvent::DocumentFinished {
                    index,
                    name,
                    status: result.status,
                    extracted_chars: result.extracted_chars,
                });
                processed.fetch_add(1, Ordering::Relaxed);
                result
            });
            handles.push((index, handle));
        }

        for (index, handle) in handles {
            results[index] = Some(join_result(index, handle.await));
        }

        let results = results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| ExtractionResult::failed("worker produced no result", None)))
            .collect();
        let summary = BatchSummary::from_results(results);

        tracing::debug!(
            "Batch finished: {}/{} documents processed",
            processed.load(Ordering::Relaxed),
            total
        );
        let _ = event_tx
            .send(ExtractionEvent::BatchComplete {
                completed: summary.completed,
                low_quality: summary.low_quality,
                failed: summary.failed,
            })
            .await;

        summary
    }
}

/// A panicking worker becomes a failed result for its document only.
fn join_result(
    index: usize,
    joined: Result<ExtractionResult, tokio::task::JoinError>,
) -> ExtractionResult {
    joined.unwrap_or_else(|e| {
        warn!("Extraction worker for document {} failed: {}", index, e);
        ExtractionResult::failed(
            format!("extraction worker failed: {}", e),
            Some("An internal error interrupted extraction of this document.".to_string()),
        )
    })
}
