//! Extraction orchestrator.
//!
//! Drives one document through the pipeline:
//!
//! ```text
//! Dispatched -> Extracting -> (NeedsOcr) -> Normalizing -> Scoring -> Completed | LowQuality | Failed
//! ```
//!
//! Dispatch is by declared media type. PDFs go through the strategy cascade,
//! DOCX through the single DOCX reader, images through preprocessing and
//! OCR. Whatever happens, the caller gets exactly one [`ExtractionResult`];
//! errors are folded into a `failed` result instead of propagating.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::confidence::ConfidenceScorer;
use super::docx::DocxExtractor;
use super::error::{CascadeFailure, ExtractionError};
use super::normalize::TextNormalizer;
use super::pdf::{create_strategy, ContentStreamStrategy, PdfStrategy};
use super::scan::ScanHeuristic;
use crate::config::Config;
use crate::models::{DocumentFormat, ExtractionResult, SourceDocument};
use crate::ocr::{create_backend, ImagePreprocessor, OcrBackend, OcrPipeline, TesseractBackend};

/// Pipeline stage, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dispatched,
    Extracting,
    NeedsOcr,
    Normalizing,
    Scoring,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Extracting => "extracting",
            Self::NeedsOcr => "needs_ocr",
            Self::Normalizing => "normalizing",
            Self::Scoring => "scoring",
        }
    }
}

/// Text from the format-specific stage, before normalization.
#[derive(Debug)]
struct RawExtraction {
    text: String,
    pages: u32,
    ocr_needed: bool,
    /// Engine-reported confidence, when the text came from OCR.
    engine_confidence: Option<f32>,
    note: Option<String>,
}

/// Runs documents through the extraction pipeline.
///
/// Holds only immutable settings and stateless components, so one instance
/// can be shared across worker threads behind an `Arc`.
pub struct Orchestrator {
    min_chars: usize,
    strategies: Vec<Box<dyn PdfStrategy>>,
    lenient: Option<Box<dyn PdfStrategy>>,
    docx: DocxExtractor,
    ocr: OcrPipeline,
    scan: ScanHeuristic,
    scorer: ConfidenceScorer,
    normalizer: TextNormalizer,
}

impl Orchestrator {
    pub fn from_config(config: &Config) -> Self {
        let tool_timeout = config.extraction.tool_timeout();
        let strategies = config
            .extraction
            .pdf_strategies
            .iter()
            .filter_map(|name| {
                let strategy = create_strategy(name, tool_timeout);
                if strategy.is_none() {
                    warn!("Unknown PDF strategy '{}', skipping", name);
                }
                strategy
            })
            .collect();

        let lenient: Option<Box<dyn PdfStrategy>> = config
            .extraction
            .lenient_fallback
            .then(|| Box::new(ContentStreamStrategy) as Box<dyn PdfStrategy>);

        let backend: Arc<dyn OcrBackend> =
            match create_backend(&config.ocr.backend, &config.ocr.language) {
                Some(backend) => Arc::from(backend),
                None => {
                    warn!(
                        "Unknown OCR backend '{}', using tesseract",
                        config.ocr.backend
                    );
                    Arc::new(TesseractBackend::new(&config.ocr.language))
                }
            };

        Self {
            min_chars: config.extraction.min_chars,
            strategies,
            lenient,
            docx: DocxExtractor::new(config.extraction.words_per_page),
            ocr: OcrPipeline::new(
                ImagePreprocessor::new(config.ocr.preprocess),
                backend,
                config.ocr.timeout(),
            ),
            scan: ScanHeuristic::new(config.scan.min_chars_per_page, config.scan.min_alnum_ratio),
            scorer: ConfidenceScorer::new(),
            normalizer: TextNormalizer::new(),
        }
    }

    /// Replace the PDF cascade, keeping priority order as given.
    pub fn with_pdf_strategies(mut self, strategies: Vec<Box<dyn PdfStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Replace (or remove) the final lenient PDF attempt.
    pub fn with_lenient(mut self, lenient: Option<Box<dyn PdfStrategy>>) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_ocr_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.ocr = self.ocr.with_backend(backend);
        self
    }

    /// Names of the configured PDF strategies, in priority order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract a document.
    pub fn extract(&self, document: &SourceDocument) -> ExtractionResult {
        self.extract_with_cancel(document, &CancelToken::new())
    }

    /// Extract a document, stopping at the next checkpoint once `cancel` fires.
    pub fn extract_with_cancel(
        &self,
        document: &SourceDocument,
        cancel: &CancelToken,
    ) -> ExtractionResult {
        let start = Instant::now();

        let result = match self.run(document, cancel) {
            Ok(result) => result,
            Err(e) => {
                warn!("{}: {}", document.name(), e);
                ExtractionResult::failed(e.to_string(), Some(e.user_message()))
            }
        };

        info!(
            document = document.name(),
            status = %result.status,
            chars = result.extracted_chars,
            pages = result.pages,
            confidence = result.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extraction finished"
        );
        result
    }

    fn run(
        &self,
        document: &SourceDocument,
        cancel: &CancelToken,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.enter(Stage::Dispatched, document);
        let format = document
            .format()
            .ok_or_else(|| ExtractionError::UnsupportedFormat(document.media_type().to_string()))?;
        checkpoint(cancel)?;

        self.enter(Stage::Extracting, document);
        let raw = match &format {
            DocumentFormat::Pdf => self.extract_pdf(document, cancel)?,
            DocumentFormat::Docx => self.extract_docx(document)?,
            DocumentFormat::Image(subtype) => self.recognize_image(document, subtype)?,
        };
        checkpoint(cancel)?;

        if raw.ocr_needed {
            self.enter(Stage::NeedsOcr, document);
        }

        self.enter(Stage::Normalizing, document);
        let text = self.normalizer.normalize(&raw.text, raw.pages);

        self.enter(Stage::Scoring, document);
        let confidence = match raw.engine_confidence {
            Some(confidence) => confidence,
            None => self
                .scorer
                .score(text.chars().count(), document.byte_size()),
        };

        let result =
            ExtractionResult::classify(text, raw.pages, raw.ocr_needed, confidence, self.min_chars);
        Ok(match (raw.note, result.message.clone()) {
            (Some(note), Some(existing)) => result.with_message(format!("{}. {}", existing, note)),
            (Some(note), None) => result.with_message(note),
            (None, _) => result,
        })
    }

    /// Run the PDF cascade: each strategy in order until one yields enough
    /// text, then the lenient attempt, then give up with every reason.
    fn extract_pdf(
        &self,
        document: &SourceDocument,
        cancel: &CancelToken,
    ) -> Result<RawExtraction, ExtractionError> {
        let mut failures = Vec::new();
        let cascade = self.strategies.iter().chain(self.lenient.iter());

        for strategy in cascade {
            checkpoint(cancel)?;
            debug!("{}: trying {}", document.name(), strategy.name());

            let attempt = strategy.attempt(document, self.min_chars);
            let diagnostic = attempt.diagnostic();
            match attempt.into_result() {
                Ok(pages) => {
                    debug!("{}: {}", document.name(), diagnostic);
                    let ocr_needed = self.scan.needs_ocr(&pages.text, pages.page_count);
                    let note = ocr_needed.then(|| {
                        "Document appears to be scanned; page OCR was not performed".to_string()
                    });
                    return Ok(RawExtraction {
                        text: pages.text,
                        pages: pages.page_count,
                        ocr_needed,
                        engine_confidence: None,
                        note,
                    });
                }
                Err(failure) => {
                    warn!("{}: {}", document.name(), diagnostic);
                    failures.push(failure);
                }
            }
        }

        Err(ExtractionError::Exhausted(CascadeFailure::new(failures)))
    }

    fn extract_docx(&self, document: &SourceDocument) -> Result<RawExtraction, ExtractionError> {
        let docx = self.docx.extract(document.content())?;
        debug!(
            "{}: {} words, ~{} pages",
            document.name(),
            docx.words,
            docx.estimated_pages
        );
        Ok(RawExtraction {
            text: docx.text,
            pages: docx.estimated_pages,
            ocr_needed: false,
            engine_confidence: None,
            note: None,
        })
    }

    fn recognize_image(
        &self,
        document: &SourceDocument,
        subtype: &str,
    ) -> Result<RawExtraction, ExtractionError> {
        let extension = image_extension(subtype);
        let ocr = self.ocr.recognize(document.content(), extension)?;
        debug!(
            "{}: {} recognized {} characters in {}ms (confidence {:.1})",
            document.name(),
            ocr.backend,
            ocr.text.chars().count(),
            ocr.processing_time_ms,
            ocr.confidence
        );
        Ok(RawExtraction {
            text: ocr.text,
            pages: 1,
            ocr_needed: true,
            engine_confidence: Some(ocr.confidence),
            note: None,
        })
    }

    fn enter(&self, stage: Stage, document: &SourceDocument) {
        debug!("{}: -> {}", document.name(), stage.as_str());
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("min_chars", &self.min_chars)
            .field("strategies", &self.strategy_names())
            .field("lenient", &self.lenient.as_ref().map(|s| s.name()))
            .field("ocr", &self.ocr)
            .finish()
    }
}

fn checkpoint(cancel: &CancelToken) -> Result<(), ExtractionError> {
    if cancel.is_cancelled() {
        Err(ExtractionError::Cancelled)
    } else {
        Ok(())
    }
}

/// File extension for an image subtype, used to name the temp file the
/// OCR engine reads.
fn image_extension(subtype: &str) -> &str {
    match subtype {
        "jpeg" | "pjpeg" => "jpg",
        "svg+xml" => "svg",
        "x-ms-bmp" => "bmp",
        other => other,
    }
}
