//! Preprocess-then-recognize OCR pipeline for raster images.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::backend::{OcrBackend, OcrError, OcrResult};
use super::preprocess::ImagePreprocessor;

/// Runs one OCR job: preprocessing into a scoped temporary image, then a
/// single bounded recognition call.
#[derive(Clone)]
pub struct OcrPipeline {
    preprocessor: ImagePreprocessor,
    backend: Arc<dyn OcrBackend>,
    timeout: Duration,
}

impl OcrPipeline {
    pub fn new(
        preprocessor: ImagePreprocessor,
        backend: Arc<dyn OcrBackend>,
        timeout: Duration,
    ) -> Self {
        Self {
            preprocessor,
            backend,
            timeout,
        }
    }

    /// Same preprocessing and timeout, different engine.
    pub fn with_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Recognize text in an image.
    ///
    /// The preprocessed temp file is released when this returns, whether
    /// recognition succeeded, failed, or timed out.
    pub fn recognize(&self, content: &[u8], extension: &str) -> Result<OcrResult, OcrError> {
        if !self.backend.is_available() {
            return Err(OcrError::BackendNotAvailable(
                self.backend.availability_hint(),
            ));
        }

        let prepared = self.preprocessor.prepare(content, extension)?;
        debug!(
            "Preprocessed image ({} applied, {} skipped) -> {}",
            prepared.applied.len(),
            prepared.skipped.len(),
            prepared.path().display()
        );

        self.backend.ocr_image(prepared.path(), self.timeout)
    }
}

impl std::fmt::Debug for OcrPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrPipeline")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
