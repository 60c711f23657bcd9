//! OCR backend abstraction.
//!
//! A backend turns a preprocessed image file into text plus an
//! engine-reported confidence. Backends never retry; retry policy belongs
//! to the orchestrator.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Errors from OCR backends. Every variant surfaces to the caller as a
/// recognition failure.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    RecognitionFailed(String),

    #[error("OCR timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(String),
}

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Recognized text.
    pub text: String,
    /// Engine-reported confidence on a 0-100 scale.
    pub confidence: f32,
    /// Name of the backend that produced this result.
    pub backend: &'static str,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Short identifier used in logs and configuration (e.g. "tesseract").
    fn name(&self) -> &'static str;

    /// Check if this backend can run (binaries installed, models present).
    fn is_available(&self) -> bool;

    /// Describe what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Run OCR on an image file, giving up once `timeout` elapses.
    fn ocr_image(&self, image_path: &Path, timeout: Duration) -> Result<OcrResult, OcrError>;
}

/// Create a backend by configured name.
pub fn create_backend(name: &str, language: &str) -> Option<Box<dyn OcrBackend>> {
    match name.to_lowercase().as_str() {
        "tesseract" => Some(Box::new(super::TesseractBackend::new(language))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_backend() {
        let backend = create_backend("Tesseract", "eng").unwrap();
        assert_eq!(backend.name(), "tesseract");
    }

    #[test]
    fn test_unknown_backend() {
        assert!(create_backend("unknown_backend", "eng").is_none());
    }

    #[test]
    fn test_timeout_display() {
        let err = OcrError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "OCR timed out after 30s");
    }
}
