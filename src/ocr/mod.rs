//! OCR module.
//!
//! Recognizes text in raster images:
//! - `preprocess`: grayscale, histogram normalization and sharpening into a
//!   scoped temporary file
//! - `tesseract`: Tesseract via command line, with engine confidence
//! - `pipeline`: one bounded preprocess-then-recognize job
//!
//! Backends implement [`OcrBackend`]; the orchestrator only sees the trait.

mod backend;
mod pipeline;
mod preprocess;
mod tesseract;

pub use backend::{create_backend, OcrBackend, OcrError, OcrResult};
pub use pipeline::OcrPipeline;
pub use preprocess::{ImagePreprocessor, PreparedImage, PreprocessStep};
pub use tesseract::TesseractBackend;
