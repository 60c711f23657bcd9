//! docsift - multi-format document text extraction.
//!
//! Turns an uploaded document (PDF, DOCX, or a raster image) into plain
//! text plus quality metadata. PDFs run through a cascade of structural
//! extraction strategies, images go through preprocessing and OCR, and every
//! document ends in exactly one [`ExtractionResult`] whose status is
//! `completed`, `low_quality`, or `failed`.
//!
//! ```no_run
//! use docsift::{Config, Orchestrator, SourceDocument};
//!
//! let orchestrator = Orchestrator::from_config(&Config::default());
//! let document = SourceDocument::new("report.pdf", "application/pdf", std::fs::read("report.pdf")?);
//! let result = orchestrator.extract(&document);
//! println!("{}: {} characters", result.status, result.extracted_chars);
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod services;
pub mod utils;

pub use config::Config;
pub use extract::{CancelToken, ExtractionError, Orchestrator};
pub use models::{DocumentFormat, ExtractionResult, ExtractionStatus, SourceDocument};
pub use services::{BatchExtractor, PageLimitPolicy};
