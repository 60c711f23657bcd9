//! Source document model.
//!
//! A `SourceDocument` is the immutable input to the pipeline: raw bytes plus
//! the metadata the caller declared for them. The pipeline only ever reads it.

use std::path::Path;
use std::sync::Arc;

/// Content type of Office Open XML word-processing documents.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Formats the pipeline knows how to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Raster image; carries the `image/*` subtype (e.g. "png").
    Image(String),
}

impl DocumentFormat {
    /// Resolve a declared media type. Parameters such as `; charset=` are ignored.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let normalized = media_type
            .split(';')
            .next()
            .unwrap_or(media_type)
            .trim()
            .to_lowercase();

        match normalized.as_str() {
            "application/pdf" | "application/x-pdf" => Some(Self::Pdf),
            DOCX_MIME_TYPE | "application/vnd.ms-word.document.macroenabled.12" => {
                Some(Self::Docx)
            }
            m => m
                .strip_prefix("image/")
                .filter(|subtype| !subtype.is_empty())
                .map(|subtype| Self::Image(subtype.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image(_) => "image",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(subtype) => write!(f, "image/{}", subtype),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// An uploaded document awaiting extraction.
///
/// Content is reference counted so a document can be handed to a worker
/// thread without copying the bytes.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    content: Arc<[u8]>,
    media_type: String,
    byte_size: u64,
    name: String,
}

impl SourceDocument {
    /// Create a document from in-memory content.
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        let byte_size = content.len() as u64;
        Self {
            content: content.into(),
            media_type: media_type.into(),
            byte_size,
            name: name.into(),
        }
    }

    /// Create a document read from `path`, named after its file name.
    pub fn from_file(path: &Path, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, media_type, content)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Display name, used for diagnostics only.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_media_type(&self.media_type)
    }
}
