//! Detection of scanned PDFs whose text layer is missing or junk.

/// Below this many non-whitespace characters per page a PDF looks scanned.
pub const DEFAULT_MIN_CHARS_PER_PAGE: usize = 100;

/// Below this share of alphanumeric characters the text layer looks like noise.
pub const DEFAULT_MIN_ALNUM_RATIO: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ScanHeuristic {
    min_chars_per_page: usize,
    min_alnum_ratio: f32,
}

impl Default for ScanHeuristic {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS_PER_PAGE, DEFAULT_MIN_ALNUM_RATIO)
    }
}

impl ScanHeuristic {
    pub fn new(min_chars_per_page: usize, min_alnum_ratio: f32) -> Self {
        Self {
            min_chars_per_page,
            min_alnum_ratio,
        }
    }

    /// Whether a PDF's extracted text suggests its pages would need OCR.
    pub fn needs_ocr(&self, text: &str, pages: u32) -> bool {
        let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if visible.is_empty() {
            return true;
        }

        let per_page = visible.len() / pages.max(1) as usize;
        if per_page < self.min_chars_per_page {
            return true;
        }

        let alnum = visible.iter().filter(|c| c.is_alphanumeric()).count();
        (alnum as f32 / visible.len() as f32) < self.min_alnum_ratio
    }
}
