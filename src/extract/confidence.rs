//! Extraction confidence for structurally extracted text.
//!
//! OCR engines report their own confidence; PDF and DOCX extraction don't,
//! so the score is derived from how much text came out of how many bytes.

/// Characters per input byte at which confidence saturates.
///
/// Text-heavy PDFs and DOCX files typically yield well above 5%; scanned or
/// image-heavy files yield a small fraction of that.
pub const SATURATION_DENSITY: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    saturation: f64,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self {
            saturation: SATURATION_DENSITY,
        }
    }
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score in `0..=100`, non-decreasing in `extracted_chars` for a fixed size.
    pub fn score(&self, extracted_chars: usize, byte_size: u64) -> f32 {
        if byte_size == 0 {
            return if extracted_chars > 0 { 100.0 } else { 0.0 };
        }
        let density = extracted_chars as f64 / byte_size as f64;
        (100.0 * (density / self.saturation).min(1.0)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let scorer = ConfidenceScorer::new();
        assert_eq!(scorer.score(0, 10_000), 0.0);
        assert_eq!(scorer.score(10_000, 10_000), 100.0);
        assert_eq!(scorer.score(0, 0), 0.0);
        assert_eq!(scorer.score(5, 0), 100.0);
    }

    #[test]
    fn test_half_saturation() {
        let score = ConfidenceScorer::new().score(250, 10_000);
        assert!((score - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_monotonic_in_chars() {
        let scorer = ConfidenceScorer::new();
        let mut previous = 0.0;
        for chars in (0..2_000).step_by(37) {
            let score = scorer.score(chars, 20_000);
            assert!(score >= previous);
            assert!((0.0..=100.0).contains(&score));
            previous = score;
        }
    }
}
