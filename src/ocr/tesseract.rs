//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract via command-line in TSV mode, so a single invocation yields
//! both the recognized words and their per-word confidences.

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::backend::{OcrBackend, OcrError, OcrResult};
use crate::utils::{check_binary, output_with_timeout, CommandError};

/// Tesseract TSV row level for individual words.
const WORD_LEVEL: &str = "5";

/// Tesseract OCR backend.
pub struct TesseractBackend {
    language: String,
}

impl TesseractBackend {
    /// Create a backend for the given Tesseract language (e.g. "eng", "deu+eng").
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Run Tesseract on an image file and return its raw TSV output.
    fn run_tesseract(&self, image_path: &Path, timeout: Duration) -> Result<String, OcrError> {
        let mut cmd = Command::new("tesseract");
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .arg("tsv");

        match output_with_timeout(&mut cmd, timeout) {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::RecognitionFailed(format!(
                    "tesseract failed: {}",
                    stderr.trim()
                )))
            }
            Err(CommandError::NotFound) => Err(OcrError::BackendNotAvailable(
                "tesseract not found (install tesseract-ocr)".to_string(),
            )),
            Err(CommandError::TimedOut(limit)) => {
                warn!("tesseract exceeded {}s on {}", limit.as_secs(), image_path.display());
                Err(OcrError::Timeout(limit))
            }
            Err(CommandError::Io(e)) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if check_binary("tesseract") {
            "Tesseract is available".to_string()
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }

    fn ocr_image(&self, image_path: &Path, timeout: Duration) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        debug!(progress = 0, "tesseract started on {}", image_path.display());

        let tsv = self.run_tesseract(image_path, timeout)?;
        let (text, confidence) = parse_tsv(&tsv);
        let elapsed = start.elapsed();

        debug!(
            progress = 100,
            "tesseract finished in {}ms ({:.1}% confidence)",
            elapsed.as_millis(),
            confidence
        );

        Ok(OcrResult {
            text,
            confidence,
            backend: "tesseract",
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Reassemble text and mean word confidence from Tesseract TSV output.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Words on the same line are joined with
/// spaces, lines with newlines, and blocks/paragraphs with a blank line.
pub(crate) fn parse_tsv(tsv: &str) -> (String, f32) {
    let mut text = String::new();
    let mut confidence_sum = 0.0f32;
    let mut words = 0usize;
    let mut last_line: Option<(&str, &str, &str, &str)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }

        let word = cols[11].trim();
        let conf: f32 = match cols[10].trim().parse() {
            Ok(c) => c,
            Err(_) => continue,
        };
        if word.is_empty() || conf < 0.0 {
            continue;
        }

        let line_key = (cols[1], cols[2], cols[3], cols[4]);
        match last_line {
            Some(prev) if prev == line_key => text.push(' '),
            Some(prev) if (prev.0, prev.1, prev.2) == (line_key.0, line_key.1, line_key.2) => {
                text.push('\n')
            }
            Some(_) => text.push_str("\n\n"),
            None => {}
        }
        last_line = Some(line_key);

        text.push_str(word);
        confidence_sum += conf;
        words += 1;
    }

    let confidence = if words == 0 {
        0.0
    } else {
        (confidence_sum / words as f32).clamp(0.0, 100.0)
    };

    (text, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, par: u32, line: u32, n: u32, conf: f32, text: &str) -> String {
        format!(
            "5\t1\t{}\t{}\t{}\t{}\t0\t0\t10\t10\t{}\t{}",
            block, par, line, n, conf, text
        )
    }

    #[test]
    fn test_parse_tsv_groups_lines_and_blocks() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t".to_string(),
            word(1, 1, 1, 1, 90.0, "Hello"),
            word(1, 1, 1, 2, 80.0, "world"),
            word(1, 1, 2, 1, 70.0, "again"),
            word(2, 1, 1, 1, 80.0, "Next"),
        ]
        .join("\n");

        let (text, confidence) = parse_tsv(&tsv);
        assert_eq!(text, "Hello world\nagain\n\nNext");
        assert!((confidence - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_tsv_skips_blank_and_unscored_words() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 1, 1, -1.0, "ghost"),
            word(1, 1, 1, 2, 95.0, "   "),
            word(1, 1, 1, 3, 60.0, "real"),
        ]
        .join("\n");

        let (text, confidence) = parse_tsv(&tsv);
        assert_eq!(text, "real");
        assert_eq!(confidence, 60.0);
    }

    #[test]
    fn test_parse_tsv_empty() {
        let (text, confidence) = parse_tsv(HEADER);
        assert!(text.is_empty());
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_backend_name() {
        let backend = TesseractBackend::default();
        assert_eq!(backend.name(), "tesseract");
    }
}
