//! End-to-end behaviour of the extraction pipeline through the public API.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use docsift::config::Config;
use docsift::extract::{ConfidenceScorer, Orchestrator, PageSource, PdfStrategy, TextNormalizer};
use docsift::models::{ExtractionStatus, FailureReason, SourceDocument, PAGE_BREAK};
use docsift::ocr::{OcrBackend, OcrError, OcrResult};

/// Strategy serving fixed per-page outcomes.
struct ScriptedStrategy {
    name: &'static str,
    pages: Vec<Result<String, String>>,
}

struct ScriptedPages<'a>(&'a [Result<String, String>]);

impl PageSource for ScriptedPages<'_> {
    fn page_count(&self) -> u32 {
        self.0.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, String> {
        self.0[(page - 1) as usize].clone()
    }
}

impl PdfStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn open<'a>(&'a self, _content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, FailureReason> {
        Ok(Box::new(ScriptedPages(&self.pages)))
    }
}

fn scripted(name: &'static str, pages: &[&str]) -> Box<dyn PdfStrategy> {
    Box::new(ScriptedStrategy {
        name,
        pages: pages.iter().map(|p| Ok(p.to_string())).collect(),
    })
}

struct FixedOcr {
    text: &'static str,
    confidence: f32,
}

impl OcrBackend for FixedOcr {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    fn ocr_image(&self, image_path: &Path, _timeout: Duration) -> Result<OcrResult, OcrError> {
        assert!(image_path.exists());
        Ok(OcrResult {
            text: self.text.to_string(),
            confidence: self.confidence,
            backend: "fixed",
            processing_time_ms: 1,
        })
    }
}

struct TimingOutOcr;

impl OcrBackend for TimingOutOcr {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    fn ocr_image(&self, _image_path: &Path, timeout: Duration) -> Result<OcrResult, OcrError> {
        Err(OcrError::Timeout(timeout))
    }
}

fn orchestrator() -> Orchestrator {
    Orchestrator::from_config(&Config::default()).with_lenient(None)
}

fn pdf_document() -> SourceDocument {
    SourceDocument::new("upload.pdf", "application/pdf", vec![b'x'; 8192])
}

fn build_docx(body: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
        body
    );
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

#[test]
fn docx_page_count_is_estimated_from_words() {
    let words: Vec<String> = (0..520).map(|i| format!("word{}", i)).collect();
    let doc = SourceDocument::new(
        "memo.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        build_docx(&words.join(" ")),
    );

    let result = orchestrator().extract(&doc);
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.pages, 2);
    assert!(!result.ocr_needed);
}

#[test]
fn corrupt_docx_fails_without_fallback() {
    let doc = SourceDocument::new(
        "broken.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        b"PK\x03\x04 truncated".to_vec(),
    );
    let result = orchestrator().extract(&doc);
    assert_eq!(result.status, ExtractionStatus::Failed);
    assert!(result.text.is_empty());
    assert!(result.message.unwrap().contains("Word document"));
}

#[test]
fn cascade_moves_past_thin_first_strategy() {
    let good = "lorem ipsum dolor ".repeat(17);
    let good = good.trim();
    let orchestrator = orchestrator().with_pdf_strategies(vec![
        scripted("thin", &["ten chars!"]),
        scripted("full", &[good]),
    ]);

    let result = orchestrator.extract(&pdf_document());
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.text, good);
    assert!(result.extracted_chars >= 300);
}

#[test]
fn cascade_moves_past_layout_padding() {
    let padded = format!(
        "Name:{}Date:\n{}",
        " ".repeat(80),
        "\u{FFFD}".repeat(45)
    );
    let good = "Invoice number 4471 covers consulting work for March. ".repeat(6);
    let good = good.trim();
    let orchestrator = orchestrator().with_pdf_strategies(vec![
        scripted("padded", &[&padded]),
        scripted("full", &[good]),
    ]);

    let result = orchestrator.extract(&pdf_document());
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.text, good);
    assert!(result.extracted_chars >= 300);
}

#[test]
fn image_confidence_comes_from_the_engine() {
    let orchestrator = orchestrator().with_ocr_backend(Arc::new(FixedOcr {
        text: "INVOICE 2024-118   Total due: 1,250.00 EUR   Payable within 30 days.",
        confidence: 82.0,
    }));
    let doc = SourceDocument::new("scan.jpg", "image/jpeg", b"\xFF\xD8\xFF not really".to_vec());

    let result = orchestrator.extract(&doc);
    assert_eq!(result.confidence, 82.0);
    assert!(result.ocr_needed);
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(
        result.text,
        "INVOICE 2024-118 Total due: 1,250.00 EUR Payable within 30 days."
    );
}

#[test]
fn image_timeout_is_a_failed_result() {
    let orchestrator = orchestrator().with_ocr_backend(Arc::new(TimingOutOcr));
    let doc = SourceDocument::new("scan.png", "image/png", b"\x89PNG".to_vec());

    let result = orchestrator.extract(&doc);
    assert_eq!(result.status, ExtractionStatus::Failed);
    assert!(result.error.unwrap().contains("timed out"));
}

#[test]
fn short_ocr_text_is_low_quality() {
    let orchestrator = orchestrator().with_ocr_backend(Arc::new(FixedOcr {
        text: "STOP",
        confidence: 91.0,
    }));
    let doc = SourceDocument::new("sign.png", "image/png", b"\x89PNG".to_vec());

    let result = orchestrator.extract(&doc);
    assert_eq!(result.status, ExtractionStatus::LowQuality);
    assert_eq!(result.text, "STOP");
    assert_eq!(result.confidence, 91.0);
}

#[test]
fn exhausted_cascade_lists_every_strategy() {
    let orchestrator = orchestrator()
        .with_pdf_strategies(vec![
            scripted("alpha", &["short"]),
            scripted("beta", &["", "tiny"]),
        ])
        .with_lenient(Some(scripted("lenient", &["still short"])));

    let result = orchestrator.extract(&pdf_document());
    assert_eq!(result.status, ExtractionStatus::Failed);
    assert_eq!(result.text, "");
    assert_eq!(result.confidence, 0.0);

    let error = result.error.unwrap();
    for name in ["alpha", "beta", "lenient"] {
        assert!(error.contains(name), "{} missing from {}", name, error);
    }
    assert!(result.message.unwrap().contains("re-exporting"));
}

#[test]
fn failed_page_is_omitted_and_order_kept() {
    let page1 = "Page one opens the contract and names both parties.";
    let page3 = "Page three closes with signatures and the effective date.";
    let orchestrator = orchestrator().with_pdf_strategies(vec![Box::new(ScriptedStrategy {
        name: "partial",
        pages: vec![
            Ok(page1.to_string()),
            Err("invalid content stream".to_string()),
            Ok(page3.to_string()),
        ],
    })]);

    let result = orchestrator.extract(&pdf_document());
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.pages, 3);
    assert_eq!(result.text, format!("{}\n\n{}", page1, page3));
}

#[test]
fn unsupported_media_types_always_fail_empty() {
    let inputs: [(&str, &[u8]); 4] = [
        ("text/plain", b"plain text that is long enough to be worth extracting, surely"),
        ("application/zip", b"PK\x03\x04"),
        ("application/octet-stream", b"%PDF-1.7"),
        ("", b""),
    ];
    for (media_type, content) in inputs {
        let doc = SourceDocument::new("file", media_type, content.to_vec());
        let result = orchestrator().extract(&doc);
        assert_eq!(result.status, ExtractionStatus::Failed, "{}", media_type);
        assert_eq!(result.extracted_chars, 0);
        assert!(result.text.is_empty());
    }
}

#[test]
fn repeated_runs_are_identical() {
    let build = || {
        orchestrator().with_pdf_strategies(vec![scripted(
            "fixed",
            &[
                "Annual Report\nRevenue increased across all regions this year.\n1",
                "Annual Report\nOperating costs were held flat against the prior year.\n2",
            ],
        )])
    };
    let doc = pdf_document();

    let first = build().extract(&doc);
    let second = build().extract(&doc);
    assert_eq!(first.text, second.text);
    assert_eq!(first.pages, second.pages);
    assert_eq!(first.status, second.status);
    assert_eq!(first.confidence, second.confidence);
}

#[test]
fn scorer_is_monotonic_for_fixed_size() {
    let scorer = ConfidenceScorer::new();
    let scores: Vec<f32> = (0..=50).map(|n| scorer.score(n * 40, 50_000)).collect();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    assert!(scores.iter().all(|s| (0.0..=100.0).contains(s)));
}

#[test]
fn single_page_normalization_keeps_repeated_lines() {
    let text = format!(
        "Confidential\nFirst part\n{pb}Confidential\nSecond part\n",
        pb = PAGE_BREAK
    );
    let normalized = TextNormalizer::new().normalize(&text, 1);
    assert_eq!(normalized.matches("Confidential").count(), 2);
}

#[test]
fn lopdf_reads_a_generated_pdf() {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(
                    "Minutes of the planning committee meeting held on Tuesday evening",
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();

    let mut config = Config::default();
    config.extraction.pdf_strategies = vec!["lopdf".to_string()];
    let result = Orchestrator::from_config(&config)
        .extract(&SourceDocument::new("minutes.pdf", "application/pdf", bytes));

    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.pages, 1);
    assert!(result.text.contains("planning committee"));
}
