//! DOCX text extraction.
//!
//! Reads `word/document.xml` out of the zip container and collects the text
//! runs in document order. DOCX has no fixed pagination, so the page count
//! is estimated from the word count.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::error::ExtractionError;

/// Words per page used for the page estimate unless configured otherwise.
pub const DEFAULT_WORDS_PER_PAGE: u32 = 500;

/// Plain text pulled from a DOCX body.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxText {
    pub text: String,
    pub words: usize,
    pub estimated_pages: u32,
}

#[derive(Debug, Clone)]
pub struct DocxExtractor {
    words_per_page: u32,
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_PER_PAGE)
    }
}

impl DocxExtractor {
    pub fn new(words_per_page: u32) -> Self {
        Self {
            words_per_page: words_per_page.max(1),
        }
    }

    pub fn extract(&self, content: &[u8]) -> Result<DocxText, ExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(content))
            .map_err(|e| ExtractionError::DocxParse(format!("not a valid DOCX container: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractionError::DocxParse(format!("missing word/document.xml: {}", e)))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractionError::DocxParse(format!("unreadable word/document.xml: {}", e)))?;

        let text = body_text(&xml)?;
        let words = text.split_whitespace().count();

        Ok(DocxText {
            estimated_pages: self.estimate_pages(words),
            words,
            text,
        })
    }

    /// `ceil(words / words_per_page)`; a document with no words has no pages.
    pub fn estimate_pages(&self, words: usize) -> u32 {
        words.div_ceil(self.words_per_page as usize) as u32
    }
}

/// Collect `w:t` runs, turning tabs, breaks and paragraph ends into whitespace.
///
/// Paragraph properties (`w:pPr`) hold tab stop definitions that are also
/// spelled `w:tab`; nothing inside them is content.
fn body_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;
    let mut props_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:pPr" => props_depth += 1,
                _ if props_depth > 0 => {}
                b"w:t" => in_text = true,
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                _ if props_depth > 0 => {}
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ExtractionError::DocxParse(format!("bad text run: {}", e)))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:pPr" => props_depth = props_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::DocxParse(format!(
                    "malformed document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build a minimal DOCX whose body has one paragraph per entry.
    pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, p))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }
}
