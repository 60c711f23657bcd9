//! Lenient last-resort extraction straight from page content streams.
//!
//! Walks the text-showing operators (`Tj`, `TJ`, `'`, `"`) without
//! consulting fonts. When a stream won't even tokenize, a byte-level scan
//! picks out `(...) Tj` literals instead. Output is rough, but it recovers
//! text from files every other strategy rejects.

use std::sync::LazyLock;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use regex::bytes::Regex;

use super::{classify_parse_error, PageSource, PdfStrategy};
use crate::models::FailureReason;

/// TJ kerning beyond this many thousandths of an em reads as a word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

static RAW_SHOW_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s-u)(\((?:[^()\\]|\\.)*\)\s*Tj|\[(?:[^\]\\]|\\.)*\]\s*TJ)")
        .expect("valid regex")
});

static RAW_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s-u)\(((?:[^()\\]|\\.)*)\)").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentStreamStrategy;

impl PdfStrategy for ContentStreamStrategy {
    fn name(&self) -> &'static str {
        "content-stream"
    }

    fn open<'a>(&'a self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, FailureReason> {
        match Document::load_mem(content) {
            Ok(doc) => {
                if doc.is_encrypted() {
                    return Err(FailureReason::Encrypted);
                }
                let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
                Ok(Box::new(StreamPages { doc, page_ids }))
            }
            Err(e) => {
                if let FailureReason::Encrypted = classify_parse_error(e.to_string()) {
                    return Err(FailureReason::Encrypted);
                }
                // Structure is beyond repair; scan the raw bytes as one page.
                Ok(Box::new(RawBytes(content)))
            }
        }
    }
}

struct StreamPages {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PageSource for StreamPages {
    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, String> {
        let id = self
            .page_ids
            .get(page.saturating_sub(1) as usize)
            .ok_or_else(|| format!("page {} out of range", page))?;
        let data = self.doc.get_page_content(*id).map_err(|e| e.to_string())?;

        match Content::decode(&data) {
            Ok(content) => Ok(text_from_operations(&content.operations)),
            Err(_) => Ok(scan_raw(&data)),
        }
    }
}

struct RawBytes<'a>(&'a [u8]);

impl PageSource for RawBytes<'_> {
    fn page_count(&self) -> u32 {
        1
    }

    fn page_text(&self, _page: u32) -> Result<String, String> {
        Ok(scan_raw(self.0))
    }
}

/// Reassemble text from decoded content stream operations.
fn text_from_operations(operations: &[Operation]) -> String {
    let mut out = String::new();

    for op in operations {
        match op.operator.as_str() {
            "Tj" => push_strings(&mut out, &op.operands),
            "'" | "\"" => {
                newline(&mut out);
                push_strings(&mut out, &op.operands);
            }
            "TJ" => {
                for operand in &op.operands {
                    let Object::Array(items) = operand else { continue };
                    for item in items {
                        match item {
                            Object::String(bytes, _) => out.push_str(&decode_pdf_string(bytes)),
                            other => {
                                if other.as_float().is_ok_and(|n| n < TJ_SPACE_THRESHOLD)
                                    && !out.ends_with(char::is_whitespace)
                                {
                                    out.push(' ');
                                }
                            }
                        }
                    }
                }
            }
            "T*" | "ET" => newline(&mut out),
            "Td" | "TD" => {
                let ty = op.operands.get(1).and_then(|o| o.as_float().ok());
                if ty.is_some_and(|ty| ty != 0.0) {
                    newline(&mut out);
                } else if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }

    out.trim_end().to_string()
}

fn push_strings(out: &mut String, operands: &[Object]) {
    for operand in operands {
        if let Object::String(bytes, _) = operand {
            out.push_str(&decode_pdf_string(bytes));
        }
    }
}

fn newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Decode a PDF string: UTF-16BE when it carries a byte order mark,
/// otherwise one char per byte.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Byte-level fallback for streams that don't tokenize.
fn scan_raw(data: &[u8]) -> String {
    let mut lines = Vec::new();
    for show in RAW_SHOW_TEXT.find_iter(data) {
        let line: String = RAW_LITERAL
            .captures_iter(show.as_bytes())
            .filter_map(|caps| caps.get(1))
            .map(|m| decode_pdf_string(&unescape_literal(m.as_bytes())))
            .collect();
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Resolve backslash escapes inside a PDF literal string.
fn unescape_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' || i + 1 >= raw.len() {
            out.push(b);
            i += 1;
            continue;
        }

        let next = raw[i + 1];
        i += 2;
        match next {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'\r' => {
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {}
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match raw.get(i) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            other => out.push(other),
        }
    }
    out
}
