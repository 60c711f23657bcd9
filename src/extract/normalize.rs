//! Text cleanup applied to every successful extraction.
//!
//! Repairs common encoding artifacts, collapses runs of whitespace, and for
//! multi-page documents removes header and footer lines that repeat across
//! most pages. Running it twice gives the same text as running it once.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::PAGE_BREAK;

/// Lines at each end of a page considered for header/footer removal.
const EDGE_LINES: usize = 2;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x0B\u{00A0}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]+").expect("valid regex"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// UTF-8 read as Windows-1252, plus typographic forms OCR and PDF tools emit.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{00E2}\u{20AC}\u{2122}", "'"),
    ("\u{00E2}\u{20AC}\u{02DC}", "'"),
    ("\u{00E2}\u{20AC}\u{0153}", "\""),
    ("\u{00E2}\u{20AC}\u{009D}", "\""),
    ("\u{00E2}\u{20AC}\u{201D}", "-"),
    ("\u{00E2}\u{20AC}\u{201C}", "-"),
    ("\u{00E2}\u{20AC}\u{00A6}", "..."),
    ("\u{00C3}\u{00A9}", "\u{00E9}"),
    ("\u{00C3}\u{00A8}", "\u{00E8}"),
    ("\u{00C3}\u{00BC}", "\u{00FC}"),
    ("\u{00C3}\u{00B6}", "\u{00F6}"),
    ("\u{00C3}\u{00A4}", "\u{00E4}"),
    ("\u{00C2}\u{00A0}", " "),
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{FB06}", "st"),
];

/// Characters dropped outright: soft hyphens, zero-width marks, BOMs and
/// replacement characters left by lossy decoding.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{FFFD}'
    ) || (c.is_control() && !matches!(c, '\n' | '\t' | PAGE_BREAK))
}

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize raw extracted text.
    ///
    /// `pages` is the document's page count; header/footer stripping only
    /// runs when it is above one and the text actually carries page breaks.
    /// Output has no page breaks left: pages are separated by a blank line.
    pub fn normalize(&self, text: &str, pages: u32) -> String {
        let repaired = repair_encoding(text);

        let mut page_lines: Vec<Vec<String>> = repaired
            .split(PAGE_BREAK)
            .map(|page| page.lines().map(clean_line).collect())
            .collect();

        if pages > 1 && page_lines.len() > 1 {
            strip_repeated_edges(&mut page_lines);
        }

        let joined = page_lines
            .iter()
            .map(|lines| lines.join("\n").trim().to_string())
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        EXCESS_NEWLINES
            .replace_all(&joined, "\n\n")
            .trim()
            .to_string()
    }
}

fn repair_encoding(text: &str) -> String {
    let mut fixed = text.replace("\r\n", "\n").replace('\r', "\n");
    for (from, to) in REPLACEMENTS {
        if fixed.contains(from) {
            fixed = fixed.replace(from, to);
        }
    }
    fixed.chars().filter(|&c| !is_invisible(c)).collect()
}

fn clean_line(line: &str) -> String {
    HORIZONTAL_WS.replace_all(line, " ").trim().to_string()
}

/// Comparison key for a header/footer line: case-insensitive, with page
/// numbers and other digit runs masked so "Page 3 of 10" matches "Page 4 of 10".
fn edge_key(line: &str) -> String {
    DIGITS.replace_all(&line.to_lowercase(), "#").into_owned()
}

/// Indices of the first and last few non-empty lines of a page.
fn edge_indices(lines: &[String]) -> Vec<usize> {
    let non_empty: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.is_empty())
        .map(|(i, _)| i)
        .collect();

    let mut indices: Vec<usize> = non_empty.iter().take(EDGE_LINES).copied().collect();
    for &i in non_empty.iter().rev().take(EDGE_LINES) {
        if !indices.contains(&i) {
            indices.push(i);
        }
    }
    indices
}

/// Remove edge lines whose key shows up on a majority of pages (and at
/// least two). A page is never emptied by stripping.
fn strip_repeated_edges(pages: &mut [Vec<String>]) {
    let page_total = pages.iter().filter(|p| p.iter().any(|l| !l.is_empty())).count();
    if page_total < 2 {
        return;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for page in pages.iter() {
        let mut seen: Vec<String> = edge_indices(page).iter().map(|&i| edge_key(&page[i])).collect();
        seen.sort();
        seen.dedup();
        for key in seen {
            *counts.entry(key).or_default() += 1;
        }
    }

    let repeated = |key: &str| counts.get(key).is_some_and(|&n| n >= 2 && n * 2 > page_total);

    for page in pages.iter_mut() {
        let doomed: Vec<usize> = edge_indices(page)
            .into_iter()
            .filter(|&i| repeated(&edge_key(&page[i])))
            .collect();

        let remaining = page.iter().filter(|l| !l.is_empty()).count();
        if doomed.is_empty() || doomed.len() >= remaining {
            continue;
        }
        for i in doomed {
            page[i].clear();
        }
    }
}
