//! Tool availability check.

use console::style;

use crate::config::Config;
use crate::ocr::{create_backend, OcrBackend};
use crate::utils::check_binary;

/// External tools and what happens without them.
const TOOLS: &[(&str, &str, &str)] = &[
    (
        "pdftotext",
        "poppler-utils",
        "pdftotext strategy skipped; in-process PDF parsers still run",
    ),
    (
        "pdfinfo",
        "poppler-utils",
        "pdftotext reads the whole document in one pass",
    ),
    ("tesseract", "tesseract-ocr", "image documents cannot be read"),
];

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("External Tools:").cyan());
    let mut all_found = true;
    for (tool, package, without) in TOOLS {
        if check_binary(tool) {
            println!("  {:<15} {}", tool, style("✓ found").green());
        } else {
            all_found = false;
            println!("  {:<15} {}", tool, style("✗ not found").red());
            println!(
                "                  {}",
                style(format!("Install {}; until then {}", package, without)).dim()
            );
        }
    }

    println!("\n{}", style("OCR Backend:").cyan());
    match create_backend(&config.ocr.backend, &config.ocr.language) {
        Some(backend) => print_backend(backend.as_ref(), &config.ocr.language),
        None => println!(
            "  {:<15} {}",
            config.ocr.backend,
            style("✗ unknown backend").red()
        ),
    }

    println!("\n{}", style("PDF Strategies:").cyan());
    for (i, name) in config.extraction.pdf_strategies.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
    if config.extraction.lenient_fallback {
        println!("  {}", style("then lenient content-stream pass").dim());
    }

    if all_found {
        println!("\n{} All tools available", style("✓").green());
    } else {
        println!(
            "\n{} Some tools missing; extraction degrades as noted above",
            style("!").yellow()
        );
    }
    Ok(())
}

fn print_backend(backend: &dyn OcrBackend, language: &str) {
    let status = if backend.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {} (language: {})", backend.name(), status, language);
    if !backend.is_available() {
        println!("                  {}", style(backend.availability_hint()).dim());
    }
}
