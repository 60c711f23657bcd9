//! Batch extraction command.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use super::helpers::{load_document, summary_line};
use crate::config::Config;
use crate::extract::{CancelToken, Orchestrator};
use crate::services::{BatchExtractor, ExtractionEvent, PageLimitPolicy};

pub async fn cmd_batch(
    config: &Config,
    files: &[PathBuf],
    workers: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        documents.push(load_document(file, None).await?);
    }
    let names: Vec<String> = documents.iter().map(|d| d.name().to_string()).collect();

    let workers = workers.unwrap_or(config.workers);
    let extractor = BatchExtractor::new(Arc::new(Orchestrator::from_config(config)), workers);

    // Create event channel for progress tracking
    let (event_tx, mut event_rx) = mpsc::channel::<ExtractionEvent>(100);
    let show_progress = !json;

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            match event {
                ExtractionEvent::BatchStarted { total_documents } if show_progress => {
                    println!(
                        "{} Extracting text from {} documents",
                        style("→").cyan(),
                        total_documents
                    );
                    let pb = ProgressBar::new(total_documents as u64);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    progress = Some(pb);
                }
                ExtractionEvent::DocumentStarted { name, .. } => {
                    if let Some(ref pb) = progress {
                        pb.set_message(name);
                    }
                }
                ExtractionEvent::DocumentFinished { .. } => {
                    if let Some(ref pb) = progress {
                        pb.inc(1);
                    }
                }
                ExtractionEvent::BatchComplete { .. } => {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let summary = extractor
        .process(documents, event_tx, CancelToken::new())
        .await;

    // Wait for event handler to finish
    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }

    let policy = PageLimitPolicy::new(config.limits.max_pages);
    let mut rejected = Vec::new();
    for (name, result) in names.iter().zip(&summary.results) {
        if let Err(e) = policy.check(result) {
            rejected.push(format!("{}: {}", name, e));
        }
    }

    if json {
        let entries: Vec<serde_json::Value> = names
            .iter()
            .zip(&summary.results)
            .map(|(name, result)| serde_json::json!({ "file": name, "result": result }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (name, result) in names.iter().zip(&summary.results) {
            println!("{}", summary_line(name, result));
            if let Some(ref message) = result.message {
                println!("  {}", style(message).dim());
            }
        }
        println!(
            "\n{} {} completed, {} low quality, {} failed",
            style("✓").green(),
            summary.completed,
            summary.low_quality,
            summary.failed
        );
    }

    if !rejected.is_empty() {
        for line in &rejected {
            eprintln!("{} {}", style("✗").red(), line);
        }
        anyhow::bail!("{} documents rejected by page limit", rejected.len());
    }
    Ok(())
}
