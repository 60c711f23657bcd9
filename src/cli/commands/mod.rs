//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod batch;
mod check;
mod config_cmd;
mod extract;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Extract text from PDF, DOCX and image documents")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "DOCSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single document
    Extract {
        /// Document to extract
        file: PathBuf,
        /// Declared media type (detected from content and extension if omitted)
        #[arg(short, long)]
        mime_type: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Reject documents with more pages than this (overrides config)
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Extract text from many documents in parallel
    Batch {
        /// Documents to extract
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Number of extraction workers (default: from config)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check availability of external extraction tools
    Check,

    /// Show the effective configuration as TOML
    Config,
}

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(&path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config).await?;

    match cli.command {
        Commands::Extract {
            file,
            mime_type,
            json,
            max_pages,
        } => extract::cmd_extract(&config, &file, mime_type, json, max_pages).await,
        Commands::Batch {
            files,
            workers,
            json,
        } => batch::cmd_batch(&config, &files, workers, json).await,
        Commands::Check => check::cmd_check(&config).await,
        Commands::Config => config_cmd::cmd_config_show(&config).await,
    }
}
