//! Single-document extraction command.

use std::path::Path;

use super::helpers::{load_document, print_result};
use crate::config::Config;
use crate::extract::Orchestrator;
use crate::services::PageLimitPolicy;

pub async fn cmd_extract(
    config: &Config,
    file: &Path,
    mime_type: Option<String>,
    json: bool,
    max_pages: Option<u32>,
) -> anyhow::Result<()> {
    let document = load_document(file, mime_type.as_deref()).await?;
    let name = document.name().to_string();
    let orchestrator = Orchestrator::from_config(config);

    // Extraction shells out and parses synchronously; keep it off the runtime threads.
    let result = tokio::task::spawn_blocking(move || orchestrator.extract(&document)).await?;

    PageLimitPolicy::new(max_pages.or(config.limits.max_pages)).check(&result)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&name, &result);
    }
    Ok(())
}
