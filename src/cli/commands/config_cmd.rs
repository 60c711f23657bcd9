//! Configuration display command.

use console::style;

use crate::config::Config;

/// Print the effective configuration (file values plus env overrides) as TOML.
pub async fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!(
            "{} Loaded from {}",
            style("→").cyan(),
            path.display()
        ),
        None => eprintln!(
            "{} No config file found, showing defaults",
            style("!").yellow()
        ),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
