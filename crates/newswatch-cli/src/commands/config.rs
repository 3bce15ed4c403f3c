use std::path::Path;

use anyhow::{bail, Result};

use newswatch_core::AppConfig;

/// Write the built-in defaults to `path`
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    AppConfig::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("\nSet TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID to enable alerts.");

    Ok(())
}

pub fn path(path: &Path) -> Result<()> {
    let state = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("{}{}", path.display(), state);
    Ok(())
}

/// Print the effective configuration with credentials masked
pub fn show(config: &AppConfig) -> Result<()> {
    let config = redacted(config);
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn mask(secret: &mut Option<String>) {
    if secret.is_some() {
        *secret = Some("********".to_string());
    }
}

fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    mask(&mut config.telegram.bot_token);
    mask(&mut config.sheets.repl_identity);
    mask(&mut config.sheets.web_repl_renewal);
    mask(&mut config.sheets.access_token);
    mask(&mut config.newsapi.api_key);
    config
}
