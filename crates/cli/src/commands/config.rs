use anyhow::Result;

use crate::commands::load_extractor_config;

/// Print the effective extractor config (file, defaults and environment merged).
pub fn show_config_command(config_path: Option<&str>) -> Result<()> {
    let config = load_extractor_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
