use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use ddfacts_core::ExtractorConfig;

/// Load the extractor config from `path`, or defaults when none is given.
///
/// `DDISASM_BIN` is applied on top in both cases.
pub fn load_extractor_config(path: Option<&str>) -> Result<ExtractorConfig> {
    let config = match path {
        Some(p) => ExtractorConfig::load(Path::new(p))
            .with_context(|| format!("Failed to load extractor config {p}"))?,
        None => ExtractorConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Print `value` as pretty JSON on stdout, or write it to `out`.
pub fn emit_json<T: Serialize>(value: &T, out: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
            eprintln!("Wrote {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
