use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use ddfacts_core::{BinaryHeader, DdisasmTool, Extractor, InstructionScope, OutputModel};

use crate::commands::{emit_json, load_extractor_config};
use crate::{canonicalize_or_current, sha256_file};

/// Extraction result together with the identity of the binary it describes.
#[derive(Debug, Serialize)]
pub struct ExtractionReport {
    pub binary: String,
    pub sha256: String,
    pub model: OutputModel,
}

/// Options for `extract` that override the loaded config.
#[derive(Debug, Clone, Default)]
pub struct ExtractOverrides {
    pub scratch: Option<String>,
    pub timeout_secs: Option<u64>,
    pub exhaustive: bool,
}

/// Run ddisasm against `binary` and print (or write) the reconciled model.
pub fn extract_command(
    binary: &str,
    config_path: Option<&str>,
    overrides: ExtractOverrides,
    out: Option<&str>,
) -> Result<()> {
    let binary_path = canonicalize_or_current(binary)?;
    if !binary_path.is_file() {
        return Err(anyhow!("Binary file does not exist: {}", binary_path.display()));
    }

    let mut config = load_extractor_config(config_path)?;
    if let Some(scratch) = overrides.scratch {
        config.scratch_dir = PathBuf::from(scratch);
    }
    if overrides.timeout_secs.is_some() {
        config.timeout_secs = overrides.timeout_secs;
    }
    if overrides.exhaustive {
        config.instruction_scope = InstructionScope::Exhaustive;
    }

    let header = BinaryHeader::from_path(&binary_path)?;
    let sha256 = sha256_file(&binary_path)?;
    let extractor = Extractor::new(DdisasmTool::from_config(&config), config);
    let model = extractor
        .extract(&binary_path, &header)
        .with_context(|| format!("Extraction failed for {}", binary_path.display()))?;

    let report = ExtractionReport { binary: binary_path.display().to_string(), sha256, model };
    emit_json(&report, out)
}
