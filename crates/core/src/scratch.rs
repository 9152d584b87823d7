//! Per-run scratch space: where the tool writes its facts and where
//! in-memory inputs are materialized.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::ExtractError;
use crate::facts::{BLOCK_FACTS, INSTRUCTION_FACTS};

/// Logical layout of one run's scratch directory.
///
/// Derived from a root path and a tool name; it does not touch the filesystem
/// until `ensure` is called.
#[derive(Debug, Clone)]
pub struct ScratchLayout {
    /// Root handed to the tool (mounted as `/scratch` under docker).
    pub root: PathBuf,
    /// `<root>/<tool>`.
    pub tool_dir: PathBuf,
    /// `<root>/<tool>/binary`, the tool's debug/output directory.
    pub binary_dir: PathBuf,
    pub instruction_facts: PathBuf,
    pub block_facts: PathBuf,
    pub cfg_json: PathBuf,
}

impl ScratchLayout {
    pub fn new(root: impl AsRef<Path>, tool_name: &str) -> Self {
        let root = root.as_ref().to_path_buf();
        let tool_dir = root.join(tool_name);
        let binary_dir = tool_dir.join("binary");
        let instruction_facts = binary_dir.join(INSTRUCTION_FACTS);
        let block_facts = binary_dir.join(BLOCK_FACTS);
        let cfg_json = binary_dir.join("cfg.json");

        Self { root, tool_dir, binary_dir, instruction_facts, block_facts, cfg_json }
    }

    /// `path` expressed relative to the scratch root, if it lives under it.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }

    pub fn ensure(&self) -> Result<(), ExtractError> {
        fs::create_dir_all(&self.binary_dir)
            .map_err(|e| ExtractError::Scratch { path: self.binary_dir.clone(), source: e })
    }

    /// Best-effort removal of everything inside the tool output directory.
    ///
    /// Returns the number of entries that could not be removed; each failure
    /// is logged.
    pub fn clear_artifacts(&self) -> usize {
        let entries = match fs::read_dir(&self.binary_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(dir = %self.binary_dir.display(), error = %e, "cannot list scratch artifacts");
                return 1;
            }
        };

        let mut failures = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let removed = if path.is_dir() { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
            if let Err(e) = removed {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch artifact");
                failures += 1;
            }
        }
        failures
    }
}

/// Scratch directory owned by one in-flight run.
///
/// Artifacts are cleared on drop, so cleanup also happens when the run
/// aborts part way through.
#[derive(Debug)]
pub struct RunScratch {
    layout: ScratchLayout,
    owned_root: Option<PathBuf>,
    cleanup: bool,
}

impl RunScratch {
    /// Prepare scratch space under `base`. With `isolate` set, the run gets a
    /// fresh uniquely named subdirectory that is removed afterwards.
    pub fn create(
        base: &Path,
        tool_name: &str,
        isolate: bool,
        cleanup: bool,
    ) -> Result<Self, ExtractError> {
        // Docker bind mounts need an absolute host path.
        let base = if base.is_absolute() {
            base.to_path_buf()
        } else {
            env::current_dir()
                .map_err(|e| ExtractError::Scratch { path: base.to_path_buf(), source: e })?
                .join(base)
        };
        fs::create_dir_all(&base)
            .map_err(|e| ExtractError::Scratch { path: base.clone(), source: e })?;

        let (root, owned_root) = if isolate {
            let dir = tempfile::Builder::new()
                .prefix("run-")
                .tempdir_in(&base)
                .map_err(|e| ExtractError::Scratch { path: base.clone(), source: e })?;
            let root = dir.keep();
            (root.clone(), Some(root))
        } else {
            (base, None)
        };

        let layout = ScratchLayout::new(root, tool_name);
        layout.ensure()?;
        if owned_root.is_none() {
            // Shared layout: facts left by an earlier run must not be read as ours.
            layout.clear_artifacts();
        }
        Ok(Self { layout, owned_root, cleanup })
    }

    pub fn layout(&self) -> &ScratchLayout {
        &self.layout
    }
}

impl Drop for RunScratch {
    fn drop(&mut self) {
        if !self.cleanup {
            return;
        }
        self.layout.clear_artifacts();
        if let Some(root) = &self.owned_root {
            if let Err(e) = fs::remove_dir_all(root) {
                tracing::warn!(dir = %root.display(), error = %e, "failed to remove run scratch dir");
            }
        }
    }
}

/// Write `data` to a real file under `dir` so an external tool can read it.
///
/// The file is deleted when the returned path is dropped.
pub fn materialize(dir: &Path, name: &str, data: &[u8]) -> Result<TempPath, ExtractError> {
    let scratch_err = |e| ExtractError::Scratch { path: dir.to_path_buf(), source: e };
    fs::create_dir_all(dir).map_err(scratch_err)?;

    let file_name = Path::new(name).file_name().and_then(|n| n.to_str()).unwrap_or("binary");
    let mut file = tempfile::Builder::new()
        .prefix("input-")
        .suffix(&format!("-{file_name}"))
        .tempfile_in(dir)
        .map_err(scratch_err)?;
    file.write_all(data).map_err(scratch_err)?;
    file.flush().map_err(scratch_err)?;
    Ok(file.into_temp_path())
}
