use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Environment variable naming a local ddisasm executable; overrides the launcher.
pub const DDISASM_BIN_ENV: &str = "DDISASM_BIN";

/// Default container image used by the docker launcher.
pub const DEFAULT_IMAGE: &str = "grammatech/ddisasm";

/// How the external disassembler is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Launcher {
    /// Run inside a container with the binary and scratch dir bind-mounted.
    Docker {
        #[serde(default = "default_image")]
        image: String,
        #[serde(default = "default_docker_bin")]
        docker_bin: String,
    },
    /// Run a locally installed executable.
    Native { program: PathBuf },
}

impl Default for Launcher {
    fn default() -> Self {
        Launcher::Docker { image: default_image(), docker_bin: default_docker_bin() }
    }
}

/// Which instructions end up in the output model's instruction listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionScope {
    /// Only instructions reached while populating blocks.
    #[default]
    Cfg,
    /// Every instruction in the exhaustive table.
    Exhaustive,
}

/// Serializable extractor settings, usually read from a JSON or YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub launcher: Launcher,
    /// Root under which per-run scratch directories are created.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Give every run its own uniquely named scratch subdirectory.
    #[serde(default = "default_true")]
    pub isolate_runs: bool,
    /// Upper bound on the tool's runtime; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub instruction_scope: InstructionScope,
    /// Remove tool artifacts once the run finishes.
    #[serde(default = "default_true")]
    pub cleanup: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            launcher: Launcher::default(),
            scratch_dir: default_scratch_dir(),
            isolate_runs: true,
            timeout_secs: None,
            instruction_scope: InstructionScope::default(),
            cleanup: true,
        }
    }
}

impl ExtractorConfig {
    /// Load a config file; `.yaml`/`.yml` are read as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let body = fs::read_to_string(path).map_err(|e| {
            ExtractError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&body).map_err(|e| {
                ExtractError::Config(format!("failed to parse {}: {e}", path.display()))
            })
        } else {
            serde_json::from_str(&body).map_err(|e| {
                ExtractError::Config(format!("failed to parse {}: {e}", path.display()))
            })
        }
    }

    /// Apply `DDISASM_BIN` if it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(program) = env::var_os(DDISASM_BIN_ENV) {
            self.launcher = Launcher::Native { program: PathBuf::from(program) };
        }
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

fn default_docker_bin() -> String {
    "docker".to_string()
}

fn default_scratch_dir() -> PathBuf {
    env::temp_dir().join("ddfacts")
}

fn default_true() -> bool {
    true
}
