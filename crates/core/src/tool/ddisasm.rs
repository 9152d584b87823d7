use std::path::{Component, Path};
use std::process::Command;
use std::time::Duration;

use crate::config::{ExtractorConfig, Launcher};
use crate::error::ExtractError;
use crate::scratch::ScratchLayout;

use super::{probe_version, run_captured, DisassemblerTool, ToolRun};

/// Mount point of the input binary inside the container.
const CONTAINER_BINARY: &str = "/binary";
/// Mount point of the scratch root inside the container.
const CONTAINER_SCRATCH: &str = "/scratch";

/// ddisasm, either containerized or installed locally.
#[derive(Debug, Clone)]
pub struct DdisasmTool {
    launcher: Launcher,
    timeout: Option<Duration>,
}

impl DdisasmTool {
    pub fn new(launcher: Launcher, timeout: Option<Duration>) -> Self {
        Self { launcher, timeout }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.launcher.clone(), config.timeout())
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// Build the full analysis command for `binary`, writing into `scratch`.
    pub fn command(&self, binary: &Path, scratch: &ScratchLayout) -> Command {
        match &self.launcher {
            Launcher::Native { program } => {
                let mut cmd = Command::new(program);
                cmd.arg("--json")
                    .arg(&scratch.cfg_json)
                    .arg(binary)
                    .arg("--debug-dir")
                    .arg(&scratch.binary_dir);
                cmd
            }
            Launcher::Docker { image, docker_bin } => {
                let binary = binary.canonicalize().unwrap_or_else(|_| binary.to_path_buf());
                let mut cmd = Command::new(docker_bin);
                cmd.args(["run", "--rm"]);
                if let Some(user) = scratch_owner(&scratch.root) {
                    cmd.arg(format!("--user={user}"));
                }
                cmd.arg("-v")
                    .arg(format!("{}:{CONTAINER_BINARY}", binary.display()))
                    .arg("-v")
                    .arg(format!("{}:{CONTAINER_SCRATCH}", scratch.root.display()))
                    .arg(image)
                    .arg("ddisasm")
                    .arg("--json")
                    .arg(container_path(scratch, &scratch.cfg_json))
                    .arg(CONTAINER_BINARY)
                    .arg("--debug-dir")
                    .arg(container_path(scratch, &scratch.binary_dir));
                cmd
            }
        }
    }

    fn version_command(&self) -> Command {
        match &self.launcher {
            Launcher::Native { program } => {
                let mut cmd = Command::new(program);
                cmd.arg("--version");
                cmd
            }
            Launcher::Docker { image, docker_bin } => {
                let mut cmd = Command::new(docker_bin);
                cmd.args(["run", "--rm"]).arg(image).args(["ddisasm", "--version"]);
                cmd
            }
        }
    }
}

impl DisassemblerTool for DdisasmTool {
    fn name(&self) -> &'static str {
        "ddisasm"
    }

    fn display_name(&self) -> &'static str {
        "Ddisasm"
    }

    fn version(&self) -> Option<String> {
        probe_version(self.version_command(), self.name(), self.timeout)
    }

    fn run(&self, binary: &Path, scratch: &ScratchLayout) -> Result<ToolRun, ExtractError> {
        let output = run_captured(self.command(binary, scratch), self.name(), self.timeout)?;
        Ok(ToolRun { output })
    }
}

/// Path of `host_path` as seen from inside the container.
fn container_path(scratch: &ScratchLayout, host_path: &Path) -> String {
    let mut out = String::from(CONTAINER_SCRATCH);
    if let Some(rel) = scratch.relative(host_path) {
        for component in rel.components() {
            if let Component::Normal(part) = component {
                out.push('/');
                out.push_str(&part.to_string_lossy());
            }
        }
    }
    out
}

/// `uid:gid` owning the scratch root, so container output stays writable by us.
#[cfg(unix)]
fn scratch_owner(root: &Path) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata(root).ok().map(|m| format!("{}:{}", m.uid(), m.gid()))
}

#[cfg(not(unix))]
fn scratch_owner(_root: &Path) -> Option<String> {
    None
}
