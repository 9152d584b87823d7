//! External disassembler adapters.

mod ddisasm;

pub use ddisasm::DdisasmTool;

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ExtractError;
use crate::scratch::ScratchLayout;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const MAX_REPORTED_OUTPUT: usize = 4096;

/// What a successful tool invocation left behind besides its fact files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRun {
    /// Combined stdout/stderr of the tool.
    pub output: String,
}

/// An external program that disassembles a binary into fact tables.
///
/// Implementations must leave `instruction.facts` and `block_information.csv`
/// in `scratch.binary_dir` when they return `Ok`.
pub trait DisassemblerTool {
    /// Short name, also used as the scratch subdirectory.
    fn name(&self) -> &'static str;
    /// Name recorded in the output metadata.
    fn display_name(&self) -> &'static str {
        self.name()
    }
    /// Tool version, if it can be determined.
    fn version(&self) -> Option<String>;
    fn run(&self, binary: &Path, scratch: &ScratchLayout) -> Result<ToolRun, ExtractError>;
}

/// Run `cmd` to completion with stdout and stderr captured together.
///
/// A non-zero exit becomes `ToolFailure`; exceeding `timeout` kills the child
/// and becomes `ToolTimeout`.
pub(crate) fn run_captured(
    mut cmd: Command,
    tool: &str,
    timeout: Option<Duration>,
) -> Result<String, ExtractError> {
    let spawn_err = |e| ExtractError::ToolSpawn { tool: tool.to_string(), source: e };

    // Nothing drains a pipe while we poll, so output goes to a file.
    let mut log = tempfile::tempfile().map_err(spawn_err)?;
    cmd.stdin(Stdio::null())
        .stdout(log.try_clone().map_err(spawn_err)?)
        .stderr(log.try_clone().map_err(spawn_err)?);

    tracing::debug!(tool, command = ?cmd, "spawning external tool");
    let mut child = cmd.spawn().map_err(spawn_err)?;
    let status = match timeout {
        None => child.wait().map_err(spawn_err)?,
        Some(limit) => wait_with_deadline(&mut child, limit, tool)?,
    };

    let mut raw = Vec::new();
    log.seek(SeekFrom::Start(0)).and_then(|_| log.read_to_end(&mut raw)).map_err(spawn_err)?;
    let output = String::from_utf8_lossy(&raw).into_owned();

    if !status.success() {
        tracing::error!(tool, code = ?status.code(), output = %output, "tool returned with non-zero exit code");
        return Err(ExtractError::ToolFailure {
            tool: tool.to_string(),
            code: status.code(),
            output: tail(&output, MAX_REPORTED_OUTPUT).to_string(),
        });
    }
    Ok(output)
}

fn wait_with_deadline(
    child: &mut std::process::Child,
    limit: Duration,
    tool: &str,
) -> Result<ExitStatus, ExtractError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| ExtractError::ToolSpawn { tool: tool.to_string(), source: e })?
        {
            return Ok(status);
        }
        let elapsed = start.elapsed();
        if elapsed >= limit {
            let _ = child.kill();
            let _ = child.wait();
            tracing::error!(tool, seconds = limit.as_secs(), "tool timed out and was killed");
            return Err(ExtractError::ToolTimeout { tool: tool.to_string(), seconds: limit.as_secs() });
        }
        thread::sleep(POLL_INTERVAL.min(limit - elapsed));
    }
}

/// First non-empty line printed by a successful `cmd`, bounded by `timeout`.
pub(crate) fn probe_version(cmd: Command, tool: &str, timeout: Option<Duration>) -> Option<String> {
    match run_captured(cmd, tool, timeout) {
        Ok(output) => output.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string),
        Err(e) => {
            tracing::debug!(tool, error = %e, "version probe failed");
            None
        }
    }
}

/// Last `max` bytes of `text`, cut on a char boundary.
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
