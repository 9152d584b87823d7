use std::path::PathBuf;

use thiserror::Error;

/// Every way a single extraction run can fail.
///
/// All variants are fatal for the binary being processed; the caller gets no
/// model at all rather than a partial one.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unknown binary format; {tool} not invoked")]
    UnknownFormat { tool: String },
    #[error("Failed to parse binary header: {0}")]
    Header(String),
    #[error("Failed to spawn {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with code {code:?}: {output}")]
    ToolFailure { tool: String, code: Option<i32>, output: String },
    #[error("{tool} did not finish within {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },
    #[error("Fact file not found at {0}")]
    MissingFacts(PathBuf),
    #[error("Malformed fact at {}:{line}: {message}", path.display())]
    FactFormat { path: PathBuf, line: u64, message: String },
    #[error("Virtual address 0x{0:x} does not map to a file offset")]
    UnmappedAddress(u64),
    #[error("Block 0x{block:x} reaches 0x{address:x}, which is not in the instruction table")]
    ReconciliationGap { block: u64, address: u64 },
    #[error("Scratch directory error at {}: {source}", path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}
