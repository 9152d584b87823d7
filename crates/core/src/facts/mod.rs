//! Parsers for the tab-delimited fact tables ddisasm leaves in its debug dir.
//!
//! Both tables share one line policy: blank lines, lines with fewer than three
//! fields and lines whose first field is empty are skipped, while an address or
//! size field that is present but not an integer fails the whole parse.

mod blocks;
mod instructions;

pub use blocks::BlockTable;
pub use instructions::{InstructionFact, InstructionTable};

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::ExtractError;

/// File name of the exhaustive instruction table inside the tool output dir.
pub const INSTRUCTION_FACTS: &str = "instruction.facts";
/// File name of the block boundary table inside the tool output dir.
pub const BLOCK_FACTS: &str = "block_information.csv";

const MIN_FIELDS: usize = 3;

/// Feed every usable row of a fact table to `on_row` along with its line number.
fn for_each_row<R, F>(reader: R, source: &Path, mut on_row: F) -> Result<(), ExtractError>
where
    R: Read,
    F: FnMut(u64, &StringRecord) -> Result<(), ExtractError>,
{
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    for row in rdr.records() {
        let record = row.map_err(|e| ExtractError::FactFormat {
            path: source.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() < MIN_FIELDS || record.get(0).map_or(true, str::is_empty) {
            tracing::trace!(source = %source.display(), line, "skipping short fact line");
            continue;
        }
        on_row(line, &record)?;
    }
    Ok(())
}

fn open_facts(path: &Path) -> Result<std::fs::File, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::MissingFacts(path.to_path_buf()));
    }
    std::fs::File::open(path)
        .map_err(|e| ExtractError::Scratch { path: path.to_path_buf(), source: e })
}

/// Integer field in decimal (ddisasm's native form) or `0x`-prefixed hex.
fn parse_int(
    record: &StringRecord,
    index: usize,
    what: &str,
    source: &Path,
    line: u64,
) -> Result<u64, ExtractError> {
    let raw = record.get(index).unwrap_or("").trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|_| ExtractError::FactFormat {
        path: source.to_path_buf(),
        line,
        message: format!("{what} field '{raw}' is not an integer"),
    })
}
