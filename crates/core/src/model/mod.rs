//! Output model handed back to callers of an extraction run.
//!
//! Addresses are file offsets throughout. Maps are ordered so serialized
//! output is stable across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Version of this extractor's output layout.
pub const SOURCE_VERSION: &str = "0.1";

/// An instruction inside a reconstructed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMember {
    pub address: u64,
    pub text: String,
}

impl BlockMember {
    pub fn new(address: u64, text: impl Into<String>) -> Self {
        Self { address, text: text.into() }
    }
}

/// Basic block with members in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub start: u64,
    pub members: Vec<BlockMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub tool_name: String,
    pub tool_version: String,
    pub source_version: String,
    /// Wall-clock seconds spent inside the external tool.
    pub elapsed_time: f64,
    pub extracted_at: String,
}

/// Complete result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputModel {
    pub meta: ExtractionMeta,
    pub instructions: BTreeMap<u64, String>,
    pub original_blocks: BTreeMap<u64, Block>,
    /// Reserved for data references; not populated yet.
    #[serde(default)]
    pub data: BTreeMap<u64, serde_json::Value>,
}

impl OutputModel {
    pub fn block(&self, start: u64) -> Option<&Block> {
        self.original_blocks.get(&start)
    }
}
