//! ddfacts-core
//!
//! Core library that turns the fact tables written by a datalog disassembler
//! (ddisasm) into an address-normalized instruction/block model.
//!
//! The pipeline is: classify the binary header, run the external tool into a
//! per-run scratch directory, parse the exhaustive instruction table and the
//! block boundary table, then rebuild each block's member instructions.
//!
//! All substantive logic lives here so it is testable without the external
//! tool and reusable from multiple frontends.

pub mod address;
pub mod config;
pub mod error;
pub mod extract;
pub mod facts;
pub mod header;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod scratch;
pub mod tool;

pub use address::AddressSpace;
pub use config::{ExtractorConfig, InstructionScope, Launcher};
pub use error::ExtractError;
pub use extract::{reconcile_fact_files, Extractor, Reconciled, Stage};
pub use header::{BinaryHeader, FormatKind, HeaderInfo, ObjectKind};
pub use model::{Block, BlockMember, ExtractionMeta, OutputModel};
pub use scratch::ScratchLayout;
pub use tool::{DdisasmTool, DisassemblerTool, ToolRun};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
