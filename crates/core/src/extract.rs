//! Extraction entry point: drives one binary from header check to finished model.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::address::AddressSpace;
use crate::config::{ExtractorConfig, InstructionScope};
use crate::error::ExtractError;
use crate::facts::{BlockTable, InstructionTable};
use crate::header::HeaderInfo;
use crate::model::{Block, ExtractionMeta, OutputModel, SOURCE_VERSION};
use crate::reconcile::{instruction_listing, populate_blocks};
use crate::scratch::{materialize, RunScratch};
use crate::tool::DisassemblerTool;

/// Progress of a run. A failure at any stage aborts the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ToolInvoked,
    FactsLocated,
    InstructionsParsed,
    BlocksParsed,
    BlocksPopulated,
    Done,
    Aborted,
}

/// Instructions and populated blocks reconciled from a pair of fact tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciled {
    pub instructions: BTreeMap<u64, String>,
    pub original_blocks: BTreeMap<u64, Block>,
}

/// Reconcile fact files that already exist on disk, without running any tool.
pub fn reconcile_fact_files(
    instruction_facts: &Path,
    block_facts: &Path,
    space: &AddressSpace<'_>,
    scope: InstructionScope,
) -> Result<Reconciled, ExtractError> {
    let mut stage = Stage::FactsLocated;
    reconcile_stages(instruction_facts, block_facts, space, scope, &mut stage)
}

fn reconcile_stages(
    instruction_facts: &Path,
    block_facts: &Path,
    space: &AddressSpace<'_>,
    scope: InstructionScope,
    stage: &mut Stage,
) -> Result<Reconciled, ExtractError> {
    let instructions = InstructionTable::from_path(instruction_facts, space)?;
    advance(stage, Stage::InstructionsParsed);

    let blocks = BlockTable::from_path(block_facts, space)?;
    advance(stage, Stage::BlocksParsed);

    let original_blocks = populate_blocks(&blocks, &instructions)?;
    advance(stage, Stage::BlocksPopulated);

    tracing::debug!(
        exhaustive = instructions.len(),
        blocks = original_blocks.len(),
        "reconciled fact tables"
    );
    Ok(Reconciled {
        instructions: instruction_listing(scope, &original_blocks, &instructions),
        original_blocks,
    })
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::trace!(from = ?*stage, to = ?next, "extraction stage");
    *stage = next;
}

/// Runs a disassembler tool against binaries and reconciles its facts.
///
/// One extractor can serve many runs; every run gets its own scratch space
/// unless `isolate_runs` is disabled.
pub struct Extractor<T: DisassemblerTool> {
    tool: T,
    config: ExtractorConfig,
}

impl<T: DisassemblerTool> Extractor<T> {
    pub fn new(tool: T, config: ExtractorConfig) -> Self {
        Self { tool, config }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the instruction/block model for the binary at `binary`.
    ///
    /// Returns either a complete model or an error; scratch artifacts are
    /// cleaned up in both cases.
    pub fn extract(
        &self,
        binary: &Path,
        header: &dyn HeaderInfo,
    ) -> Result<OutputModel, ExtractError> {
        let span = tracing::info_span!("extract", tool = self.tool.name(), binary = %binary.display());
        let _enter = span.enter();
        tracing::info!(format = %header.format_kind(), subtype = %header.subtype(), "extraction started");

        let mut stage = Stage::Init;
        let result = self.run_stages(binary, header, &mut stage);
        match &result {
            Ok(model) => tracing::info!(
                instructions = model.instructions.len(),
                blocks = model.original_blocks.len(),
                elapsed = model.meta.elapsed_time,
                "extraction finished"
            ),
            Err(e) => {
                tracing::warn!(stage = ?stage, error = %e, "extraction aborted");
                advance(&mut stage, Stage::Aborted);
            }
        }
        result
    }

    /// Extract from in-memory bytes by first writing them to a temporary file.
    pub fn extract_bytes(
        &self,
        name: &str,
        data: &[u8],
        header: &dyn HeaderInfo,
    ) -> Result<OutputModel, ExtractError> {
        let input = materialize(&self.config.scratch_dir.join("inputs"), name, data)?;
        let result = self.extract(&input, header);
        let input_path = input.to_path_buf();
        if let Err(e) = input.close() {
            tracing::warn!(path = %input_path.display(), error = %e, "failed to remove materialized input");
        }
        result
    }

    fn run_stages(
        &self,
        binary: &Path,
        header: &dyn HeaderInfo,
        stage: &mut Stage,
    ) -> Result<OutputModel, ExtractError> {
        if !header.known_format() {
            tracing::info!("file is of unknown format, skipping {}", self.tool.name());
            return Err(ExtractError::UnknownFormat { tool: self.tool.name().to_string() });
        }

        let scratch = RunScratch::create(
            &self.config.scratch_dir,
            self.tool.name(),
            self.config.isolate_runs,
            self.config.cleanup,
        )?;
        let layout = scratch.layout();

        advance(stage, Stage::ToolInvoked);
        let started = Instant::now();
        let run = self.tool.run(binary, layout)?;
        let elapsed = started.elapsed();
        tracing::debug!(output = %run.output, "tool output");

        for facts in [&layout.instruction_facts, &layout.block_facts] {
            if !facts.is_file() {
                return Err(ExtractError::MissingFacts(facts.clone()));
            }
        }
        advance(stage, Stage::FactsLocated);

        let space = AddressSpace::for_header(header);
        tracing::debug!(space = ?space, format = %header.format_kind(), subtype = %header.subtype(), "address space selected");
        let reconciled = reconcile_stages(
            &layout.instruction_facts,
            &layout.block_facts,
            &space,
            self.config.instruction_scope,
            stage,
        )?;

        let meta = ExtractionMeta {
            tool_name: self.tool.display_name().to_string(),
            tool_version: self.tool.version().unwrap_or_else(|| "unknown".to_string()),
            source_version: SOURCE_VERSION.to_string(),
            elapsed_time: elapsed.as_secs_f64(),
            extracted_at: Utc::now().to_rfc3339(),
        };
        advance(stage, Stage::Done);

        Ok(OutputModel {
            meta,
            instructions: reconciled.instructions,
            original_blocks: reconciled.original_blocks,
            data: BTreeMap::new(),
        })
    }
}
