//! Block population: rebuilds each block's members by walking the
//! instruction table from the block start in instruction-size steps.

use std::collections::BTreeMap;

use crate::config::InstructionScope;
use crate::error::ExtractError;
use crate::facts::{BlockTable, InstructionTable};
use crate::model::{Block, BlockMember};

/// Populate every block in `blocks` from `instructions`.
///
/// Each walk must land on a known instruction at every step; a miss means the
/// two tables disagree and the whole result is rejected.
pub fn populate_blocks(
    blocks: &BlockTable,
    instructions: &InstructionTable,
) -> Result<BTreeMap<u64, Block>, ExtractError> {
    blocks
        .iter()
        .map(|(start, size)| populate_block(start, size, instructions).map(|b| (start, b)))
        .collect()
}

fn populate_block(
    start: u64,
    size: u64,
    instructions: &InstructionTable,
) -> Result<Block, ExtractError> {
    let end = start.saturating_add(size);
    let mut members = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let insn = instructions
            .get(cursor)
            .ok_or(ExtractError::ReconciliationGap { block: start, address: cursor })?;
        members.push(BlockMember::new(cursor, insn.text.clone()));
        // Parsed sizes are non-zero; hand-built tables may not be.
        cursor = cursor.saturating_add(insn.size.max(1));
    }
    if cursor != end {
        tracing::debug!(block = start, size, overshoot = cursor - end, "block walk overran end");
    }
    Ok(Block { start, members })
}

/// Instruction listing for the output model.
pub fn instruction_listing(
    scope: InstructionScope,
    blocks: &BTreeMap<u64, Block>,
    instructions: &InstructionTable,
) -> BTreeMap<u64, String> {
    match scope {
        InstructionScope::Cfg => blocks
            .values()
            .flat_map(|b| b.members.iter())
            .map(|m| (m.address, m.text.clone()))
            .collect(),
        InstructionScope::Exhaustive => {
            instructions.iter().map(|(addr, fact)| (addr, fact.text.clone())).collect()
        }
    }
}
