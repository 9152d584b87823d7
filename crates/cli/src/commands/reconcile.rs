use anyhow::{Context, Result};

use ddfacts_core::{reconcile_fact_files, AddressSpace, BinaryHeader, InstructionScope};

use crate::canonicalize_or_current;
use crate::commands::emit_json;

/// Reconcile fact files produced by an earlier ddisasm run.
///
/// Without `--binary` the facts are taken to be in the file-offset domain
/// already.
pub fn reconcile_command(
    instructions: &str,
    blocks: &str,
    binary: Option<&str>,
    exhaustive: bool,
    out: Option<&str>,
) -> Result<()> {
    let header = match binary {
        Some(b) => BinaryHeader::from_path(&canonicalize_or_current(b)?)?,
        None => BinaryHeader::unknown(),
    };
    let space = AddressSpace::for_header(&header);
    let scope = if exhaustive { InstructionScope::Exhaustive } else { InstructionScope::Cfg };

    let instructions_path = canonicalize_or_current(instructions)?;
    let blocks_path = canonicalize_or_current(blocks)?;
    let reconciled = reconcile_fact_files(&instructions_path, &blocks_path, &space, scope)
        .with_context(|| {
            format!(
                "Failed to reconcile {} with {}",
                instructions_path.display(),
                blocks_path.display()
            )
        })?;

    emit_json(&reconciled, out)
}
