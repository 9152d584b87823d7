use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::address::AddressSpace;
use crate::error::ExtractError;

use super::{for_each_row, open_facts, parse_int};

/// One decoded instruction from the exhaustive table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionFact {
    /// Mnemonic and operand text joined by a single space.
    pub text: String,
    pub size: u64,
}

impl InstructionFact {
    pub fn new(text: impl Into<String>, size: u64) -> Self {
        Self { text: text.into(), size }
    }
}

/// Exhaustive instruction table keyed by normalized address.
///
/// Later lines overwrite earlier ones that normalize to the same address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionTable {
    entries: BTreeMap<u64, InstructionFact>,
}

impl InstructionTable {
    pub fn from_path(path: &Path, space: &AddressSpace<'_>) -> Result<Self, ExtractError> {
        Self::parse(open_facts(path)?, path, space)
    }

    /// Parse `address \t size \t mnemonic \t operands ...` rows.
    pub fn parse<R: Read>(
        reader: R,
        source: &Path,
        space: &AddressSpace<'_>,
    ) -> Result<Self, ExtractError> {
        let mut entries = BTreeMap::new();
        for_each_row(reader, source, |line, record| {
            let vaddr = parse_int(record, 0, "address", source, line)?;
            let size = parse_int(record, 1, "size", source, line)?;
            if size == 0 {
                return Err(ExtractError::FactFormat {
                    path: source.to_path_buf(),
                    line,
                    message: format!("instruction at {vaddr} has zero size"),
                });
            }
            let mnemonic = record.get(2).unwrap_or("");
            let text = match record.get(3) {
                Some(operands) if !operands.is_empty() => format!("{mnemonic} {operands}"),
                _ => mnemonic.to_string(),
            };
            entries.insert(space.normalize(vaddr)?, InstructionFact { text, size });
            Ok(())
        })?;
        Ok(Self { entries })
    }

    pub fn get(&self, address: u64) -> Option<&InstructionFact> {
        self.entries.get(&address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &InstructionFact)> + '_ {
        self.entries.iter().map(|(addr, fact)| (*addr, fact))
    }
}

impl FromIterator<(u64, InstructionFact)> for InstructionTable {
    fn from_iter<I: IntoIterator<Item = (u64, InstructionFact)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
