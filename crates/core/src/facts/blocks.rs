use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::address::AddressSpace;
use crate::error::ExtractError;

use super::{for_each_row, open_facts, parse_int};

/// Block boundaries keyed by normalized start address, valued by byte size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTable {
    entries: BTreeMap<u64, u64>,
}

impl BlockTable {
    pub fn from_path(path: &Path, space: &AddressSpace<'_>) -> Result<Self, ExtractError> {
        Self::parse(open_facts(path)?, path, space)
    }

    /// Parse `address \t size \t ...` rows; trailing columns are ignored.
    pub fn parse<R: Read>(
        reader: R,
        source: &Path,
        space: &AddressSpace<'_>,
    ) -> Result<Self, ExtractError> {
        let mut entries = BTreeMap::new();
        for_each_row(reader, source, |line, record| {
            let vaddr = parse_int(record, 0, "address", source, line)?;
            let size = parse_int(record, 1, "size", source, line)?;
            entries.insert(space.normalize(vaddr)?, size);
            Ok(())
        })?;
        Ok(Self { entries })
    }

    pub fn size_of(&self, start: u64) -> Option<u64> {
        self.entries.get(&start).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.entries.iter().map(|(start, size)| (*start, *size))
    }
}

impl FromIterator<(u64, u64)> for BlockTable {
    fn from_iter<I: IntoIterator<Item = (u64, u64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
