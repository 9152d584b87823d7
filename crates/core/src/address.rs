//! Translation from the fact tables' virtual addresses to file offsets.

use crate::error::ExtractError;
use crate::header::{FormatKind, HeaderInfo, ObjectKind};

/// Addressing domain the facts are translated through.
///
/// ddisasm does not rebase position-independent ELF objects, so their virtual
/// addresses already are file offsets. Fixed-base ELF executables need the
/// header's section mapping. Every other format passes through untouched.
#[derive(Clone, Copy)]
pub enum AddressSpace<'h> {
    Identity,
    OffsetTranslated(&'h dyn HeaderInfo),
}

impl<'h> AddressSpace<'h> {
    pub fn for_header(header: &'h dyn HeaderInfo) -> Self {
        match (header.format_kind(), header.subtype()) {
            (FormatKind::Elf, ObjectKind::SharedObject) => AddressSpace::Identity,
            (FormatKind::Elf, _) => AddressSpace::OffsetTranslated(header),
            _ => AddressSpace::Identity,
        }
    }

    pub fn normalize(&self, vaddr: u64) -> Result<u64, ExtractError> {
        match self {
            AddressSpace::Identity => Ok(vaddr),
            AddressSpace::OffsetTranslated(header) => {
                header.to_file_offset(vaddr).ok_or(ExtractError::UnmappedAddress(vaddr))
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, AddressSpace::Identity)
    }
}

impl std::fmt::Debug for AddressSpace<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressSpace::Identity => f.write_str("Identity"),
            AddressSpace::OffsetTranslated(_) => f.write_str("OffsetTranslated"),
        }
    }
}
