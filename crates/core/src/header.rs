//! Binary header classification and virtual-address to file-offset mapping.
//!
//! The extractor only needs three things from a header: whether the format is
//! recognized at all, whether an ELF is position independent, and how to map a
//! virtual address back to the on-disk layout. `HeaderInfo` is that seam;
//! `BinaryHeader` is the goblin-backed implementation.

use std::fmt;
use std::fs;
use std::path::Path;

use goblin::{elf, mach, pe, Object};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Container format of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatKind {
    Elf,
    Pe,
    MachO,
    Unknown,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatKind::Elf => "ELF",
            FormatKind::Pe => "PE",
            FormatKind::MachO => "MachO",
            FormatKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Object subtype, named the way `readelf` reports `e_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    SharedObject,
    Executable,
    Relocatable,
    Core,
    Unknown,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::SharedObject => "Shared object file",
            ObjectKind::Executable => "Executable file",
            ObjectKind::Relocatable => "Relocatable file",
            ObjectKind::Core => "Core file",
            ObjectKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Header capability consumed by the extractor.
pub trait HeaderInfo {
    fn known_format(&self) -> bool;
    fn format_kind(&self) -> FormatKind;
    fn subtype(&self) -> ObjectKind;
    /// File offset backing `vaddr`, or `None` when no mapped section covers it.
    fn to_file_offset(&self, vaddr: u64) -> Option<u64>;
}

/// A loaded region with both its virtual and on-disk placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMapping {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub offset: u64,
}

impl SectionMapping {
    fn contains(&self, vaddr: u64) -> bool {
        vaddr >= self.address && vaddr - self.address < self.size
    }
}

/// Parsed header summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryHeader {
    pub format: FormatKind,
    pub kind: ObjectKind,
    pub is_64: bool,
    pub entry: Option<u64>,
    pub sections: Vec<SectionMapping>,
}

impl BinaryHeader {
    /// Header for data that no parser recognized.
    pub fn unknown() -> Self {
        Self {
            format: FormatKind::Unknown,
            kind: ObjectKind::Unknown,
            is_64: false,
            entry: None,
            sections: Vec::new(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let bytes = fs::read(path)
            .map_err(|e| ExtractError::Header(format!("failed to read {}: {e}", path.display())))?;
        Ok(Self::parse(&bytes))
    }

    /// Classify `bytes`. Anything goblin cannot parse is reported as unknown.
    pub fn parse(bytes: &[u8]) -> Self {
        match Object::parse(bytes) {
            Ok(Object::Elf(elf)) => from_elf(&elf),
            Ok(Object::PE(pe)) => from_pe(&pe),
            Ok(Object::Mach(mach::Mach::Binary(bin))) => from_macho(&bin),
            Ok(Object::Mach(mach::Mach::Fat(_))) => Self {
                format: FormatKind::MachO,
                kind: ObjectKind::Unknown,
                is_64: false,
                entry: None,
                sections: Vec::new(),
            },
            _ => Self::unknown(),
        }
    }
}

impl HeaderInfo for BinaryHeader {
    fn known_format(&self) -> bool {
        self.format != FormatKind::Unknown
    }

    fn format_kind(&self) -> FormatKind {
        self.format
    }

    fn subtype(&self) -> ObjectKind {
        self.kind
    }

    fn to_file_offset(&self, vaddr: u64) -> Option<u64> {
        self.sections
            .iter()
            .find(|s| s.contains(vaddr))
            .and_then(|s| s.offset.checked_add(vaddr - s.address))
    }
}

fn from_elf(elf: &elf::Elf) -> BinaryHeader {
    let kind = match elf.header.e_type {
        elf::header::ET_DYN => ObjectKind::SharedObject,
        elf::header::ET_EXEC => ObjectKind::Executable,
        elf::header::ET_REL => ObjectKind::Relocatable,
        elf::header::ET_CORE => ObjectKind::Core,
        _ => ObjectKind::Unknown,
    };

    // Only allocated sections with file-backed bytes take part in the mapping.
    let sections = elf
        .section_headers
        .iter()
        .filter(|sh| {
            sh.sh_flags & u64::from(elf::section_header::SHF_ALLOC) != 0
                && sh.sh_type != elf::section_header::SHT_NOBITS
                && sh.sh_size > 0
        })
        .map(|sh| SectionMapping {
            name: elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string(),
            address: sh.sh_addr,
            size: sh.sh_size,
            offset: sh.sh_offset,
        })
        .collect();

    BinaryHeader {
        format: FormatKind::Elf,
        kind,
        is_64: elf.is_64,
        entry: Some(elf.entry),
        sections,
    }
}

fn from_pe(pe: &pe::PE) -> BinaryHeader {
    let image_base = pe.image_base as u64;
    let sections = pe
        .sections
        .iter()
        .filter_map(|sect| {
            let address = image_base.checked_add(u64::from(sect.virtual_address))?;
            Some(SectionMapping {
                name: sect.name().unwrap_or("").to_string(),
                address,
                size: u64::from(sect.virtual_size),
                offset: u64::from(sect.pointer_to_raw_data),
            })
        })
        .collect();

    BinaryHeader {
        format: FormatKind::Pe,
        kind: if pe.is_lib { ObjectKind::SharedObject } else { ObjectKind::Executable },
        is_64: pe.is_64,
        entry: image_base.checked_add(pe.entry as u64),
        sections,
    }
}

fn from_macho(bin: &mach::MachO) -> BinaryHeader {
    let kind = match bin.header.filetype {
        mach::header::MH_EXECUTE => ObjectKind::Executable,
        mach::header::MH_DYLIB | mach::header::MH_BUNDLE => ObjectKind::SharedObject,
        mach::header::MH_OBJECT => ObjectKind::Relocatable,
        mach::header::MH_CORE => ObjectKind::Core,
        _ => ObjectKind::Unknown,
    };

    let sections = bin
        .segments
        .sections()
        .flatten()
        .filter_map(Result::ok)
        .filter(|(sec, _)| sec.size > 0 && sec.offset > 0)
        .map(|(sec, _)| SectionMapping {
            name: sec.name().unwrap_or("").to_string(),
            address: sec.addr,
            size: sec.size,
            offset: u64::from(sec.offset),
        })
        .collect();

    BinaryHeader {
        format: FormatKind::MachO,
        kind,
        is_64: bin.is_64,
        entry: Some(bin.entry),
        sections,
    }
}
