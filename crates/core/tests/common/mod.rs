#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use ddfacts_core::header::SectionMapping;
use ddfacts_core::{
    BinaryHeader, DisassemblerTool, ExtractError, FormatKind, ObjectKind, ScratchLayout, ToolRun,
};

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

/// Smallest ELF64 image goblin accepts: header, a 16-byte `.text` at file
/// offset 0x40 mapped at `text_addr`, and a section name table.
pub fn minimal_elf(e_type: u16, text_addr: u64) -> Vec<u8> {
    let shstrtab: &[u8] = b"\0.text\0.shstrtab\0";
    let shoff: u64 = 0x68;
    let mut out = Vec::new();

    out.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&e_type.to_le_bytes());
    out.extend_from_slice(&62u16.to_le_bytes()); // EM_X86_64
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&text_addr.to_le_bytes()); // e_entry
    out.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
    out.extend_from_slice(&shoff.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&64u16.to_le_bytes()); // e_ehsize
    out.extend_from_slice(&56u16.to_le_bytes()); // e_phentsize
    out.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&64u16.to_le_bytes()); // e_shentsize
    out.extend_from_slice(&3u16.to_le_bytes()); // e_shnum
    out.extend_from_slice(&2u16.to_le_bytes()); // e_shstrndx
    assert_eq!(out.len(), 0x40);

    out.extend_from_slice(&[0x90u8; 16]);
    out.extend_from_slice(shstrtab);
    out.resize(shoff as usize, 0);

    out.extend_from_slice(&[0u8; 64]);
    push_section(&mut out, 1, 1, 0x6, text_addr, 0x40, 16, 16);
    push_section(&mut out, 7, 3, 0, 0, 0x50, shstrtab.len() as u64, 1);
    out
}

#[allow(clippy::too_many_arguments)]
fn push_section(
    out: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    align: u64,
) {
    out.extend_from_slice(&name.to_le_bytes());
    out.extend_from_slice(&sh_type.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&addr.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&align.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
}

/// Overwrite `.text`'s `sh_offset` in an image built by `minimal_elf`.
pub fn with_text_offset(mut elf: Vec<u8>, offset: u64) -> Vec<u8> {
    // Section header 1 starts at 0xa8; sh_offset sits 24 bytes in.
    elf[0xc0..0xc8].copy_from_slice(&offset.to_le_bytes());
    elf
}

pub const IMAGE_FILE_DLL: u16 = 0x2000;

/// PE32+ image with one 16-byte `.text` at RVA 0x1000, file offset 0x200.
///
/// The entry point is the start of `.text`; there are no data directories.
pub fn minimal_pe(image_base: u64, characteristics: u16) -> Vec<u8> {
    let mut out = vec![0u8; 0x80];
    out[0..2].copy_from_slice(b"MZ");
    out[0x3c..0x40].copy_from_slice(&0x80u32.to_le_bytes());

    out.extend_from_slice(b"PE\0\0");
    out.extend_from_slice(&0x8664u16.to_le_bytes()); // machine
    out.extend_from_slice(&1u16.to_le_bytes()); // number_of_sections
    out.extend_from_slice(&[0u8; 12]); // timestamp, symbol table, symbol count
    out.extend_from_slice(&112u16.to_le_bytes()); // size_of_optional_header
    out.extend_from_slice(&(0x0022 | characteristics).to_le_bytes());

    // Standard fields.
    out.extend_from_slice(&0x20bu16.to_le_bytes());
    out.extend_from_slice(&[0u8; 2]);
    out.extend_from_slice(&0x10u32.to_le_bytes()); // size_of_code
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&0x1000u32.to_le_bytes()); // address_of_entry_point
    out.extend_from_slice(&0x1000u32.to_le_bytes()); // base_of_code

    // Windows fields.
    out.extend_from_slice(&image_base.to_le_bytes());
    out.extend_from_slice(&0x1000u32.to_le_bytes()); // section_alignment
    out.extend_from_slice(&0x200u32.to_le_bytes()); // file_alignment
    out.extend_from_slice(&[0u8; 16]); // versions, win32_version_value
    out.extend_from_slice(&0x2000u32.to_le_bytes()); // size_of_image
    out.extend_from_slice(&0x200u32.to_le_bytes()); // size_of_headers
    out.extend_from_slice(&0u32.to_le_bytes()); // check_sum
    out.extend_from_slice(&3u16.to_le_bytes()); // subsystem
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 32]); // stack and heap sizes
    out.extend_from_slice(&0u32.to_le_bytes()); // loader_flags
    out.extend_from_slice(&0u32.to_le_bytes()); // number_of_rva_and_sizes
    assert_eq!(out.len(), 0x108);

    out.extend_from_slice(b".text\0\0\0");
    out.extend_from_slice(&0x10u32.to_le_bytes()); // virtual_size
    out.extend_from_slice(&0x1000u32.to_le_bytes()); // virtual_address
    out.extend_from_slice(&0x10u32.to_le_bytes()); // size_of_raw_data
    out.extend_from_slice(&0x200u32.to_le_bytes()); // pointer_to_raw_data
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(&0x6000_0020u32.to_le_bytes());

    out.resize(0x200, 0);
    out.extend_from_slice(&[0xc3u8; 16]);
    out
}

pub const MH_EXECUTE: u32 = 0x2;
pub const MH_DYLIB: u32 = 0x6;

/// 64-bit Mach-O with one `__TEXT` segment holding a 16-byte `__text` at
/// 0x100000200 (file offset 0x200) and a zero-fill `__bss` with no file bytes.
pub fn minimal_macho(filetype: u32) -> Vec<u8> {
    let mut out = Vec::new();
    for word in [0xfeed_facfu32, 0x0100_0007, 3, filetype, 1, 72 + 2 * 80, 0, 0] {
        out.extend_from_slice(&word.to_le_bytes());
    }

    out.extend_from_slice(&0x19u32.to_le_bytes()); // LC_SEGMENT_64
    out.extend_from_slice(&(72u32 + 2 * 80).to_le_bytes());
    out.extend_from_slice(&name16("__TEXT"));
    for quad in [0x1_0000_0000u64, 0x2000, 0, 0x210] {
        out.extend_from_slice(&quad.to_le_bytes());
    }
    for word in [7u32, 5, 2, 0] {
        out.extend_from_slice(&word.to_le_bytes());
    }

    macho_section(&mut out, "__text", 0x1_0000_0200, 0x10, 0x200, 0x8000_0400);
    macho_section(&mut out, "__bss", 0x1_0000_1000, 0x100, 0, 0x1);

    out.resize(0x200, 0);
    out.extend_from_slice(&[0xc3u8; 16]);
    out
}

fn macho_section(out: &mut Vec<u8>, name: &str, addr: u64, size: u64, offset: u32, flags: u32) {
    out.extend_from_slice(&name16(name));
    out.extend_from_slice(&name16("__TEXT"));
    out.extend_from_slice(&addr.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    for word in [offset, 0, 0, 0, flags, 0, 0, 0] {
        out.extend_from_slice(&word.to_le_bytes());
    }
}

fn name16(name: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf
}

/// Fixed-base ELF executable whose `.text` at 0x401000 sits at file offset 0x1000.
pub fn exec_header() -> BinaryHeader {
    BinaryHeader {
        format: FormatKind::Elf,
        kind: ObjectKind::Executable,
        is_64: true,
        entry: Some(0x401000),
        sections: vec![SectionMapping {
            name: ".text".into(),
            address: 0x401000,
            size: 0x1000,
            offset: 0x1000,
        }],
    }
}

pub fn shared_object_header() -> BinaryHeader {
    BinaryHeader { kind: ObjectKind::SharedObject, ..exec_header() }
}

pub fn pe_header() -> BinaryHeader {
    BinaryHeader { format: FormatKind::Pe, ..exec_header() }
}

/// Stand-in disassembler that writes canned fact tables into the scratch dir.
pub struct CannedTool {
    pub instructions: String,
    pub blocks: String,
    pub last_scratch: RefCell<Option<ScratchLayout>>,
    pub calls: RefCell<usize>,
}

impl CannedTool {
    pub fn new(instructions: &str, blocks: &str) -> Self {
        Self {
            instructions: instructions.to_string(),
            blocks: blocks.to_string(),
            last_scratch: RefCell::new(None),
            calls: RefCell::new(0),
        }
    }

    pub fn scratch_binary_dir(&self) -> PathBuf {
        self.last_scratch.borrow().as_ref().expect("tool ran").binary_dir.clone()
    }
}

impl DisassemblerTool for CannedTool {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn version(&self) -> Option<String> {
        Some("canned 1.0".into())
    }

    fn run(&self, _binary: &Path, scratch: &ScratchLayout) -> Result<ToolRun, ExtractError> {
        *self.calls.borrow_mut() += 1;
        *self.last_scratch.borrow_mut() = Some(scratch.clone());
        fs::write(&scratch.instruction_facts, &self.instructions).unwrap();
        fs::write(&scratch.block_facts, &self.blocks).unwrap();
        fs::write(&scratch.cfg_json, "{}").unwrap();
        Ok(ToolRun { output: "canned run".into() })
    }
}

/// Stand-in disassembler that always exits non-zero.
pub struct FailingTool;

impl DisassemblerTool for FailingTool {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn version(&self) -> Option<String> {
        None
    }

    fn run(&self, _binary: &Path, _scratch: &ScratchLayout) -> Result<ToolRun, ExtractError> {
        Err(ExtractError::ToolFailure {
            tool: "failing".into(),
            code: Some(1),
            output: "boom".into(),
        })
    }
}

/// Write an executable shell script and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
