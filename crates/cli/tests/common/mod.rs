#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

/// ELF64 with one 16-byte `.text` at file offset 0x40 mapped at `text_addr`.
pub fn minimal_elf(e_type: u16, text_addr: u64) -> Vec<u8> {
    let shstrtab: &[u8] = b"\0.text\0.shstrtab\0";
    let shoff: u64 = 0x68;
    let mut out = Vec::new();

    out.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&e_type.to_le_bytes());
    out.extend_from_slice(&62u16.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&text_addr.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&shoff.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for half in [64u16, 56, 0, 64, 3, 2] {
        out.extend_from_slice(&half.to_le_bytes());
    }

    out.extend_from_slice(&[0x90u8; 16]);
    out.extend_from_slice(shstrtab);
    out.resize(shoff as usize, 0);

    out.extend_from_slice(&[0u8; 64]);
    section(&mut out, [1, 1], [0x6, text_addr, 0x40, 16]);
    section(&mut out, [7, 3], [0, 0, 0x50, shstrtab.len() as u64]);
    out
}

fn section(out: &mut Vec<u8>, words: [u32; 2], quads: [u64; 4]) {
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    for q in quads {
        out.extend_from_slice(&q.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 8]); // sh_link, sh_info
    out.extend_from_slice(&1u64.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
}

pub fn write_file(dir: &Path, name: &str, data: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).expect("write fixture");
    path
}

/// Write an executable shell script and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = write_file(dir, name, format!("#!/bin/sh\n{body}\n"));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}
