use anyhow::Result;

use ddfacts_core::{AddressSpace, BinaryHeader, HeaderInfo};

use crate::canonicalize_or_current;

/// Show how a binary's header is classified and which address space applies.
pub fn header_command(binary: &str, json: bool) -> Result<()> {
    let path = canonicalize_or_current(binary)?;
    let header = BinaryHeader::from_path(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&header)?);
        return Ok(());
    }

    let space = AddressSpace::for_header(&header);
    println!("Binary: {}", path.display());
    println!("  Format: {}", header.format_kind());
    println!("  Known format: {}", header.known_format());
    println!("  Subtype: {}", header.subtype());
    println!("  Address space: {:?}", space);
    if header.sections.is_empty() {
        println!("  Sections: (none)");
    } else {
        println!("  Sections:");
        for s in &header.sections {
            println!(
                "    - {:<16} vaddr 0x{:x} size 0x{:x} offset 0x{:x}",
                s.name, s.address, s.size, s.offset
            );
        }
    }
    Ok(())
}
