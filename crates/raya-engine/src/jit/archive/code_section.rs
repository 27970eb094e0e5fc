//! Encode/decode of the N parallel code sections that make up one stored
//! `ExecutableCode` or blob: original base address, size, and raw bytes.
//!
//! JIT output from `jit::backend::cranelift` typically has just the one
//! function-body section; the format supports up to [`MAX_CODE_SECTIONS`] so
//! a future Cranelift configuration that splits out a constant-pool or
//! unwind-info section doesn't require a format break.

use super::error::{ArchiveError, ArchiveResult};
use super::io::{ArchiveReader, ArchiveWriter};

/// Upper bound on sections per code block.
pub const MAX_CODE_SECTIONS: usize = 3;

/// One section as handed to the store path: its address at compile time
/// (used only to compute inter-section deltas on load) and its bytes.
#[derive(Debug, Clone)]
pub struct CodeSection<'a> {
    pub origin_address: usize,
    pub bytes: &'a [u8],
}

/// One section as materialized on load: the origin address it was compiled
/// at (kept to reconstruct a "fake original buffer" for relocation fix-up)
/// and a borrowed view of its bytes within the load buffer.
#[derive(Debug, Clone)]
pub struct DecodedSection<'a> {
    pub origin_address: usize,
    pub bytes: &'a [u8],
}

/// Fixed size of one section header record: `{size: u32, origin_address: u64,
/// offset_within_entry: u32}`.
const SECTION_HEADER_SIZE: usize = 4 + 8 + 4;

/// Encode `sections` (in order) as a header-of-sections array — `{size,
/// origin_address, offset_within_entry}` per section, per SPEC_FULL.md §4.6 —
/// followed by aligned content blocks, one per non-empty section.
///
/// `offset_within_entry` is recorded relative to the start of *this
/// function's own content region* (right after the header array), not to the
/// absolute position in the archive buffer. That's the detail that makes this
/// format self-describing: `store_code_entry` (store.rs) writes stack maps
/// and deopt info ahead of this block, so the content region rarely starts on
/// an aligned absolute offset, but the relative offset recorded here is
/// exactly what [`decode`] needs to find each section without re-deriving
/// alignment against a base it doesn't know.
pub fn encode(writer: &mut ArchiveWriter, sections: &[CodeSection]) -> ArchiveResult<()> {
    debug_assert!(sections.len() <= MAX_CODE_SECTIONS);

    let header_size = 4 + sections.len() * SECTION_HEADER_SIZE;
    let content_base = writer.offset() + header_size;
    let mut content_offsets = Vec::with_capacity(sections.len());
    let mut cursor = content_base;
    for section in sections {
        if section.bytes.is_empty() {
            content_offsets.push(0u32);
            continue;
        }
        cursor = super::io::align_up(cursor);
        content_offsets.push((cursor - content_base) as u32);
        cursor += section.bytes.len();
    }

    writer.emit_u32(sections.len() as u32)?;
    for (section, offset) in sections.iter().zip(content_offsets.iter()) {
        writer.emit_u32(section.bytes.len() as u32)?;
        writer.emit_u64(section.origin_address as u64)?;
        writer.emit_u32(*offset)?;
    }
    debug_assert_eq!(writer.offset(), content_base);

    for (section, offset) in sections.iter().zip(content_offsets.iter()) {
        if section.bytes.is_empty() {
            continue;
        }
        while writer.offset() < content_base + *offset as usize {
            writer.emit_u8(0)?;
        }
        writer.emit_bytes(section.bytes)?;
    }
    Ok(())
}

/// Decode a code-sections block from `bytes` (the entry's `code_offset
/// .. code_offset + code_size` slice, or — when a code block carries stack
/// maps/deopt info ahead of the sections, as `store_code_entry` does — the
/// sub-slice starting right after that prefix).
pub fn decode(bytes: &[u8]) -> ArchiveResult<Vec<DecodedSection>> {
    let mut reader = ArchiveReader::new(bytes);
    let count = reader.read_u32()? as usize;
    let mut headers = Vec::with_capacity(count);
    for _ in 0..count {
        let size = reader.read_u32()? as usize;
        let origin = reader.read_u64()? as usize;
        let offset_within_entry = reader.read_u32()? as usize;
        headers.push((size, origin, offset_within_entry));
    }

    let content_base = reader.position();
    let mut sections = Vec::with_capacity(count);
    for (size, origin_address, offset_within_entry) in headers {
        if size == 0 {
            sections.push(DecodedSection { origin_address, bytes: &[] });
            continue;
        }
        let start = content_base + offset_within_entry;
        let end = start
            .checked_add(size)
            .ok_or(ArchiveError::OutOfBounds { offset: start, size: bytes.len() })?;
        let section_bytes = bytes
            .get(start..end)
            .ok_or(ArchiveError::OutOfBounds { offset: start, size: bytes.len() })?;
        sections.push(DecodedSection { origin_address, bytes: section_bytes });
    }
    Ok(sections)
}
