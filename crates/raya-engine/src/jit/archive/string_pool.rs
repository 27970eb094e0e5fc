//! Deduplicated pool of strings referenced by relocations and interned
//! string metadata.
//!
//! Store side dedupes by value in an index map (the upstream archive this
//! format generalizes deduplicates pointer identity; Raya's `Relocation`
//! payloads carry owned `String`s, not interned `const char*`, so value
//! equality is the correct notion of "the same string" here — see
//! DESIGN.md). Load side carves `&str` views directly out of the load
//! buffer; no copy, no allocation.

use rustc_hash::FxHashMap;

use super::error::{ArchiveError, ArchiveResult};
use super::io::{ArchiveReader, ArchiveWriter, LoadBuffer};

/// Hard cap on pool size; mirrors the upstream archive's small, cache-resident
/// table of interned strings.
pub const MAX_STRING_POOL: usize = 256;

/// Store-side string pool: append-only, deduplicated by value.
#[derive(Default)]
pub struct StringPoolBuilder {
    strings: Vec<String>,
    index: FxHashMap<String, u32>,
}

impl StringPoolBuilder {
    pub fn new() -> Self {
        StringPoolBuilder::default()
    }

    /// Insert `s` if not already present and return its pool index. Returns
    /// `None` once the pool is full.
    pub fn intern(&mut self, s: &str) -> Option<u32> {
        if let Some(&idx) = self.index.get(s) {
            return Some(idx);
        }
        if self.strings.len() >= MAX_STRING_POOL {
            return None;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        Some(idx)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Encode as `u32[count]` sizes followed by concatenated NUL-terminated
    /// UTF-8 bytes, per the file layout in SPEC_FULL.md §6.
    pub fn encode(&self, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
        for s in &self.strings {
            writer.emit_u32(s.len() as u32 + 1)?;
        }
        for s in &self.strings {
            writer.emit_bytes(s.as_bytes())?;
            writer.emit_u8(0)?;
        }
        Ok(())
    }
}

/// Read-only view into the string pool region of a loaded archive buffer.
/// Strings are borrowed `&str` slices with the archive's lifetime; never
/// copied.
pub struct StringPool<'a> {
    views: Vec<&'a str>,
}

impl<'a> StringPool<'a> {
    /// Parse `count` size-prefixed, NUL-terminated strings starting at
    /// `offset` within `buffer`.
    pub fn parse(buffer: &'a LoadBuffer, offset: u32, count: u32) -> ArchiveResult<Self> {
        let sizes_region = buffer.slice(offset as usize, count as usize * 4)?;
        let mut reader = ArchiveReader::new(sizes_region);
        let mut sizes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            sizes.push(reader.read_u32()? as usize);
        }

        let mut cursor = offset as usize + count as usize * 4;
        let mut views = Vec::with_capacity(count as usize);
        for size in sizes {
            let bytes = buffer.slice(cursor, size)?;
            let trimmed = bytes.strip_suffix(&[0]).unwrap_or(bytes);
            let s = std::str::from_utf8(trimmed)
                .map_err(|_| ArchiveError::MalformedEntry(cursor))?;
            views.push(s);
            cursor += size;
        }
        Ok(StringPool { views })
    }

    pub fn empty() -> Self {
        StringPool { views: Vec::new() }
    }

    pub fn get(&self, idx: u32) -> Option<&'a str> {
        self.views.get(idx as usize).copied()
    }

    pub fn find(&self, s: &str) -> Option<u32> {
        self.views.iter().position(|&v| v == s).map(|i| i as u32)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
