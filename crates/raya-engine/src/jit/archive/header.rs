//! Versioned archive header and the append-only entry catalog.

use super::error::{ArchiveError, ArchiveResult};
use super::io::{ArchiveReader, ArchiveWriter};

/// On-disk format version. Bumping this is a breaking change; a mismatched
/// header causes the archive to be treated as absent rather than failing the
/// process (see `mod.rs::SharedCodeArchive::open_read`).
pub const FORMAT_VERSION: u32 = 1;

/// Fixed byte size of [`Header`] on disk.
pub const HEADER_SIZE: usize = 6 * 4;

/// Versioned header at offset 0 of the archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub entries_count: u32,
    pub total_size: u32,
    pub entries_offset: u32,
    pub strings_count: u32,
    pub strings_offset: u32,
}

impl Header {
    pub fn encode(&self, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
        writer.emit_u32(self.version)?;
        writer.emit_u32(self.entries_count)?;
        writer.emit_u32(self.total_size)?;
        writer.emit_u32(self.entries_offset)?;
        writer.emit_u32(self.strings_count)?;
        writer.emit_u32(self.strings_offset)
    }

    pub fn decode(bytes: &[u8]) -> ArchiveResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArchiveError::OutOfBounds { offset: 0, size: bytes.len() });
        }
        let mut r = ArchiveReader::new(&bytes[..HEADER_SIZE]);
        Ok(Header {
            version: r.read_u32()?,
            entries_count: r.read_u32()?,
            total_size: r.read_u32()?,
            entries_offset: r.read_u32()?,
            strings_count: r.read_u32()?,
            strings_offset: r.read_u32()?,
        })
    }
}

/// Kind of artifact an [`Entry`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Reserved; never emitted by this implementation.
    None,
    /// A trampoline stub (`jit::runtime::trampoline`).
    Stub,
    /// The single exception/deopt blob.
    Blob,
    /// A compiled function (`ExecutableCode`).
    Code,
}

impl EntryKind {
    pub fn to_u32(self) -> u32 {
        match self {
            EntryKind::None => 0,
            EntryKind::Stub => 1,
            EntryKind::Blob => 2,
            EntryKind::Code => 3,
        }
    }

    pub fn from_u32(value: u32) -> ArchiveResult<Self> {
        match value {
            0 => Ok(EntryKind::None),
            1 => Ok(EntryKind::Stub),
            2 => Ok(EntryKind::Blob),
            3 => Ok(EntryKind::Code),
            _ => Err(ArchiveError::MalformedEntry(value as usize)),
        }
    }
}

/// Sentinel id for the single supported exception/deopt blob. Only one blob
/// kind is supported today; widening the id space (rather than `EntryKind`)
/// is the extension point if more are needed later.
pub const BLOB_ID: u32 = 999;

/// Fixed byte size of one [`Entry`] record on disk.
pub const ENTRY_SIZE: usize = 13 * 4;

/// Immutable positional record describing one archived artifact.
///
/// `idx` always equals the entry's position in the catalog array — this is
/// an invariant maintained by [`EntryCatalog::push`], never by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub kind: EntryKind,
    pub id: u32,
    pub idx: u32,
    pub offset: u32,
    pub size: u32,
    pub name_offset: u32,
    pub name_size: u32,
    pub code_offset: u32,
    pub code_size: u32,
    pub reloc_offset: u32,
    pub reloc_size: u32,
    pub decompile: u32,
    pub not_entrant: bool,
}

impl Entry {
    pub fn encode(&self, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
        writer.emit_u32(self.offset)?;
        writer.emit_u32(self.size)?;
        writer.emit_u32(self.name_offset)?;
        writer.emit_u32(self.name_size)?;
        writer.emit_u32(self.code_offset)?;
        writer.emit_u32(self.code_size)?;
        writer.emit_u32(self.reloc_offset)?;
        writer.emit_u32(self.reloc_size)?;
        writer.emit_u32(self.kind.to_u32())?;
        writer.emit_u32(self.id)?;
        writer.emit_u32(self.idx)?;
        writer.emit_u32(self.decompile)?;
        writer.emit_u32(self.not_entrant as u32)
    }

    pub fn decode(reader: &mut ArchiveReader) -> ArchiveResult<Self> {
        let offset = reader.read_u32()?;
        let size = reader.read_u32()?;
        let name_offset = reader.read_u32()?;
        let name_size = reader.read_u32()?;
        let code_offset = reader.read_u32()?;
        let code_size = reader.read_u32()?;
        let reloc_offset = reader.read_u32()?;
        let reloc_size = reader.read_u32()?;
        let kind = EntryKind::from_u32(reader.read_u32()?)?;
        let id = reader.read_u32()?;
        let idx = reader.read_u32()?;
        let decompile = reader.read_u32()?;
        let not_entrant = reader.read_u32()? != 0;
        Ok(Entry {
            kind,
            id,
            idx,
            offset,
            size,
            name_offset,
            name_size,
            code_offset,
            code_size,
            reloc_offset,
            reloc_size,
            decompile,
            not_entrant,
        })
    }

    /// Validate that every block this entry names lies within `[offset, offset + size)`,
    /// which must itself lie within `[0, total_size)`.
    pub fn validate(&self, total_size: u32) -> ArchiveResult<()> {
        let entry_end = self.offset.checked_add(self.size).ok_or(ArchiveError::MalformedEntry(self.idx as usize))?;
        if entry_end > total_size {
            return Err(ArchiveError::MalformedEntry(self.idx as usize));
        }
        let blocks = [
            (self.name_offset, self.name_size),
            (self.code_offset, self.code_size),
            (self.reloc_offset, self.reloc_size),
        ];
        for (block_offset, block_size) in blocks {
            if block_size == 0 {
                continue;
            }
            let block_end = block_offset
                .checked_add(block_size)
                .ok_or(ArchiveError::MalformedEntry(self.idx as usize))?;
            if block_offset < self.offset || block_end > entry_end {
                return Err(ArchiveError::MalformedEntry(self.idx as usize));
            }
        }
        Ok(())
    }
}

/// Append-only, in-memory list of entries accumulated during write and
/// flushed (aligned) at close; on read, the entry table is simply the
/// on-disk array viewed in place.
#[derive(Default)]
pub struct EntryCatalog {
    entries: Vec<Entry>,
}

impl EntryCatalog {
    pub fn new() -> Self {
        EntryCatalog::default()
    }

    /// Append an entry, assigning its `idx` to its array position.
    pub fn push(&mut self, mut entry: Entry) -> u32 {
        let idx = self.entries.len() as u32;
        entry.idx = idx;
        self.entries.push(entry);
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Entry> {
        self.entries.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Entry> {
        self.entries.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Linear scan for the most specific match; archives top out at a few
    /// thousand entries (this is the JIT's own stub/blob/function
    /// population, not a general-purpose code corpus), so a binary search
    /// index isn't worth the complexity.
    ///
    /// For `kind == Code`, `decompile` must also match and `not_entrant`
    /// entries are skipped.
    pub fn find(&self, kind: EntryKind, id: u32, decompile: Option<u32>) -> Option<&Entry> {
        self.entries.iter().find(|e| {
            if e.kind != kind || e.id != id {
                return false;
            }
            if kind == EntryKind::Code {
                if e.not_entrant {
                    return false;
                }
                if let Some(decompile) = decompile {
                    if e.decompile != decompile {
                        return false;
                    }
                }
            }
            true
        })
    }

    pub fn encode_all(&self, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
        for entry in &self.entries {
            entry.encode(writer)?;
        }
        Ok(())
    }

    pub fn decode_all(bytes: &[u8], count: u32) -> ArchiveResult<Self> {
        let mut reader = ArchiveReader::new(bytes);
        let mut entries = Vec::with_capacity(count as usize);
        for expected_idx in 0..count {
            let entry = Entry::decode(&mut reader)?;
            if entry.idx != expected_idx {
                return Err(ArchiveError::MalformedEntry(expected_idx as usize));
            }
            entries.push(entry);
        }
        Ok(EntryCatalog { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_entry(kind: EntryKind, id: u32, decompile: u32, not_entrant: bool) -> Entry {
        Entry {
            kind,
            id,
            idx: 0,
            offset: 0,
            size: 16,
            name_offset: 0,
            name_size: 4,
            code_offset: 4,
            code_size: 8,
            reloc_offset: 12,
            reloc_size: 4,
            decompile,
            not_entrant,
        }
    }

    #[test]
    fn push_assigns_sequential_idx() {
        let mut cat = EntryCatalog::new();
        let i0 = cat.push(dummy_entry(EntryKind::Stub, 1, 0, false));
        let i1 = cat.push(dummy_entry(EntryKind::Stub, 2, 0, false));
        assert_eq!(i0, 0);
        assert_eq!(i1, 1);
        assert_eq!(cat.get(0).unwrap().idx, 0);
        assert_eq!(cat.get(1).unwrap().idx, 1);
    }

    #[test]
    fn find_skips_not_entrant_code() {
        let mut cat = EntryCatalog::new();
        cat.push(dummy_entry(EntryKind::Code, 42, 0, true));
        assert!(cat.find(EntryKind::Code, 42, Some(0)).is_none());
    }

    #[test]
    fn find_keys_code_by_decompile_generation() {
        let mut cat = EntryCatalog::new();
        cat.push(dummy_entry(EntryKind::Code, 42, 0, false));
        cat.push(dummy_entry(EntryKind::Code, 42, 1, false));
        assert_eq!(cat.find(EntryKind::Code, 42, Some(0)).unwrap().decompile, 0);
        assert_eq!(cat.find(EntryKind::Code, 42, Some(1)).unwrap().decompile, 1);
    }

    #[test]
    fn header_roundtrip() {
        let header = Header {
            version: FORMAT_VERSION,
            entries_count: 3,
            total_size: 1024,
            entries_offset: 512,
            strings_count: 2,
            strings_offset: 900,
        };
        let mut store = super::super::io::StoreBuffer::new(64);
        {
            let mut w = ArchiveWriter::new(&mut store);
            header.encode(&mut w).unwrap();
        }
        let bytes = store.into_bytes();
        let decoded = Header::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn entry_validate_rejects_block_outside_entry_bounds() {
        let mut entry = dummy_entry(EntryKind::Stub, 1, 0, false);
        entry.code_offset = 100; // outside [offset, offset+size)
        assert!(entry.validate(1024).is_err());
    }

    #[test]
    fn entry_validate_rejects_entry_outside_total_size() {
        let entry = dummy_entry(EntryKind::Stub, 1, 0, false);
        assert!(entry.validate(8).is_err());
    }
}
