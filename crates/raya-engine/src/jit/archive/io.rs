//! Single contiguous load/store buffer plus the typed codec built on top.
//!
//! Mirrors `compiler::bytecode::encoder::{BytecodeWriter, BytecodeReader}`:
//! little-endian fixed-width ints, `u32`-length-prefixed byte/string
//! sequences, explicit bounds checks. The archive format additionally needs
//! alignment padding (`ARCHIVE_ALIGN`), which bytecode encoding does not.

use super::error::{ArchiveError, ArchiveResult};

/// Data alignment for code and debug-info blocks. Word-sized, matching the
/// 64-bit pointers `ExecutableCode` deals in.
pub const ARCHIVE_ALIGN: usize = 8;

/// Round `value` up to the next multiple of `ARCHIVE_ALIGN`.
pub fn align_up(value: usize) -> usize {
    (value + ARCHIVE_ALIGN - 1) & !(ARCHIVE_ALIGN - 1)
}

/// A size-capped staging buffer used while an archive is open for write.
///
/// `append` copies bytes in and advances the write cursor, failing with
/// [`ArchiveError::StoreCapacityExceeded`] if the reservation would be
/// exceeded. Nothing is written to disk until `into_bytes` is handed to the
/// file at close.
pub struct StoreBuffer {
    buffer: Vec<u8>,
    limit: usize,
}

impl StoreBuffer {
    pub fn new(reserved_store_size: usize) -> Self {
        StoreBuffer {
            buffer: Vec::with_capacity(reserved_store_size.min(1 << 20)),
            limit: reserved_store_size,
        }
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn append(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
        let needed = self.buffer.len() + bytes.len();
        if needed > self.limit {
            return Err(ArchiveError::StoreCapacityExceeded {
                needed,
                available: self.limit,
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Pad the write cursor up to `ARCHIVE_ALIGN`. Idempotent when already
    /// aligned.
    pub fn align_write(&mut self) -> ArchiveResult<()> {
        let target = align_up(self.buffer.len());
        let pad = target - self.buffer.len();
        if pad == 0 {
            return Ok(());
        }
        self.append(&vec![0u8; pad])
    }

    /// Discard everything written after `cursor`. Used to roll back a
    /// partially-written artifact on a per-artifact failure.
    pub fn truncate(&mut self, cursor: usize) {
        self.buffer.truncate(cursor);
    }

    /// Overwrite the first `bytes.len()` bytes already written. Used to
    /// rewrite the header in place at close, after its final offsets and
    /// counts are known.
    pub fn overwrite_prefix(&mut self, bytes: &[u8]) {
        self.buffer[..bytes.len()].copy_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// The whole archive file, preloaded into memory at open.
///
/// All subsequent reads are pointer arithmetic (bounds-checked slicing) over
/// this buffer; there is no further syscall traffic. This is the
/// preload-and-offset model the specification mandates — the sequential
/// `read`/`lseek` variant is not implemented.
pub struct LoadBuffer {
    buffer: Vec<u8>,
}

impl LoadBuffer {
    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        LoadBuffer { buffer }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn slice(&self, offset: usize, size: usize) -> ArchiveResult<&[u8]> {
        let end = offset
            .checked_add(size)
            .ok_or(ArchiveError::OutOfBounds { offset, size: self.buffer.len() })?;
        if end > self.buffer.len() {
            return Err(ArchiveError::OutOfBounds { offset, size: self.buffer.len() });
        }
        Ok(&self.buffer[offset..end])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

/// Typed encoder appending into a [`StoreBuffer`].
pub struct ArchiveWriter<'a> {
    pub(super) buf: &'a mut StoreBuffer,
}

impl<'a> ArchiveWriter<'a> {
    pub fn new(buf: &'a mut StoreBuffer) -> Self {
        ArchiveWriter { buf }
    }

    pub fn offset(&self) -> usize {
        self.buf.offset()
    }

    pub fn align(&mut self) -> ArchiveResult<()> {
        self.buf.align_write()
    }

    pub fn emit_u8(&mut self, value: u8) -> ArchiveResult<()> {
        self.buf.append(&[value])
    }

    pub fn emit_u32(&mut self, value: u32) -> ArchiveResult<()> {
        self.buf.append(&value.to_le_bytes())
    }

    pub fn emit_i32(&mut self, value: i32) -> ArchiveResult<()> {
        self.buf.append(&value.to_le_bytes())
    }

    pub fn emit_u64(&mut self, value: u64) -> ArchiveResult<()> {
        self.buf.append(&value.to_le_bytes())
    }

    pub fn emit_usize_as_u64(&mut self, value: usize) -> ArchiveResult<()> {
        self.emit_u64(value as u64)
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
        self.buf.append(bytes)
    }

    /// `u32` length prefix followed by the raw bytes (no NUL terminator).
    pub fn emit_sized_bytes(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
        self.emit_u32(bytes.len() as u32)?;
        self.emit_bytes(bytes)
    }

    /// `u32` length prefix (byte count, trailing NUL included) followed by
    /// the UTF-8 bytes of `s` plus a trailing NUL — the C-string convention
    /// names and stub bodies use throughout the archive.
    pub fn emit_c_string(&mut self, s: &str) -> ArchiveResult<()> {
        let bytes = s.as_bytes();
        self.emit_u32(bytes.len() as u32 + 1)?;
        self.emit_bytes(bytes)?;
        self.emit_u8(0)
    }

    /// `u32` length prefix plus raw UTF-8 bytes, no NUL — used for
    /// `MetadataCodec` string payloads, which are read back by the caller's
    /// own loader, not treated as archive-internal names.
    pub fn emit_str(&mut self, s: &str) -> ArchiveResult<()> {
        self.emit_sized_bytes(s.as_bytes())
    }
}

/// Typed decoder reading from a bounds-checked [`LoadBuffer`] slice.
pub struct ArchiveReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        ArchiveReader { buffer, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    fn take(&mut self, count: usize) -> ArchiveResult<&'a [u8]> {
        let end = self.position.checked_add(count).ok_or(ArchiveError::OutOfBounds {
            offset: self.position,
            size: self.buffer.len(),
        })?;
        if end > self.buffer.len() {
            return Err(ArchiveError::OutOfBounds { offset: self.position, size: self.buffer.len() });
        }
        let slice = &self.buffer[self.position..end];
        self.position = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> ArchiveResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> ArchiveResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> ArchiveResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> ArchiveResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_usize_from_u64(&mut self) -> ArchiveResult<usize> {
        Ok(self.read_u64()? as usize)
    }

    pub fn read_bytes(&mut self, count: usize) -> ArchiveResult<&'a [u8]> {
        self.take(count)
    }

    pub fn read_sized_bytes(&mut self) -> ArchiveResult<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Inverse of `emit_c_string`: returns the name without its trailing NUL.
    pub fn read_c_string(&mut self) -> ArchiveResult<&'a str> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        let trimmed = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        std::str::from_utf8(trimmed).map_err(|_| ArchiveError::MalformedEntry(self.position))
    }

    pub fn read_str(&mut self) -> ArchiveResult<&'a str> {
        let bytes = self.read_sized_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| ArchiveError::MalformedEntry(self.position))
    }
}
