//! `ArtifactStore`: the store/load API over one open archive buffer.
//!
//! One `ArtifactStore` is open in exactly one direction for its lifetime —
//! `Write` while a process is recording what it JITted, `Read` while a later
//! launch is replaying it — mirroring `ArchiveMode` in `mod.rs`. Every public
//! method returns `ArchiveResult<bool>` (or an `Option<_>` for the two calls
//! that hand back a live handle): `Ok(true)`/`Some(_)` success, `Ok(false)`/
//! `None` a per-artifact miss that leaves the archive usable, `Err(_)`
//! archive-fatal.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::jit::backend::traits::{DeoptInfo, PointerLocation, Relocation, StackMapEntry, SymbolResolver};

use super::address_table::AddressTable;
use super::code_section::{self, CodeSection, DecodedSection};
use super::error::{ArchiveError, ArchiveResult};
use super::header::{Entry, EntryCatalog, EntryKind, BLOB_ID};
use super::io::{ArchiveReader, ArchiveWriter, LoadBuffer, StoreBuffer};
use super::metadata::ValueRef;
use super::relocation::{self, FixupAction};
use super::string_pool::{StringPool, StringPoolBuilder};

/// A 32-bit stable cross-process key for a compiled function, combining its
/// module's content checksum with its index — generalizes
/// `jit::runtime::code_cache::CacheKey` (which keys on `(module_id,
/// func_index)`, both of which are process-local) into something that
/// survives across launches.
pub fn function_key(module_checksum: &[u8; 32], func_index: u32) -> u32 {
    let mut hasher = FxHasher::default();
    module_checksum.hash(&mut hasher);
    func_index.hash(&mut hasher);
    (hasher.finish() & 0xFFFF_FFFF) as u32
}

fn encode_pointer_location(writer: &mut ArchiveWriter, loc: &PointerLocation) -> ArchiveResult<()> {
    match loc {
        PointerLocation::Register(reg) => {
            writer.emit_u8(0)?;
            writer.emit_u8(*reg)
        }
        PointerLocation::StackOffset(offset) => {
            writer.emit_u8(1)?;
            writer.emit_i32(*offset)
        }
    }
}

fn decode_pointer_location(reader: &mut ArchiveReader) -> ArchiveResult<PointerLocation> {
    match reader.read_u8()? {
        0 => Ok(PointerLocation::Register(reader.read_u8()?)),
        1 => Ok(PointerLocation::StackOffset(reader.read_i32()?)),
        other => Err(ArchiveError::MalformedEntry(other as usize)),
    }
}

fn encode_stack_maps(writer: &mut ArchiveWriter, maps: &[StackMapEntry]) -> ArchiveResult<()> {
    writer.emit_u32(maps.len() as u32)?;
    for map in maps {
        writer.emit_u32(map.code_offset as u32)?;
        writer.emit_u32(map.live_pointers.len() as u32)?;
        for loc in &map.live_pointers {
            encode_pointer_location(writer, loc)?;
        }
    }
    Ok(())
}

fn decode_stack_maps(reader: &mut ArchiveReader) -> ArchiveResult<Vec<StackMapEntry>> {
    let count = reader.read_u32()? as usize;
    let mut maps = Vec::with_capacity(count);
    for _ in 0..count {
        let code_offset = reader.read_u32()? as usize;
        let live_count = reader.read_u32()? as usize;
        let mut live_pointers = Vec::with_capacity(live_count);
        for _ in 0..live_count {
            live_pointers.push(decode_pointer_location(reader)?);
        }
        maps.push(StackMapEntry { code_offset, live_pointers });
    }
    Ok(maps)
}

fn encode_deopt_info(writer: &mut ArchiveWriter, infos: &[DeoptInfo]) -> ArchiveResult<()> {
    writer.emit_u32(infos.len() as u32)?;
    for info in infos {
        writer.emit_u32(info.code_offset as u32)?;
        writer.emit_u32(info.bytecode_offset as u32)?;
        writer.emit_u32(info.register_map.len() as u32)?;
        for (loc, local_index) in &info.register_map {
            encode_pointer_location(writer, loc)?;
            writer.emit_u32(*local_index as u32)?;
        }
    }
    Ok(())
}

fn decode_deopt_info(reader: &mut ArchiveReader) -> ArchiveResult<Vec<DeoptInfo>> {
    let count = reader.read_u32()? as usize;
    let mut infos = Vec::with_capacity(count);
    for _ in 0..count {
        let code_offset = reader.read_u32()? as usize;
        let bytecode_offset = reader.read_u32()? as usize;
        let map_count = reader.read_u32()? as usize;
        let mut register_map = Vec::with_capacity(map_count);
        for _ in 0..map_count {
            let loc = decode_pointer_location(reader)?;
            let local_index = reader.read_u32()? as u16;
            register_map.push((loc, local_index));
        }
        infos.push(DeoptInfo { code_offset, bytecode_offset, register_map });
    }
    Ok(infos)
}

/// A live reference to an entry just recorded by `store_function`, used to
/// mark it `not_entrant` later if the JIT deoptimizes that function. Cheap to
/// hold onto: just an index plus a borrow of the store's own invalidation
/// table.
#[derive(Debug, Clone, Copy)]
pub struct EntryHandle {
    idx: u32,
}

/// A function decoded from the archive, ready for the caller to place into
/// executable memory and install into `CodeCache`. Sections and the name
/// borrow directly from the archive's load buffer; nothing here is copied.
pub struct LoadedFunction<'a> {
    pub name: &'a str,
    pub sections: Vec<DecodedSection<'a>>,
    pub stack_maps: Vec<StackMapEntry>,
    pub deopt_info: Vec<DeoptInfo>,
    /// Relocation fix-ups the caller applies once it knows where the
    /// sections actually landed in memory. `MetadataImmediate` entries still
    /// need `metadata::resolve` plus VM-heap construction, neither of which
    /// this module has access to.
    pub fixups: Vec<FixupAction>,
    pub handle: EntryHandle,
}

struct WriteState {
    buffer: StoreBuffer,
    catalog: EntryCatalog,
    strings: StringPoolBuilder,
}

struct ReadState {
    buffer: LoadBuffer,
    catalog: EntryCatalog,
    strings: Vec<String>,
}

enum Backing {
    Write(Mutex<WriteState>),
    Read(ReadState),
}

/// Open archive, bound to one direction for its lifetime.
///
/// Readers and writers never interleave within one instance: `SharedCodeArchive`
/// (`mod.rs`) owns exactly one `ArtifactStore`, created by `init_read` or
/// `init_write`.
pub struct ArtifactStore {
    backing: Backing,
    not_entrant: Vec<AtomicBool>,
    failed: AtomicBool,
    reading_in_flight: AtomicUsize,
}

/// RAII guard incrementing/decrementing `reading_in_flight` around a `load_*`
/// call, so `SharedCodeArchive::close` can detect outstanding readers.
struct ReadGuard<'a>(&'a AtomicUsize);

impl<'a> ReadGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        ReadGuard(counter)
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ArtifactStore {
    /// Open a fresh archive for writing, staging into a buffer capped at
    /// `reserved_store_size` bytes. The header occupies byte 0 first (as a
    /// zeroed placeholder) and is rewritten in place once [`Self::finalize`]
    /// knows the final offsets.
    pub fn open_write(reserved_store_size: usize) -> Self {
        let mut buffer = StoreBuffer::new(reserved_store_size);
        buffer
            .append(&[0u8; super::header::HEADER_SIZE])
            .expect("reserved_store_size must be large enough for the header");
        ArtifactStore {
            backing: Backing::Write(Mutex::new(WriteState {
                buffer,
                catalog: EntryCatalog::new(),
                strings: StringPoolBuilder::new(),
            })),
            not_entrant: Vec::new(),
            failed: AtomicBool::new(false),
            reading_in_flight: AtomicUsize::new(0),
        }
    }

    /// Append the string pool and entry table, then rewrite the header in
    /// place at offset 0, and hand back the finished archive bytes. Called
    /// by `SharedCodeArchive::close` (`mod.rs`) once no more `store_*` calls
    /// will follow.
    pub fn finalize(&self) -> ArchiveResult<Vec<u8>> {
        self.guard_healthy()?;
        let state = self.write_state().ok_or(ArchiveError::Poisoned)?;
        let mut guard = state.lock();

        let strings_offset = guard.buffer.offset();
        {
            let mut w = ArchiveWriter::new(&mut guard.buffer);
            guard.strings.encode(&mut w).map_err(|e| self.fail(e))?;
        }
        let entries_offset = guard.buffer.offset();
        {
            let mut w = ArchiveWriter::new(&mut guard.buffer);
            guard.catalog.encode_all(&mut w).map_err(|e| self.fail(e))?;
        }
        let total_size = guard.buffer.offset();

        let header = super::header::Header {
            version: super::header::FORMAT_VERSION,
            entries_count: guard.catalog.len() as u32,
            total_size: total_size as u32,
            entries_offset: entries_offset as u32,
            strings_count: guard.strings.len() as u32,
            strings_offset: strings_offset as u32,
        };
        let mut header_bytes = StoreBuffer::new(super::header::HEADER_SIZE);
        {
            let mut w = ArchiveWriter::new(&mut header_bytes);
            header.encode(&mut w).map_err(|e| self.fail(e))?;
        }
        guard.buffer.overwrite_prefix(&header_bytes.into_bytes());

        Ok(guard.buffer.as_slice().to_vec())
    }

    /// Open an existing archive file for reading. A [`super::header::FORMAT_VERSION`]
    /// mismatch returns `Ok(None)` (the archive is treated as absent, not a
    /// hard failure) rather than `Err`.
    pub fn open_read(path: &Path) -> ArchiveResult<Option<Self>> {
        let bytes = std::fs::read(path)?;
        Self::open_read_bytes(bytes)
    }

    /// As [`Self::open_read`], but takes an already-loaded buffer — the path
    /// used by tests and by `mod.rs` once it has the file contents in hand.
    pub fn open_read_bytes(bytes: Vec<u8>) -> ArchiveResult<Option<Self>> {
        use super::header::Header;

        if bytes.len() < super::header::HEADER_SIZE {
            return Ok(None);
        }
        let header = Header::decode(&bytes)?;
        if header.version != super::header::FORMAT_VERSION {
            return Ok(None);
        }

        let buffer = LoadBuffer::from_bytes(bytes);
        let entries_region = buffer.slice(
            header.entries_offset as usize,
            header.entries_count as usize * super::header::ENTRY_SIZE,
        )?;
        let catalog = EntryCatalog::decode_all(entries_region, header.entries_count)?;

        let strings = if header.strings_count > 0 {
            let pool = StringPool::parse(&buffer, header.strings_offset, header.strings_count)?;
            (0..header.strings_count)
                .map(|i| pool.get(i).unwrap_or("").to_string())
                .collect()
        } else {
            Vec::new()
        };

        let not_entrant = catalog.iter().map(|e| AtomicBool::new(e.not_entrant)).collect();

        Ok(Some(ArtifactStore {
            backing: Backing::Read(ReadState { buffer, catalog, strings }),
            not_entrant,
            failed: AtomicBool::new(false),
            reading_in_flight: AtomicUsize::new(0),
        }))
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Count of `load_*` calls currently in flight, via their [`ReadGuard`].
    /// Polled by `SharedCodeArchive::close` to bound its wait for readers.
    pub fn reading_in_flight(&self) -> usize {
        self.reading_in_flight.load(Ordering::Acquire)
    }

    fn guard_healthy(&self) -> ArchiveResult<()> {
        if self.is_failed() {
            return Err(ArchiveError::Poisoned);
        }
        Ok(())
    }

    fn fail(&self, err: ArchiveError) -> ArchiveError {
        self.failed.store(true, Ordering::Release);
        err
    }

    fn write_state(&self) -> Option<&Mutex<WriteState>> {
        match &self.backing {
            Backing::Write(state) => Some(state),
            Backing::Read(_) => None,
        }
    }

    fn read_state(&self) -> Option<&ReadState> {
        match &self.backing {
            Backing::Read(state) => Some(state),
            Backing::Write(_) => None,
        }
    }

    /// Mark the entry behind `handle` not-entrant. Monotone: once set, it
    /// stays set for the rest of the process's life, and `find_entry` never
    /// returns it again.
    pub fn invalidate(&self, handle: EntryHandle) {
        if let Some(flag) = self.not_entrant.get(handle.idx as usize) {
            flag.store(true, Ordering::Release);
        }
    }

    fn find_entry(&self, kind: EntryKind, id: u32, decompile: Option<u32>) -> Option<Entry> {
        match &self.backing {
            Backing::Write(state) => {
                // Only used by tests/diagnostics; production load paths run
                // against a `Read`-backed store.
                let guard = state.lock();
                find_in(&guard.catalog, &self.not_entrant, kind, id, decompile).copied()
            }
            Backing::Read(state) => find_in(&state.catalog, &self.not_entrant, kind, id, decompile).copied(),
        }
    }

    // --- stub ---------------------------------------------------------

    pub fn store_stub(&self, id: u32, name: &str, code: &[u8]) -> ArchiveResult<bool> {
        self.guard_healthy()?;
        let state = self.write_state().ok_or(ArchiveError::Poisoned)?;
        let mut guard = state.lock();
        let start = guard.buffer.offset();

        let result: ArchiveResult<Entry> = (|| {
            let name_offset = guard.buffer.offset();
            {
                let mut w = ArchiveWriter::new(&mut guard.buffer);
                w.emit_c_string(name)?;
            }
            let name_end = guard.buffer.offset();
            guard.buffer.align_write()?;
            let code_offset = guard.buffer.offset();
            guard.buffer.append(code)?;
            let code_end = guard.buffer.offset();
            Ok(Entry {
                kind: EntryKind::Stub,
                id,
                idx: 0,
                offset: start as u32,
                size: (code_end - start) as u32,
                name_offset: name_offset as u32,
                name_size: (name_end - name_offset) as u32,
                code_offset: code_offset as u32,
                code_size: (code_end - code_offset) as u32,
                reloc_offset: 0,
                reloc_size: 0,
                decompile: 0,
                not_entrant: false,
            })
        })();

        match result {
            Ok(entry) => {
                guard.catalog.push(entry);
                Ok(true)
            }
            Err(e) => {
                guard.buffer.truncate(start);
                Err(self.fail(e))
            }
        }
    }

    pub fn load_stub(&self, id: u32, name: &str, dst: &mut [u8]) -> ArchiveResult<bool> {
        self.guard_healthy()?;
        let _guard = ReadGuard::enter(&self.reading_in_flight);
        let state = self.read_state().ok_or(ArchiveError::Poisoned)?;

        let Some(entry) = self.find_entry(EntryKind::Stub, id, None) else {
            return Ok(false);
        };
        let name_bytes = state.buffer.slice(entry.name_offset as usize, entry.name_size as usize)?;
        let mut reader = ArchiveReader::new(name_bytes);
        let stored_name = reader.read_c_string()?;
        if stored_name != name {
            // A stale name for a known id means the `AddressTable`/trampoline
            // roster the archive was built against no longer matches this
            // process, which taints every other entry too — but per SPEC §8
            // scenario 2 this call itself still reports a plain miss, not an
            // error; later calls see `Poisoned` via `guard_healthy`.
            self.fail(ArchiveError::MalformedEntry(entry.idx as usize));
            return Ok(false);
        }
        let code = state.buffer.slice(entry.code_offset as usize, entry.code_size as usize)?;
        if code.len() != dst.len() {
            return Ok(false);
        }
        dst.copy_from_slice(code);
        Ok(true)
    }

    // --- blob -----------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn store_blob(
        &self,
        name: &str,
        sections: &[CodeSection],
        relocations: &[Relocation],
        immediates: &[Option<ValueRef>],
        table: &AddressTable,
        resolver: &dyn SymbolResolver,
    ) -> ArchiveResult<bool> {
        self.store_code_entry(EntryKind::Blob, BLOB_ID, 0, name, sections, &[], &[], relocations, immediates, table, resolver)
            .map(|handle| handle.is_some())
    }

    pub fn load_blob(&self, table: &AddressTable, new_origin: usize) -> ArchiveResult<Option<LoadedFunction>> {
        self.load_code_entry(EntryKind::Blob, BLOB_ID, None, table, new_origin)
    }

    // --- function ---------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn store_function(
        &self,
        module_checksum: &[u8; 32],
        func_index: u32,
        decompile: u32,
        name: &str,
        sections: &[CodeSection],
        stack_maps: &[StackMapEntry],
        deopt_info: &[DeoptInfo],
        relocations: &[Relocation],
        immediates: &[Option<ValueRef>],
        table: &AddressTable,
        resolver: &dyn SymbolResolver,
    ) -> ArchiveResult<Option<EntryHandle>> {
        let id = function_key(module_checksum, func_index);
        self.store_code_entry(
            EntryKind::Code,
            id,
            decompile,
            name,
            sections,
            stack_maps,
            deopt_info,
            relocations,
            immediates,
            table,
            resolver,
        )
    }

    pub fn load_function(
        &self,
        module_checksum: &[u8; 32],
        func_index: u32,
        decompile: u32,
        table: &AddressTable,
        new_origin: usize,
    ) -> ArchiveResult<Option<LoadedFunction>> {
        let id = function_key(module_checksum, func_index);
        self.load_code_entry(EntryKind::Code, id, Some(decompile), table, new_origin)
    }

    #[allow(clippy::too_many_arguments)]
    fn store_code_entry(
        &self,
        kind: EntryKind,
        id: u32,
        decompile: u32,
        name: &str,
        sections: &[CodeSection],
        stack_maps: &[StackMapEntry],
        deopt_info: &[DeoptInfo],
        relocations: &[Relocation],
        immediates: &[Option<ValueRef>],
        table: &AddressTable,
        resolver: &dyn SymbolResolver,
    ) -> ArchiveResult<Option<EntryHandle>> {
        self.guard_healthy()?;
        let state = self.write_state().ok_or(ArchiveError::Poisoned)?;
        let mut guard = state.lock();
        let start = guard.buffer.offset();

        let result: ArchiveResult<Entry> = (|| {
            let name_offset = guard.buffer.offset();
            {
                let mut w = ArchiveWriter::new(&mut guard.buffer);
                w.emit_c_string(name)?;
            }
            let name_end = guard.buffer.offset();
            guard.buffer.align_write()?;

            let code_offset = guard.buffer.offset();
            {
                let mut w = ArchiveWriter::new(&mut guard.buffer);
                encode_stack_maps(&mut w, stack_maps)?;
                encode_deopt_info(&mut w, deopt_info)?;
                code_section::encode(&mut w, sections)?;
            }
            let code_end = guard.buffer.offset();
            guard.buffer.align_write()?;

            let reloc_offset = guard.buffer.offset();
            {
                let mut w = ArchiveWriter::new(&mut guard.buffer);
                relocation::encode(&mut w, table, resolver, relocations, immediates)?;
            }
            let reloc_end = guard.buffer.offset();

            Ok(Entry {
                kind,
                id,
                idx: 0,
                offset: start as u32,
                size: (reloc_end - start) as u32,
                name_offset: name_offset as u32,
                name_size: (name_end - name_offset) as u32,
                code_offset: code_offset as u32,
                code_size: (code_end - code_offset) as u32,
                reloc_offset: reloc_offset as u32,
                reloc_size: (reloc_end - reloc_offset) as u32,
                decompile,
                not_entrant: false,
            })
        })();

        match result {
            Ok(entry) => {
                let idx = guard.catalog.push(entry);
                Ok(Some(EntryHandle { idx }))
            }
            Err(e) => {
                guard.buffer.truncate(start);
                Err(self.fail(e))
            }
        }
    }

    fn load_code_entry(
        &self,
        kind: EntryKind,
        id: u32,
        decompile: Option<u32>,
        table: &AddressTable,
        new_origin: usize,
    ) -> ArchiveResult<Option<LoadedFunction>> {
        self.guard_healthy()?;
        let _guard = ReadGuard::enter(&self.reading_in_flight);
        let state = self.read_state().ok_or(ArchiveError::Poisoned)?;

        let Some(entry) = self.find_entry(kind, id, decompile) else {
            return Ok(None);
        };

        let name_bytes = state.buffer.slice(entry.name_offset as usize, entry.name_size as usize)?;
        let name = {
            let mut reader = ArchiveReader::new(name_bytes);
            reader.read_c_string()?
        };

        let code_bytes = state.buffer.slice(entry.code_offset as usize, entry.code_size as usize)?;
        let (stack_maps, deopt_info, sections) = {
            let mut reader = ArchiveReader::new(code_bytes);
            let stack_maps = decode_stack_maps(&mut reader)?;
            let deopt_info = decode_deopt_info(&mut reader)?;
            let sections_bytes = &code_bytes[reader.position()..];
            let sections = code_section::decode(sections_bytes)?;
            (stack_maps, deopt_info, sections)
        };

        let old_origin = sections.first().map(|s| s.origin_address).unwrap_or(0);
        let reloc_bytes = state.buffer.slice(entry.reloc_offset as usize, entry.reloc_size as usize)?;
        let fixups = relocation::decode(reloc_bytes, table, old_origin, new_origin)?;

        Ok(Some(LoadedFunction {
            name,
            sections,
            stack_maps,
            deopt_info,
            fixups,
            handle: EntryHandle { idx: entry.idx },
        }))
    }
}

fn find_in<'a>(
    catalog: &'a EntryCatalog,
    not_entrant: &[AtomicBool],
    kind: EntryKind,
    id: u32,
    decompile: Option<u32>,
) -> Option<&'a Entry> {
    catalog.iter().rev().find(|e| {
        if e.kind != kind || e.id != id {
            return false;
        }
        if not_entrant.get(e.idx as usize).map(|f| f.load(Ordering::Acquire)).unwrap_or(false) {
            return false;
        }
        if kind == EntryKind::Code {
            if let Some(decompile) = decompile {
                if e.decompile != decompile {
                    return false;
                }
            }
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jit::backend::traits::{RelocationTarget, RuntimeHelper};
    use tempfile::TempDir;

    struct NullResolver;
    impl SymbolResolver for NullResolver {
        fn resolve_runtime_helper(&self, _helper: RuntimeHelper) -> Option<usize> {
            None
        }
        fn resolve_jit_function(&self, _func_index: u32) -> Option<usize> {
            None
        }
    }

    fn header_and_strings(store: &ArtifactStore) -> Vec<u8> {
        store.finalize().unwrap()
    }

    #[test]
    fn stub_round_trip() {
        let store = ArtifactStore::open_write(4096);
        assert!(store.store_stub(7, "raya_mul_add_stub", &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap());

        let bytes = header_and_strings(&store);
        // Adjust offsets for the prepended header: header_and_strings wrote
        // a header whose internal offsets assume the header occupies the
        // first HEADER_SIZE bytes, which it now does.
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();

        let mut dst = [0u8; 4];
        assert!(loaded.load_stub(7, "raya_mul_add_stub", &mut dst).unwrap());
        assert_eq!(dst, [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn name_mismatch_is_archive_fatal() {
        let store = ArtifactStore::open_write(4096);
        store.store_stub(7, "raya_mul_add_stub", &[1, 2, 3, 4]).unwrap();
        let bytes = header_and_strings(&store);
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();

        let mut dst = [0u8; 4];
        assert!(!loaded.load_stub(7, "wrong_name", &mut dst).unwrap());
        assert!(loaded.is_failed());
        assert!(matches!(loaded.load_stub(7, "raya_mul_add_stub", &mut dst), Err(ArchiveError::Poisoned)));
    }

    #[test]
    fn missing_entry_on_empty_archive_is_healthy_miss() {
        let store = ArtifactStore::open_write(4096);
        let bytes = header_and_strings(&store);
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();

        let mut dst = [0u8; 4];
        assert!(!loaded.load_stub(1, "anything", &mut dst).unwrap());
        assert!(!loaded.is_failed());
    }

    #[test]
    fn invalidated_function_entry_is_never_found_again() {
        let store = ArtifactStore::open_write(1 << 16);
        let checksum = [7u8; 32];
        let table = AddressTable::new();
        let resolver = NullResolver;
        let code = [0x90u8; 8];
        let sections = [CodeSection { origin_address: 0x1000, bytes: &code }];

        let handle = store
            .store_function(&checksum, 3, 0, "fn_main", &sections, &[], &[], &[], &[], &table, &resolver)
            .unwrap()
            .unwrap();

        let bytes = header_and_strings(&store);
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();
        assert!(loaded.load_function(&checksum, 3, 0, &table, 0x2000).unwrap().is_some());

        loaded.invalidate(handle);
        assert!(loaded.load_function(&checksum, 3, 0, &table, 0x2000).unwrap().is_none());
    }

    #[test]
    fn function_with_stack_maps_and_deopt_info_round_trips() {
        // The sections block sits behind a stack-maps/deopt-info prefix here,
        // which is the case `code_section::{encode, decode}` has to get
        // right: that prefix's length is whatever `encode_stack_maps` +
        // `encode_deopt_info` produced, rarely a multiple of `ARCHIVE_ALIGN`.
        let store = ArtifactStore::open_write(1 << 16);
        let checksum = [3u8; 32];
        let table = AddressTable::new();
        let resolver = NullResolver;
        let code = [0x48u8, 0x89, 0xE5, 0xC3, 0x90];
        let sections = [CodeSection { origin_address: 0x4000, bytes: &code }];
        let stack_maps = [StackMapEntry {
            code_offset: 2,
            live_pointers: vec![PointerLocation::Register(3), PointerLocation::StackOffset(-16)],
        }];
        let deopt_info = [DeoptInfo {
            code_offset: 4,
            bytecode_offset: 12,
            register_map: vec![(PointerLocation::StackOffset(8), 1u16)],
        }];

        store
            .store_function(&checksum, 9, 0, "fn_stack_mapped", &sections, &stack_maps, &deopt_info, &[], &[], &table, &resolver)
            .unwrap()
            .unwrap();

        let bytes = header_and_strings(&store);
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();
        let loaded_fn = loaded.load_function(&checksum, 9, 0, &table, 0x4000).unwrap().unwrap();

        assert_eq!(loaded_fn.sections.len(), 1);
        assert_eq!(loaded_fn.sections[0].bytes, &code);
        assert_eq!(loaded_fn.stack_maps.len(), 1);
        assert_eq!(loaded_fn.stack_maps[0].code_offset, 2);
        assert_eq!(loaded_fn.stack_maps[0].live_pointers.len(), 2);
        assert_eq!(loaded_fn.deopt_info.len(), 1);
        assert_eq!(loaded_fn.deopt_info[0].bytecode_offset, 12);
    }

    #[test]
    fn decompile_generations_are_retrievable_independently() {
        let store = ArtifactStore::open_write(1 << 16);
        let checksum = [9u8; 32];
        let table = AddressTable::new();
        let resolver = NullResolver;
        let code_v0 = [0xAAu8; 4];
        let code_v1 = [0xBBu8; 4];

        store
            .store_function(
                &checksum, 1, 0, "fn_hot",
                &[CodeSection { origin_address: 0x1000, bytes: &code_v0 }],
                &[], &[], &[], &[], &table, &resolver,
            )
            .unwrap();
        store
            .store_function(
                &checksum, 1, 1, "fn_hot",
                &[CodeSection { origin_address: 0x3000, bytes: &code_v1 }],
                &[], &[], &[], &[], &table, &resolver,
            )
            .unwrap();

        let bytes = header_and_strings(&store);
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();

        let gen0 = loaded.load_function(&checksum, 1, 0, &table, 0x1000).unwrap().unwrap();
        assert_eq!(gen0.sections[0].bytes, &code_v0);
        let gen1 = loaded.load_function(&checksum, 1, 1, &table, 0x3000).unwrap().unwrap();
        assert_eq!(gen1.sections[0].bytes, &code_v1);
    }

    #[test]
    fn no_fixup_sentinel_decodes_without_address_lookup() {
        let store = ArtifactStore::open_write(1 << 16);
        let checksum = [1u8; 32];
        let table = AddressTable::new(); // nothing registered
        let resolver = NullResolver;
        let code = [0x01u8; 4];
        let relocations = vec![Relocation { code_offset: 0, target: RelocationTarget::Absolute(usize::MAX) }];

        store
            .store_function(
                &checksum, 0, 0, "fn_noop",
                &[CodeSection { origin_address: 0x1000, bytes: &code }],
                &[], &[], &relocations, &[None], &table, &resolver,
            )
            .unwrap();

        let bytes = header_and_strings(&store);
        let loaded = ArtifactStore::open_read_bytes(bytes).unwrap().unwrap();
        // An empty `table` would make any real lookup fail; NoFixup must
        // short-circuit before that happens.
        let result = loaded.load_function(&checksum, 0, 0, &table, 0x1000).unwrap().unwrap();
        assert!(matches!(result.fixups[0], FixupAction::NoFixup));
    }

    #[test]
    fn store_capacity_overflow_leaves_no_partial_entry() {
        let store = ArtifactStore::open_write(super::super::header::HEADER_SIZE + 8);
        let result = store.store_stub(1, "way_too_long_a_name_for_this_budget", &[0u8; 32]);
        assert!(matches!(result, Err(ArchiveError::StoreCapacityExceeded { .. })));
        assert!(store.is_failed());
    }

    #[test]
    fn version_mismatch_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.sca");
        let mut bad_header = vec![0u8; super::super::header::HEADER_SIZE];
        bad_header[0..4].copy_from_slice(&99u32.to_le_bytes()); // bogus version
        std::fs::write(&path, &bad_header).unwrap();

        let loaded = ArtifactStore::open_read(&path).unwrap();
        assert!(loaded.is_none());
    }
}
