//! Symbolic address table: id <-> address directory for `RuntimeHelper`s,
//! shared trampoline stubs, the exception blob, and interned strings.
//!
//! Generalizes `jit::backend::traits::SymbolResolver` so that relocations
//! recorded at one process's addresses can be rewritten to the equivalent
//! address in another. Ids are partitioned into four disjoint, contiguous
//! `u32` ranges; `u32::MAX` is reserved as the "no fix-up needed" sentinel.

use rustc_hash::FxHashMap;

use crate::jit::backend::traits::RuntimeHelper;

use super::error::{ArchiveError, ArchiveResult};

/// All `RuntimeHelper` variants in a fixed, stable order. The order defines
/// each variant's id within the `0..RUNTIME_HELPER_MAX` range, so it must
/// never be reordered once an archive format is in use without bumping
/// `header::FORMAT_VERSION`.
const ALL_RUNTIME_HELPERS: [RuntimeHelper; 19] = [
    RuntimeHelper::AllocObject,
    RuntimeHelper::AllocArray,
    RuntimeHelper::AllocString,
    RuntimeHelper::SafepointPoll,
    RuntimeHelper::CheckPreemption,
    RuntimeHelper::BoxI32,
    RuntimeHelper::UnboxI32,
    RuntimeHelper::BoxF64,
    RuntimeHelper::UnboxF64,
    RuntimeHelper::BoxBool,
    RuntimeHelper::UnboxBool,
    RuntimeHelper::NativeCallDispatch,
    RuntimeHelper::InterpreterCall,
    RuntimeHelper::ThrowException,
    RuntimeHelper::Deoptimize,
    RuntimeHelper::SpawnTask,
    RuntimeHelper::AwaitTask,
    RuntimeHelper::StringConcat,
    RuntimeHelper::GenericEquals,
];

/// Id range `[0, RUNTIME_HELPER_MAX)`: `RuntimeHelper` variants.
pub const RUNTIME_HELPER_MAX: u32 = ALL_RUNTIME_HELPERS.len() as u32;

/// Cap on distinct shared trampoline stub ids in one archive.
pub const MAX_STUBS: u32 = 64;
/// Id range `[RUNTIME_HELPER_MAX, STUB_MAX)`: shared trampoline stubs.
pub const STUB_MAX: u32 = RUNTIME_HELPER_MAX + MAX_STUBS;

/// Cap on distinct call-blob ids. Only one blob (the exception/deopt blob,
/// `header::BLOB_ID`) is registered today.
pub const MAX_BLOBS: u32 = 8;
/// Id range `[STUB_MAX, BLOB_MAX)`: call blobs.
pub const BLOB_MAX: u32 = STUB_MAX + MAX_BLOBS;

/// Base of the interned-string id range, `[STRING_BASE, u32::MAX)`.
pub const STRING_BASE: u32 = BLOB_MAX;

/// Reserved id meaning "same address as at store time; no fix-up needed".
pub const NO_FIXUP: u32 = u32::MAX;

/// Hard cap on the address table's own interned-string pool, distinct from
/// the per-archive `string_pool::StringPool` that holds entry names. This
/// pool is small and process-global, analogous to the upstream archive's
/// ~200-entry symbol table.
pub const MAX_STRING_POOL: usize = 256;

/// Result of resolving an address to a wire identity.
///
/// Most addresses resolve to a [`Table`](AddressId::Table) id within one of
/// the four ranges above. An address outside all four ranges but resolvable
/// to a named dynamic-library symbol with non-zero offset resolves to
/// [`Distance`](AddressId::Distance) instead, signaling that the loader
/// should reconstruct `anchor + distance` rather than look the id up in a
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressId {
    /// `addr == usize::MAX` at store time: no rewrite needed on load.
    NoFixup,
    /// A plain table id within one of the four ranges.
    Table(u32),
    /// Signed byte distance from [`AddressTable::PROCESS_ANCHOR`].
    Distance(i64),
}

impl AddressId {
    pub fn encode_tag(&self) -> u8 {
        match self {
            AddressId::NoFixup => 0,
            AddressId::Table(_) => 1,
            AddressId::Distance(_) => 2,
        }
    }
}

/// A pluggable lookup for "does this address belong to a named dynamic
/// symbol" — the last-resort fallback in `id_for_address`. Resolving dynamic
/// symbols is platform-specific and out of scope for this module; callers
/// that want the fallback wire one in.
pub trait DynamicSymbolResolver: Send + Sync {
    /// Returns the symbol name and the byte offset of `addr` within it, if
    /// `addr` falls inside a named symbol with non-zero offset.
    fn resolve(&self, addr: usize) -> Option<(String, usize)>;
}

struct CompletionFlags {
    base: bool,
    jit: bool,
}

/// Process-global id <-> address directory.
///
/// Populated in two phases during process startup, mirroring
/// `JitEngine::with_config`'s two-stage setup: a base phase registers
/// `RuntimeHelper` variants and shared trampolines; an optional JIT phase
/// adds the exception blob once the Cranelift backend is up.
/// `id_for_address` refuses to run until both phases are marked complete
/// when the caller's workload needs the JIT phase's entries.
pub struct AddressTable {
    runtime_helpers: [Option<usize>; RUNTIME_HELPER_MAX as usize],
    runtime_helper_rev: FxHashMap<usize, RuntimeHelper>,
    stubs: FxHashMap<u32, usize>,
    stubs_rev: FxHashMap<usize, u32>,
    blobs: Vec<Option<usize>>,
    strings: Vec<String>,
    string_index: FxHashMap<String, u32>,
    anchor: Option<usize>,
    dynamic_resolver: Option<Box<dyn DynamicSymbolResolver>>,
    flags: CompletionFlags,
}

impl AddressTable {
    pub fn new() -> Self {
        AddressTable {
            runtime_helpers: [None; RUNTIME_HELPER_MAX as usize],
            runtime_helper_rev: FxHashMap::default(),
            stubs: FxHashMap::default(),
            stubs_rev: FxHashMap::default(),
            blobs: vec![None; MAX_BLOBS as usize],
            strings: Vec::new(),
            string_index: FxHashMap::default(),
            anchor: None,
            dynamic_resolver: None,
            flags: CompletionFlags { base: false, jit: false },
        }
    }

    fn helper_index(helper: RuntimeHelper) -> u32 {
        ALL_RUNTIME_HELPERS
            .iter()
            .position(|&h| h == helper)
            .expect("RuntimeHelper variant missing from ALL_RUNTIME_HELPERS") as u32
    }

    /// Register a `RuntimeHelper`'s resolved address (base phase).
    pub fn register_runtime_helper(&mut self, helper: RuntimeHelper, addr: usize) {
        let idx = Self::helper_index(helper) as usize;
        self.runtime_helpers[idx] = Some(addr);
        self.runtime_helper_rev.insert(addr, helper);
    }

    /// Register a shared trampoline stub's address by its
    /// `jit::runtime::trampoline` id (base phase).
    pub fn register_stub(&mut self, stub_id: u32, addr: usize) -> ArchiveResult<()> {
        if stub_id >= MAX_STUBS {
            return Err(ArchiveError::UnregisteredAddress(format!(
                "stub id {stub_id} exceeds MAX_STUBS ({MAX_STUBS})"
            )));
        }
        self.stubs.insert(stub_id, addr);
        self.stubs_rev.insert(addr, stub_id);
        Ok(())
    }

    /// Register a call blob's address by blob index (JIT phase). Index 0 is
    /// the exception/deopt blob (`header::BLOB_ID`).
    pub fn register_blob(&mut self, blob_index: u32, addr: usize) -> ArchiveResult<()> {
        if blob_index >= MAX_BLOBS {
            return Err(ArchiveError::UnregisteredAddress(format!(
                "blob index {blob_index} exceeds MAX_BLOBS ({MAX_BLOBS})"
            )));
        }
        self.blobs[blob_index as usize] = Some(addr);
        Ok(())
    }

    pub fn set_anchor(&mut self, addr: usize) {
        self.anchor = Some(addr);
    }

    pub fn set_dynamic_resolver(&mut self, resolver: Box<dyn DynamicSymbolResolver>) {
        self.dynamic_resolver = Some(resolver);
    }

    pub fn mark_base_complete(&mut self) {
        self.flags.base = true;
    }

    pub fn mark_jit_complete(&mut self) {
        self.flags.jit = true;
    }

    pub fn is_complete(&self) -> bool {
        self.flags.base && self.flags.jit
    }

    /// Add a string to the table's own interned pool, deduplicated by value.
    /// Silently drops (returns `None`) once the table isn't yet complete, or
    /// once `MAX_STRING_POOL` is reached — this mirrors `add_string`'s
    /// "pool is small and best-effort" contract in the distilled spec.
    pub fn add_string(&mut self, s: &str) -> Option<u32> {
        if !self.is_complete() {
            return None;
        }
        if let Some(&idx) = self.string_index.get(s) {
            return Some(idx);
        }
        if self.strings.len() >= MAX_STRING_POOL {
            return None;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), idx);
        Some(idx)
    }

    /// Id for a `RuntimeHelper` variant, independent of whether its address
    /// has been registered yet — the variant's position in
    /// `ALL_RUNTIME_HELPERS` is the id, so `RelocationCodec` can encode a
    /// `RuntimeHelper` relocation target without an address round-trip.
    pub fn id_for_runtime_helper(&self, helper: RuntimeHelper) -> AddressId {
        AddressId::Table(Self::helper_index(helper))
    }

    /// Encode `addr` as a wire [`AddressId`].
    ///
    /// `addr == usize::MAX` is the "same as at store time" sentinel and
    /// always resolves to [`AddressId::NoFixup`] without touching any table.
    pub fn id_for_address(&self, addr: usize) -> ArchiveResult<AddressId> {
        if addr == usize::MAX {
            return Ok(AddressId::NoFixup);
        }
        if let Some(&stub_id) = self.stubs_rev.get(&addr) {
            return Ok(AddressId::Table(RUNTIME_HELPER_MAX + stub_id));
        }
        if let Some(blob_index) = self.blobs.iter().position(|b| *b == Some(addr)) {
            return Ok(AddressId::Table(STUB_MAX + blob_index as u32));
        }
        if let Some(&helper) = self.runtime_helper_rev.get(&addr) {
            return Ok(AddressId::Table(Self::helper_index(helper)));
        }
        if let Some(resolver) = &self.dynamic_resolver {
            if let Some((_name, offset)) = resolver.resolve(addr) {
                if offset != 0 {
                    let anchor = self.anchor.ok_or_else(|| {
                        ArchiveError::UnregisteredAddress("process anchor not set".to_string())
                    })?;
                    let distance = addr as i64 - anchor as i64;
                    return Ok(AddressId::Distance(distance));
                }
            }
        }
        Err(ArchiveError::UnregisteredAddress(format!("{addr:#x}")))
    }

    /// Inverse of [`Self::id_for_address`] for [`AddressId::Table`] ids.
    /// Invalid ids are fatal — the table is out of sync with the runtime.
    pub fn address_for_id(&self, id: AddressId) -> ArchiveResult<usize> {
        match id {
            AddressId::NoFixup => Ok(usize::MAX),
            AddressId::Distance(distance) => {
                let anchor = self.anchor.ok_or_else(|| {
                    ArchiveError::UnregisteredAddress("process anchor not set".to_string())
                })?;
                Ok((anchor as i64 + distance) as usize)
            }
            AddressId::Table(id) => {
                if id < RUNTIME_HELPER_MAX {
                    let helper = ALL_RUNTIME_HELPERS[id as usize];
                    self.runtime_helpers[id as usize]
                        .ok_or_else(|| ArchiveError::UnregisteredAddress(format!("{helper:?}")))
                } else if id < STUB_MAX {
                    let stub_id = id - RUNTIME_HELPER_MAX;
                    self.stubs
                        .get(&stub_id)
                        .copied()
                        .ok_or_else(|| ArchiveError::UnregisteredAddress(format!("stub {stub_id}")))
                } else if id < BLOB_MAX {
                    let blob_index = (id - STUB_MAX) as usize;
                    self.blobs
                        .get(blob_index)
                        .copied()
                        .flatten()
                        .ok_or_else(|| ArchiveError::UnregisteredAddress(format!("blob {blob_index}")))
                } else {
                    Err(ArchiveError::UnregisteredAddress(format!("string id {id}")))
                }
            }
        }
    }

    /// Look up an interned string by table id (`id - STRING_BASE`).
    pub fn string_for_id(&self, id: u32) -> ArchiveResult<&str> {
        if id < STRING_BASE {
            return Err(ArchiveError::UnregisteredAddress(format!("not a string id: {id}")));
        }
        let idx = (id - STRING_BASE) as usize;
        self.strings
            .get(idx)
            .map(|s| s.as_str())
            .ok_or_else(|| ArchiveError::UnregisteredAddress(format!("string id {id}")))
    }
}

impl Default for AddressTable {
    fn default() -> Self {
        Self::new()
    }
}
