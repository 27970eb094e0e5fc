//! Persistent shared compiled-code archive.
//!
//! Across successive launches of a Raya program the runtime may *store* or
//! *load* artifacts produced by the Cranelift JIT backend
//! (`jit::backend::cranelift`) — trampoline stubs (`jit::runtime::trampoline`),
//! the exception/deopt blob, and compiled functions (`ExecutableCode`) — so a
//! later launch can skip re-JITting hot functions it already compiled once.
//!
//! Opened in exactly one direction for the process's lifetime
//! ([`ArchiveMode`]). [`SharedCodeArchive::global`] is the process-wide
//! handle; [`init_read`]/[`init_write`] populate it at most once, typically
//! from `raya-runtime` startup once CLI flags are parsed.

pub mod address_table;
pub mod code_section;
pub mod error;
pub mod header;
pub mod io;
pub mod metadata;
pub mod relocation;
pub mod store;
pub mod string_pool;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::jit::backend::traits::{DeoptInfo, Relocation, StackMapEntry, SymbolResolver};

pub use address_table::AddressTable;
pub use code_section::CodeSection;
pub use error::{ArchiveError, ArchiveResult};
pub use header::FORMAT_VERSION;
pub use metadata::ValueRef;
pub use store::{function_key, ArtifactStore, EntryHandle, LoadedFunction};

static ADDRESS_TABLE: OnceLock<Mutex<AddressTable>> = OnceLock::new();

/// Process-global id↔address directory, populated in two phases at process
/// start (see [`address_table`]) then treated as read-only.
pub fn address_table() -> &'static Mutex<AddressTable> {
    ADDRESS_TABLE.get_or_init(|| Mutex::new(AddressTable::new()))
}

/// Bound on how long `close` waits for in-flight `load_*` calls to finish
/// before flushing anyway — a grace period, not a guarantee.
const CLOSE_WAIT_BUDGET: Duration = Duration::from_millis(200);
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(5);

const DEFAULT_RESERVED_STORE_SIZE: usize = 16 * 1024 * 1024;

/// Direction an open archive supports for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    Store,
    Load,
}

/// Construction mirrors `jit::engine::JitConfig`: a plain struct with a
/// `Default` impl, no env/CLI parsing inside this crate — `raya-cli`/
/// `raya-runtime` populate it from flags.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub archive_path: PathBuf,
    pub mode: ArchiveMode,
    pub reserved_store_size: usize,
    pub verify: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            archive_path: PathBuf::new(),
            mode: ArchiveMode::Load,
            reserved_store_size: DEFAULT_RESERVED_STORE_SIZE,
            verify: false,
        }
    }
}

/// Process-global shared compiled-code archive.
///
/// Matches `jit::runtime::code_cache::CodeCache`'s concurrency shape: many
/// threads call `load_*` concurrently against the immutable load buffer,
/// while stores are serialized by `compile_lock` — the same lock the
/// Cranelift backend takes around `finalize`. The archive itself only takes
/// `compile_lock` during `close`, to block concurrent stores during flush.
pub struct SharedCodeArchive {
    store: ArtifactStore,
    mode: ArchiveMode,
    path: PathBuf,
    verify: bool,
    closing: AtomicBool,
    compile_lock: Mutex<()>,
}

static ARCHIVE: OnceLock<SharedCodeArchive> = OnceLock::new();

impl SharedCodeArchive {
    pub fn mode(&self) -> ArchiveMode {
        self.mode
    }

    /// `verify` mode still decodes on load (to validate the archive) but the
    /// caller should treat every `load_function` as `Ok(None)` so it falls
    /// back to recompiling; enforced by the free functions below, not by
    /// `ArtifactStore` itself.
    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Whether a *write*-mode archive is currently open — while true, the
    /// runtime must disable constant-folding of fields whose value could
    /// change across loads, force position-independent addressing in the
    /// Cranelift backend, and disable deferred trampoline generation. Those
    /// three preconditions are enforced by `raya-runtime`, not here.
    pub fn allow_const_fold(&self) -> bool {
        self.mode != ArchiveMode::Store
    }

    /// Gated close: waits (bounded) for in-flight readers, then — if opened
    /// for write — finalizes and flushes to `archive_path`.
    pub fn close(&self) -> ArchiveResult<()> {
        self.closing.store(true, Ordering::Release);

        let deadline = Instant::now() + CLOSE_WAIT_BUDGET;
        while self.store.reading_in_flight() > 0 && Instant::now() < deadline {
            std::thread::sleep(CLOSE_POLL_INTERVAL);
        }

        let _compile_guard = self.compile_lock.lock();
        if self.mode == ArchiveMode::Store {
            let bytes = self.store.finalize()?;
            std::fs::write(&self.path, bytes)?;
        }
        Ok(())
    }

    pub fn global() -> Option<&'static SharedCodeArchive> {
        ARCHIVE.get()
    }
}

fn archive_file_name(path: &std::path::Path) -> PathBuf {
    // Open Question carried from the distilled spec, preserved faithfully:
    // only the last path component is used as the on-disk name. See
    // DESIGN.md for why the full path isn't.
    path.file_name().map(PathBuf::from).unwrap_or_else(|| path.to_path_buf())
}

/// Open the global archive for reading. No-ops (leaves [`SharedCodeArchive::global`]
/// `None`) if `config.archive_path` is empty, if an archive is already open,
/// or if the file doesn't exist, is truncated, or carries a mismatched
/// [`FORMAT_VERSION`] — in every case the runtime simply recompiles.
pub fn init_read(config: &ArchiveConfig) -> ArchiveResult<()> {
    if config.archive_path.as_os_str().is_empty() || ARCHIVE.get().is_some() {
        return Ok(());
    }
    let path = archive_file_name(&config.archive_path);
    let Some(store) = ArtifactStore::open_read(&path)? else {
        return Ok(());
    };
    let _ = ARCHIVE.set(SharedCodeArchive {
        store,
        mode: ArchiveMode::Load,
        path,
        verify: config.verify,
        closing: AtomicBool::new(false),
        compile_lock: Mutex::new(()),
    });
    Ok(())
}

/// Open the global archive for writing. No-op if `config.archive_path` is
/// empty or an archive is already open.
pub fn init_write(config: &ArchiveConfig) {
    if config.archive_path.as_os_str().is_empty() || ARCHIVE.get().is_some() {
        return;
    }
    let path = archive_file_name(&config.archive_path);
    let store = ArtifactStore::open_write(config.reserved_store_size);
    let _ = ARCHIVE.set(SharedCodeArchive {
        store,
        mode: ArchiveMode::Store,
        path,
        verify: config.verify,
        closing: AtomicBool::new(false),
        compile_lock: Mutex::new(()),
    });
}

/// Close the global archive, if one is open. A no-op otherwise.
pub fn close() -> ArchiveResult<()> {
    match SharedCodeArchive::global() {
        Some(archive) => archive.close(),
        None => Ok(()),
    }
}

/// `Ok(false)` when no archive is open or it isn't in write mode — matches
/// the "no-op/`Ok(false)` when absent" contract for the top-level free
/// functions.
pub fn store_stub(id: u32, name: &str, code: &[u8]) -> ArchiveResult<bool> {
    match SharedCodeArchive::global() {
        Some(archive) if archive.mode == ArchiveMode::Store => archive.store.store_stub(id, name, code),
        _ => Ok(false),
    }
}

pub fn load_stub(id: u32, name: &str, dst: &mut [u8]) -> ArchiveResult<bool> {
    match SharedCodeArchive::global() {
        Some(archive) if archive.mode == ArchiveMode::Load => archive.store.load_stub(id, name, dst),
        _ => Ok(false),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn store_blob(
    name: &str,
    sections: &[CodeSection],
    relocations: &[Relocation],
    immediates: &[Option<ValueRef>],
    resolver: &dyn SymbolResolver,
) -> ArchiveResult<bool> {
    match SharedCodeArchive::global() {
        Some(archive) if archive.mode == ArchiveMode::Store => {
            let table = address_table().lock();
            archive.store.store_blob(name, sections, relocations, immediates, &table, resolver)
        }
        _ => Ok(false),
    }
}

pub fn load_blob(new_origin: usize) -> ArchiveResult<Option<LoadedFunction<'static>>> {
    match SharedCodeArchive::global() {
        Some(archive) if archive.mode == ArchiveMode::Load => {
            let table = address_table().lock();
            archive.store.load_blob(&table, new_origin)
        }
        _ => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn store_function(
    module_checksum: &[u8; 32],
    func_index: u32,
    decompile: u32,
    name: &str,
    sections: &[CodeSection],
    stack_maps: &[StackMapEntry],
    deopt_info: &[DeoptInfo],
    relocations: &[Relocation],
    immediates: &[Option<ValueRef>],
    resolver: &dyn SymbolResolver,
) -> ArchiveResult<Option<EntryHandle>> {
    match SharedCodeArchive::global() {
        Some(archive) if archive.mode == ArchiveMode::Store => {
            let table = address_table().lock();
            archive.store.store_function(
                module_checksum, func_index, decompile, name, sections, stack_maps, deopt_info,
                relocations, immediates, &table, resolver,
            )
        }
        _ => Ok(None),
    }
}

/// Under `verify` mode the archive still decodes to validate itself but
/// always reports a miss, so the caller falls back to recompiling.
pub fn load_function(
    module_checksum: &[u8; 32],
    func_index: u32,
    decompile: u32,
    new_origin: usize,
) -> ArchiveResult<Option<LoadedFunction<'static>>> {
    match SharedCodeArchive::global() {
        Some(archive) if archive.mode == ArchiveMode::Load => {
            let table = address_table().lock();
            let result = archive.store.load_function(module_checksum, func_index, decompile, &table, new_origin)?;
            if archive.verify {
                Ok(None)
            } else {
                Ok(result)
            }
        }
        _ => Ok(None),
    }
}
