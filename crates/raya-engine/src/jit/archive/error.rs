//! Error types for the shared compiled-code archive
//!
//! Two independent failure axes, matching the archive's lifecycle state
//! machine: [`ArchiveError`] is always archive-fatal (it poisons the whole
//! archive), while per-artifact misses (name mismatch aside, see
//! `store::ArtifactStore`) are represented as `Ok(false)` rather than an
//! error at all.

use std::io;

/// Archive-fatal error: I/O, bounds/alignment violation, version mismatch,
/// malformed entry, over-capacity store, or a relocation/address-table
/// programmer error.
///
/// Any `Err(ArchiveError)` returned from a public `SharedCodeArchive` or
/// `ArtifactStore` method sets the archive's `failed` flag; all later calls
/// short-circuit to `Err(ArchiveError::Poisoned)`.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Underlying file I/O failed.
    #[error("archive I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read or write went outside the bounds of the archive buffer.
    #[error("archive bounds violation at offset {offset} (buffer size {size})")]
    OutOfBounds { offset: usize, size: usize },

    /// The store-side staging buffer doesn't have room for this write.
    #[error("store capacity exceeded: need {needed} bytes, {available} available")]
    StoreCapacityExceeded { needed: usize, available: usize },

    /// The on-disk header version doesn't match `FORMAT_VERSION`.
    #[error("archive version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// An entry's recorded bounds or `idx` don't match the catalog invariant.
    #[error("malformed entry at index {0}")]
    MalformedEntry(usize),

    /// `AddressTable::id_for_address`/`address_for_id` had no mapping for an
    /// address or id that the caller's workload actually needs. This means
    /// the table is out of sync with `jit::backend::traits`, not a routine
    /// miss.
    #[error("no address-table entry for {0}")]
    UnregisteredAddress(String),

    /// A `Relocation`/`RelocationTarget` variant this codec doesn't know how
    /// to encode or fix up.
    #[error("unsupported relocation kind: {0}")]
    UnsupportedRelocation(String),

    /// A repacked `external_word`-style address needed more bytes than the
    /// slot reserved at store time.
    #[error("relocation repack overflow at code offset {0}")]
    RepackOverflow(usize),

    /// The archive already transitioned to `Failed`; no further operations
    /// are attempted.
    #[error("archive is poisoned (previous operation failed)")]
    Poisoned,
}

/// Result type used throughout the archive module.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
