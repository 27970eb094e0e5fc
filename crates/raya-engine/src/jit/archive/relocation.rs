//! Encode/decode of per-section relocation arrays plus the fix-up state
//! machine.
//!
//! Generalizes `jit::backend::traits::Relocation`/`RelocationTarget`. Unlike
//! the upstream archive this format is based on, Raya never serializes a
//! relocation to a packed `relocInfo` byte stream — `CompiledCode::relocations`
//! is already a typed `Vec<Relocation>` — so there is nothing to re-walk
//! byte-for-byte. This codec replays that `Vec` directly: one record per
//! relocation (`code_offset` + a type tag + an address identity), plus a
//! trailing sequence of `ValueRef` immediates for relocations that carry an
//! inline metadata/value reference.

use crate::jit::backend::traits::{Relocation, RelocationTarget, SymbolResolver};

use super::address_table::{AddressId, AddressTable};
use super::error::{ArchiveError, ArchiveResult};
use super::io::{ArchiveReader, ArchiveWriter};
use super::metadata::ValueRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelocKind {
    /// Call to a `RuntimeHelper` trampoline.
    RuntimeHelperCall = 0,
    /// Call to another JIT-compiled function.
    JitFunctionCall = 1,
    /// An absolute address resolvable through the `AddressTable` (a shared
    /// stub or call blob referenced as data, not a call target).
    AbsoluteAddress = 2,
    /// An absolute address carrying an inline class/method/value reference;
    /// decoded via `metadata::resolve` by the caller rather than patched
    /// here (constructing the live value is a VM-heap concern, out of
    /// scope for this module).
    MetadataImmediate = 3,
    /// A section-local word (an intra-function branch target or
    /// constant-pool reference materialized as an absolute address in the
    /// instruction stream). Fixed up by delta, no `AddressTable` lookup.
    SectionWord = 4,
}

impl RelocKind {
    fn from_u8(v: u8) -> ArchiveResult<Self> {
        Ok(match v {
            0 => RelocKind::RuntimeHelperCall,
            1 => RelocKind::JitFunctionCall,
            2 => RelocKind::AbsoluteAddress,
            3 => RelocKind::MetadataImmediate,
            4 => RelocKind::SectionWord,
            other => return Err(ArchiveError::UnsupportedRelocation(format!("tag {other}"))),
        })
    }
}

/// `code_offset` is only used to name the relocation if `id` is a
/// [`AddressId::Distance`] that doesn't fit the `i32` slot the wire format
/// reserves for it — the repack-overflow case HotSpot's `external_word`
/// encoding hits when a dynamic symbol sits further than 2GiB from the
/// process anchor.
fn encode_address_id(writer: &mut ArchiveWriter, id: AddressId, code_offset: usize) -> ArchiveResult<()> {
    match id {
        AddressId::NoFixup => writer.emit_u8(0),
        AddressId::Table(table_id) => {
            writer.emit_u8(1)?;
            writer.emit_u32(table_id)
        }
        AddressId::Distance(distance) => {
            let narrowed = i32::try_from(distance).map_err(|_| ArchiveError::RepackOverflow(code_offset))?;
            writer.emit_u8(2)?;
            writer.emit_i32(narrowed)
        }
    }
}

fn decode_address_id(reader: &mut ArchiveReader) -> ArchiveResult<AddressId> {
    match reader.read_u8()? {
        0 => Ok(AddressId::NoFixup),
        1 => Ok(AddressId::Table(reader.read_u32()?)),
        2 => Ok(AddressId::Distance(reader.read_i32()? as i64)),
        other => Err(ArchiveError::MalformedEntry(other as usize)),
    }
}

/// A decoded relocation, ready for the caller to apply to the destination
/// code buffer.
#[derive(Debug, Clone)]
pub enum FixupAction {
    /// Patch the 8-byte absolute pointer at `code_offset` with the resolved
    /// address of a `RuntimeHelper`/`JitFunction` call target, or a plain
    /// `AddressTable`-resolvable absolute address.
    PatchAddress { code_offset: usize, address: usize },
    /// Patch the 8-byte absolute pointer at `code_offset` by adding `delta`
    /// (new section origin minus old section origin) to whatever value is
    /// already embedded there.
    PatchByDelta { code_offset: usize, delta: i64 },
    /// A metadata/value immediate at `code_offset`; the caller resolves it
    /// via `metadata::resolve` and patches it using VM-specific knowledge
    /// this module doesn't have.
    MetadataImmediate { code_offset: usize, value: ValueRef },
    /// Store-time target was `usize::MAX` ("no fix-up needed"); nothing to
    /// do.
    NoFixup,
}

/// Encode `relocations` for one code section.
///
/// `immediates[i]` is `Some(value)` when `relocations[i]` is an `Absolute`
/// relocation carrying an inline metadata/value reference rather than a
/// plain address; it must be `None` for every other `RelocationTarget`
/// variant.
pub fn encode(
    writer: &mut ArchiveWriter,
    table: &AddressTable,
    resolver: &dyn SymbolResolver,
    relocations: &[Relocation],
    immediates: &[Option<ValueRef>],
) -> ArchiveResult<()> {
    debug_assert_eq!(relocations.len(), immediates.len());
    writer.emit_u32(relocations.len() as u32)?;

    for (reloc, immediate) in relocations.iter().zip(immediates.iter()) {
        writer.emit_u32(reloc.code_offset as u32)?;

        if let Some(_value) = immediate {
            writer.emit_u8(RelocKind::MetadataImmediate as u8)?;
            continue;
        }

        match &reloc.target {
            RelocationTarget::RuntimeHelper(helper) => {
                writer.emit_u8(RelocKind::RuntimeHelperCall as u8)?;
                encode_address_id(writer, table.id_for_runtime_helper(*helper), reloc.code_offset)?;
            }
            RelocationTarget::JitFunction(func_index) => {
                let addr = resolver.resolve_jit_function(*func_index).ok_or_else(|| {
                    ArchiveError::UnregisteredAddress(format!("jit function {func_index}"))
                })?;
                writer.emit_u8(RelocKind::JitFunctionCall as u8)?;
                encode_address_id(writer, table.id_for_address(addr)?, reloc.code_offset)?;
            }
            RelocationTarget::Absolute(addr) => match table.id_for_address(*addr) {
                Ok(id) => {
                    writer.emit_u8(RelocKind::AbsoluteAddress as u8)?;
                    encode_address_id(writer, id, reloc.code_offset)?;
                }
                Err(_) => {
                    writer.emit_u8(RelocKind::SectionWord as u8)?;
                    writer.emit_u64(*addr as u64)?;
                }
            },
        }
    }

    // Trailing immediates, in iteration order — this keeps the decode
    // index `j` in lockstep with the relocation array without needing a
    // separate marker field.
    for immediate in immediates.iter().flatten() {
        immediate.encode(writer)?;
    }
    Ok(())
}

/// One decoded relocation record prior to resolving `AbsoluteAddress`, kept
/// around so [`decode`] can report a consistent list of [`FixupAction`]s in
/// one pass.
enum RawRecord {
    RuntimeHelperCall(AddressId),
    JitFunctionCall(AddressId),
    AbsoluteAddress(AddressId),
    MetadataImmediate,
    SectionWord(usize),
}

/// Decode the relocation block for one code section into a list of
/// [`FixupAction`]s, resolving `AddressTable`-backed ids to this process's
/// addresses. `old_origin`/`new_origin` give the section's compile-time and
/// load-time base addresses, for [`FixupAction::PatchByDelta`].
pub fn decode(
    bytes: &[u8],
    table: &AddressTable,
    old_origin: usize,
    new_origin: usize,
) -> ArchiveResult<Vec<FixupAction>> {
    let mut reader = ArchiveReader::new(bytes);
    let count = reader.read_u32()? as usize;

    let mut offsets = Vec::with_capacity(count);
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let code_offset = reader.read_u32()? as usize;
        let kind = RelocKind::from_u8(reader.read_u8()?)?;
        let record = match kind {
            RelocKind::RuntimeHelperCall => RawRecord::RuntimeHelperCall(decode_address_id(&mut reader)?),
            RelocKind::JitFunctionCall => RawRecord::JitFunctionCall(decode_address_id(&mut reader)?),
            RelocKind::AbsoluteAddress => RawRecord::AbsoluteAddress(decode_address_id(&mut reader)?),
            RelocKind::MetadataImmediate => RawRecord::MetadataImmediate,
            RelocKind::SectionWord => RawRecord::SectionWord(reader.read_u64()? as usize),
        };
        offsets.push(code_offset);
        records.push(record);
    }

    let delta = new_origin as i64 - old_origin as i64;
    let mut actions = Vec::with_capacity(count);
    for (code_offset, record) in offsets.into_iter().zip(records.into_iter()) {
        let action = match record {
            RawRecord::RuntimeHelperCall(id) | RawRecord::JitFunctionCall(id) | RawRecord::AbsoluteAddress(id) => {
                match id {
                    AddressId::NoFixup => FixupAction::NoFixup,
                    other => FixupAction::PatchAddress { code_offset, address: table.address_for_id(other)? },
                }
            }
            RawRecord::SectionWord(_orig_addr) => FixupAction::PatchByDelta { code_offset, delta },
            RawRecord::MetadataImmediate => {
                let value = ValueRef::decode(&mut reader)?;
                FixupAction::MetadataImmediate { code_offset, value }
            }
        };
        actions.push(action);
    }
    Ok(actions)
}
