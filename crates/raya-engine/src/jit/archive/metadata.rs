//! Symbolic encode/decode of class, method, and value references.
//!
//! References are encoded symbolically (module specifier + name, not a raw
//! pointer or bytecode index) so they survive a `compiler::module::resolver`
//! graph change between store and load — a later launch may resolve the same
//! specifier to a different cached package version. Resolving the symbolic
//! form back to a live index is handed off to a [`ModuleLookup`]
//! implementation supplied by the caller (the module resolver and export
//! tables are external collaborators, per SPEC_FULL.md §1).

use super::io::{ArchiveReader, ArchiveWriter};
use super::error::{ArchiveError, ArchiveResult};

/// Tag byte preceding every encoded reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Null = 0,
    NoData = 1,
    Class = 2,
    Method = 3,
    Primitive = 4,
    InternedString = 5,
    StdLoader = 6,
    PackageLoader = 7,
}

impl Tag {
    fn from_u8(v: u8) -> ArchiveResult<Self> {
        Ok(match v {
            0 => Tag::Null,
            1 => Tag::NoData,
            2 => Tag::Class,
            3 => Tag::Method,
            4 => Tag::Primitive,
            5 => Tag::InternedString,
            6 => Tag::StdLoader,
            7 => Tag::PackageLoader,
            other => return Err(ArchiveError::MalformedEntry(other as usize)),
        })
    }
}

/// Basic-type tag for [`ValueRef::Primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTag {
    Number,
    Bool,
    String,
    Undefined,
}

impl PrimitiveTag {
    fn to_u8(self) -> u8 {
        match self {
            PrimitiveTag::Number => 0,
            PrimitiveTag::Bool => 1,
            PrimitiveTag::String => 2,
            PrimitiveTag::Undefined => 3,
        }
    }

    fn from_u8(v: u8) -> ArchiveResult<Self> {
        Ok(match v {
            0 => PrimitiveTag::Number,
            1 => PrimitiveTag::Bool,
            2 => PrimitiveTag::String,
            3 => PrimitiveTag::Undefined,
            other => return Err(ArchiveError::MalformedEntry(other as usize)),
        })
    }
}

/// A symbolic object/value reference as recorded in a relocation's immediate
/// payload. Not yet resolved against any module graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRef {
    /// Raya `null`.
    Null,
    /// Sentinel "not a value" slot (e.g. an unset optional field default).
    NoData,
    /// A class mirror, named by the module that exports it plus the class
    /// name.
    Class { module_specifier: String, class_name: String },
    /// A method reference: holder class, method name, and arity (used to
    /// disambiguate overloads the way `find_method` would).
    Method {
        module_specifier: String,
        class_name: String,
        method_name: String,
        arity: u32,
    },
    /// A primitive-type class mirror.
    Primitive(PrimitiveTag),
    /// An interned string literal, carried by value.
    InternedString(String),
    /// The standard-library module loader (`std:` namespace).
    StdLoader,
    /// The package-manager-resolved module loader (`raya-pm`).
    PackageLoader,
}

impl ValueRef {
    pub fn encode(&self, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
        match self {
            ValueRef::Null => writer.emit_u8(Tag::Null as u8),
            ValueRef::NoData => writer.emit_u8(Tag::NoData as u8),
            ValueRef::Class { module_specifier, class_name } => {
                writer.emit_u8(Tag::Class as u8)?;
                writer.emit_str(module_specifier)?;
                writer.emit_str(class_name)
            }
            ValueRef::Method { module_specifier, class_name, method_name, arity } => {
                writer.emit_u8(Tag::Method as u8)?;
                writer.emit_str(module_specifier)?;
                writer.emit_str(class_name)?;
                writer.emit_str(method_name)?;
                writer.emit_u32(*arity)
            }
            ValueRef::Primitive(tag) => {
                writer.emit_u8(Tag::Primitive as u8)?;
                writer.emit_u8(tag.to_u8())
            }
            ValueRef::InternedString(s) => {
                writer.emit_u8(Tag::InternedString as u8)?;
                writer.emit_str(s)
            }
            ValueRef::StdLoader => writer.emit_u8(Tag::StdLoader as u8),
            ValueRef::PackageLoader => writer.emit_u8(Tag::PackageLoader as u8),
        }
    }

    pub fn decode(reader: &mut ArchiveReader) -> ArchiveResult<Self> {
        Ok(match Tag::from_u8(reader.read_u8()?)? {
            Tag::Null => ValueRef::Null,
            Tag::NoData => ValueRef::NoData,
            Tag::Class => ValueRef::Class {
                module_specifier: reader.read_str()?.to_string(),
                class_name: reader.read_str()?.to_string(),
            },
            Tag::Method => ValueRef::Method {
                module_specifier: reader.read_str()?.to_string(),
                class_name: reader.read_str()?.to_string(),
                method_name: reader.read_str()?.to_string(),
                arity: reader.read_u32()?,
            },
            Tag::Primitive => ValueRef::Primitive(PrimitiveTag::from_u8(reader.read_u8()?)?),
            Tag::InternedString => ValueRef::InternedString(reader.read_str()?.to_string()),
            Tag::StdLoader => ValueRef::StdLoader,
            Tag::PackageLoader => ValueRef::PackageLoader,
        })
    }
}

/// A class or method resolved back to a live index, returned by
/// [`ModuleLookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedClass {
    pub class_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub class_index: u32,
    pub function_id: u32,
}

/// Narrow interface onto `compiler::module::resolver` and a module's export
/// table, supplied by the caller. Kept abstract here so this module doesn't
/// need to depend on the full compiler pipeline to encode/decode
/// references.
pub trait ModuleLookup {
    /// Resolve `class_name` exported by `module_specifier`. Implementations
    /// should retry with the null/standard-library loader on failure, per
    /// SPEC_FULL.md §4.5, before giving up.
    fn find_class(&self, module_specifier: &str, class_name: &str) -> Option<ResolvedClass>;

    /// Resolve a method by holder class, name, and arity.
    fn find_method(&self, class: ResolvedClass, method_name: &str, arity: u32) -> Option<ResolvedMethod>;
}

/// What resolving a [`ValueRef`] against a [`ModuleLookup`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Null,
    NoData,
    Class(ResolvedClass),
    Method(ResolvedMethod),
    Primitive(PrimitiveTag),
    InternedString(String),
    StdLoader,
    PackageLoader,
}

/// Resolve a decoded [`ValueRef`] against `lookup`.
///
/// Returns `Ok(None)` (not an error) when symbolic resolution fails — the
/// spec treats this as an artifact-local `lookup_failed`, not an
/// archive-fatal condition; the caller discards the current artifact and the
/// archive stays usable for others.
pub fn resolve(value: &ValueRef, lookup: &dyn ModuleLookup) -> ArchiveResult<Option<Resolved>> {
    Ok(match value {
        ValueRef::Null => Some(Resolved::Null),
        ValueRef::NoData => Some(Resolved::NoData),
        ValueRef::Primitive(tag) => Some(Resolved::Primitive(*tag)),
        ValueRef::InternedString(s) => Some(Resolved::InternedString(s.clone())),
        ValueRef::StdLoader => Some(Resolved::StdLoader),
        ValueRef::PackageLoader => Some(Resolved::PackageLoader),
        ValueRef::Class { module_specifier, class_name } => {
            match lookup.find_class(module_specifier, class_name) {
                Some(class) => Some(Resolved::Class(class)),
                None => match lookup.find_class("std:", class_name) {
                    Some(class) => Some(Resolved::Class(class)),
                    None => None,
                },
            }
        }
        ValueRef::Method { module_specifier, class_name, method_name, arity } => {
            let class = match lookup.find_class(module_specifier, class_name) {
                Some(class) => class,
                None => match lookup.find_class("std:", class_name) {
                    Some(class) => class,
                    None => return Ok(None),
                },
            };
            lookup.find_method(class, method_name, *arity).map(Resolved::Method)
        }
    })
}
