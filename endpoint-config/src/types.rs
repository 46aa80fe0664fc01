//! Type classification and storage sizing of attributes.
//!
//! The registry knows the builtin atomic types (with their ZCL type
//! ids) and whatever enums, bitmaps and structs the data model
//! declares. Sizing an attribute then depends on its classification,
//! its storage option and, for strings, the configured sizing policy.

use std::collections::HashMap;

use matter_data_model::{AttributeDef, BitmapDef, CompilationInput, EnumDef, StorageOption, StructDef};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Location, Result};
use crate::options::{CompilerOptions, StringSizing};

pub mod zcl_type {
    pub const BOOLEAN: u8 = 0x10;
    pub const BITMAP8: u8 = 0x18;
    pub const BITMAP16: u8 = 0x19;
    pub const BITMAP32: u8 = 0x1B;
    pub const BITMAP64: u8 = 0x1F;
    pub const ENUM8: u8 = 0x30;
    pub const ENUM16: u8 = 0x31;
    pub const OCTET_STRING: u8 = 0x41;
    pub const CHAR_STRING: u8 = 0x42;
    pub const LONG_OCTET_STRING: u8 = 0x43;
    pub const LONG_CHAR_STRING: u8 = 0x44;
    pub const ARRAY: u8 = 0x48;
    pub const STRUCT: u8 = 0x4C;
}

/// Width of the length prefix in front of string data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum LengthPrefix {
    OneByte,
    TwoByte,
}

impl LengthPrefix {
    pub fn len(self) -> u16 {
        match self {
            LengthPrefix::OneByte => 1,
            LengthPrefix::TwoByte => 2,
        }
    }

    /// Longest content the prefix can describe; the all-ones value marks null.
    pub fn max_len(self) -> u16 {
        match self {
            LengthPrefix::OneByte => 0xFE,
            LengthPrefix::TwoByte => 0xFFFE,
        }
    }

    /// Length prefix value marking a null string.
    pub fn null_marker(self) -> &'static [u8] {
        match self {
            LengthPrefix::OneByte => &[0xFF],
            LengthPrefix::TwoByte => &[0xFF, 0xFF],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeClass {
    Atomic,
    Enum,
    Bitmap,
    Struct,
    Array,
    String(LengthPrefix),
}

/// What the registry knows about a type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeInfo {
    pub class: TypeClass,
    pub type_id: u8,
    /// Fixed width in bytes. `None` for strings, structs and arrays.
    pub size: Option<u16>,
    pub signed: bool,
    pub float: bool,
}

impl TypeInfo {
    const fn atomic(type_id: u8, size: u16, signed: bool, float: bool) -> Self {
        Self {
            class: TypeClass::Atomic,
            type_id,
            size: Some(size),
            signed,
            float,
        }
    }

    const fn string(type_id: u8, prefix: LengthPrefix) -> Self {
        Self {
            class: TypeClass::String(prefix),
            type_id,
            size: None,
            signed: false,
            float: false,
        }
    }

    pub const STRUCT: TypeInfo = TypeInfo {
        class: TypeClass::Struct,
        type_id: zcl_type::STRUCT,
        size: None,
        signed: false,
        float: false,
    };

    pub const ARRAY: TypeInfo = TypeInfo {
        class: TypeClass::Array,
        type_id: zcl_type::ARRAY,
        size: None,
        signed: false,
        float: false,
    };

    pub fn is_string(&self) -> bool {
        matches!(self.class, TypeClass::String(_))
    }
}

const ATOMICS: &[(&str, TypeInfo)] = &[
    ("boolean", TypeInfo::atomic(zcl_type::BOOLEAN, 1, false, false)),
    ("bitmap8", TypeInfo::atomic(zcl_type::BITMAP8, 1, false, false)),
    ("bitmap16", TypeInfo::atomic(zcl_type::BITMAP16, 2, false, false)),
    ("bitmap32", TypeInfo::atomic(zcl_type::BITMAP32, 4, false, false)),
    ("bitmap64", TypeInfo::atomic(zcl_type::BITMAP64, 8, false, false)),
    ("int8u", TypeInfo::atomic(0x20, 1, false, false)),
    ("int16u", TypeInfo::atomic(0x21, 2, false, false)),
    ("int24u", TypeInfo::atomic(0x22, 3, false, false)),
    ("int32u", TypeInfo::atomic(0x23, 4, false, false)),
    ("int40u", TypeInfo::atomic(0x24, 5, false, false)),
    ("int48u", TypeInfo::atomic(0x25, 6, false, false)),
    ("int56u", TypeInfo::atomic(0x26, 7, false, false)),
    ("int64u", TypeInfo::atomic(0x27, 8, false, false)),
    ("int8s", TypeInfo::atomic(0x28, 1, true, false)),
    ("int16s", TypeInfo::atomic(0x29, 2, true, false)),
    ("int24s", TypeInfo::atomic(0x2A, 3, true, false)),
    ("int32s", TypeInfo::atomic(0x2B, 4, true, false)),
    ("int40s", TypeInfo::atomic(0x2C, 5, true, false)),
    ("int48s", TypeInfo::atomic(0x2D, 6, true, false)),
    ("int56s", TypeInfo::atomic(0x2E, 7, true, false)),
    ("int64s", TypeInfo::atomic(0x2F, 8, true, false)),
    ("enum8", TypeInfo::atomic(zcl_type::ENUM8, 1, false, false)),
    ("enum16", TypeInfo::atomic(zcl_type::ENUM16, 2, false, false)),
    ("single", TypeInfo::atomic(0x39, 4, true, true)),
    ("double", TypeInfo::atomic(0x3A, 8, true, true)),
    ("octet_string", TypeInfo::string(zcl_type::OCTET_STRING, LengthPrefix::OneByte)),
    ("char_string", TypeInfo::string(zcl_type::CHAR_STRING, LengthPrefix::OneByte)),
    ("long_octet_string", TypeInfo::string(zcl_type::LONG_OCTET_STRING, LengthPrefix::TwoByte)),
    ("long_char_string", TypeInfo::string(zcl_type::LONG_CHAR_STRING, LengthPrefix::TwoByte)),
    ("array", TypeInfo::ARRAY),
    ("struct", TypeInfo::STRUCT),
];

/// Alternative spellings and semantic types, mapped to their underlying atomic.
const ALIASES: &[(&str, &str)] = &[
    ("bool", "boolean"),
    ("uint8", "int8u"),
    ("uint16", "int16u"),
    ("uint24", "int24u"),
    ("uint32", "int32u"),
    ("uint64", "int64u"),
    ("int8", "int8s"),
    ("int16", "int16s"),
    ("int24", "int24s"),
    ("int32", "int32s"),
    ("int64", "int64s"),
    ("float", "single"),
    ("percent", "int8u"),
    ("percent100ths", "int16u"),
    ("epoch_s", "int32u"),
    ("epoch_us", "int64u"),
    ("elapsed_s", "int32u"),
    ("systime_us", "int64u"),
    ("vendor_id", "int16u"),
    ("fabric_idx", "int8u"),
    ("fabric_id", "int64u"),
    ("node_id", "int64u"),
    ("group_id", "int16u"),
    ("endpoint_no", "int16u"),
    ("cluster_id", "int32u"),
    ("attrib_id", "int32u"),
    ("command_id", "int32u"),
    ("event_id", "int32u"),
    ("devtype_id", "int32u"),
    ("field_id", "int32u"),
    ("trans_id", "int32u"),
    ("data_ver", "int32u"),
    ("entry_idx", "int16u"),
    ("action_id", "int8u"),
    ("status", "enum8"),
    ("temperature", "int16s"),
];

/// Answers "what is this type and how wide is it".
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeInfo>,
}

impl TypeRegistry {
    /// Registry holding only the builtin atomic types.
    pub fn builtin() -> Self {
        let mut types: HashMap<String, TypeInfo> = ATOMICS
            .iter()
            .map(|(name, info)| (name.to_string(), *info))
            .collect();
        for (alias, target) in ALIASES {
            if let Some(info) = types.get(*target).copied() {
                types.insert(alias.to_string(), info);
            }
        }
        Self { types }
    }

    pub fn from_input(input: &CompilationInput) -> Self {
        let mut registry = Self::builtin();
        input.enums.iter().for_each(|e| registry.add_enum(e));
        input.bitmaps.iter().for_each(|b| registry.add_bitmap(b));
        input.structs.iter().for_each(|s| registry.add_struct(s));
        registry
    }

    pub fn add_enum(&mut self, def: &EnumDef) {
        let (type_id, size) = match def.size {
            0 => (zcl_type::ENUM8, None),
            1 => (zcl_type::ENUM8, Some(1)),
            2 => (zcl_type::ENUM16, Some(2)),
            other => {
                warn!(
                    "enum '{}' is {} bytes wide, encoding it as enum16",
                    def.name, other
                );
                (zcl_type::ENUM16, Some(2))
            }
        };
        self.insert(
            &def.name,
            TypeInfo {
                class: TypeClass::Enum,
                type_id,
                size,
                signed: false,
                float: false,
            },
        );
    }

    pub fn add_bitmap(&mut self, def: &BitmapDef) {
        let (type_id, size) = match def.size {
            0 => (zcl_type::BITMAP8, None),
            1 => (zcl_type::BITMAP8, Some(1)),
            2 => (zcl_type::BITMAP16, Some(2)),
            3..=4 => (zcl_type::BITMAP32, Some(4)),
            5..=8 => (zcl_type::BITMAP64, Some(8)),
            other => {
                warn!(
                    "bitmap '{}' is {} bytes wide, encoding it as bitmap64",
                    def.name, other
                );
                (zcl_type::BITMAP64, Some(8))
            }
        };
        self.insert(
            &def.name,
            TypeInfo {
                class: TypeClass::Bitmap,
                type_id,
                size,
                signed: false,
                float: false,
            },
        );
    }

    pub fn add_struct(&mut self, def: &StructDef) {
        self.insert(&def.name, TypeInfo::STRUCT);
    }

    fn insert(&mut self, name: &str, info: TypeInfo) {
        self.types.insert(name.to_lowercase(), info);
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(&name.to_lowercase())
    }
}

/// Storage class of an attribute once its storage option is judged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum StorageClass {
    Ram,
    NonVolatile,
    External,
}

impl StorageClass {
    pub fn resolve(option: &StorageOption, location: &Location, lenient: bool) -> Result<Self> {
        match option {
            StorageOption::Ram => Ok(StorageClass::Ram),
            StorageOption::Nvm => Ok(StorageClass::NonVolatile),
            StorageOption::External => Ok(StorageClass::External),
            StorageOption::Other(other) if lenient => {
                warn!("{}: ignoring unrecognized storage option '{}'", location, other);
                Ok(StorageClass::Ram)
            }
            StorageOption::Other(other) => Err(Error::UnrecognizedStorageOption {
                location: location.clone(),
                option: other.clone(),
            }),
        }
    }
}

/// Resolved type and storage footprint of one attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSize {
    pub info: TypeInfo,
    pub storage: StorageClass,
    /// Bytes taken in the packed attribute storage; 0 for external attributes.
    pub size: u16,
    /// Size of the type itself, for display. 0 when the type has none.
    pub nominal: u16,
}

/// Figures out how many bytes `attr` occupies.
///
/// External attributes never fail: they take no storage, and their
/// nominal size is reported as 0 when the type has none.
pub fn resolve_size(
    attr: &AttributeDef,
    storage: StorageClass,
    registry: &TypeRegistry,
    options: &CompilerOptions,
    location: &Location,
) -> Result<TypeSize> {
    let info = if attr.is_list {
        Some(TypeInfo::ARRAY)
    } else {
        registry.lookup(&attr.type_name).copied()
    };

    let nominal = match info {
        None => None,
        Some(info) => match info.class {
            TypeClass::String(prefix) => {
                string_size(attr, prefix, storage, options.string_sizing, location)?
            }
            TypeClass::Struct | TypeClass::Array => None,
            TypeClass::Atomic | TypeClass::Enum | TypeClass::Bitmap => info.size.filter(|s| *s > 0),
        },
    };

    match (storage, info, nominal) {
        (StorageClass::External, info, nominal) => {
            if info.is_none() {
                debug!("{}: unknown type '{}' stored externally", location, attr.type_name);
            }
            Ok(TypeSize {
                info: info.unwrap_or(TypeInfo::STRUCT),
                storage,
                size: 0,
                nominal: nominal.unwrap_or(0),
            })
        }
        (_, Some(info), Some(size)) => Ok(TypeSize {
            info,
            storage,
            size,
            nominal: size,
        }),
        _ => Err(Error::UnresolvableSize {
            location: location.clone(),
            type_name: attr.type_name.clone(),
        }),
    }
}

fn string_size(
    attr: &AttributeDef,
    prefix: LengthPrefix,
    storage: StorageClass,
    sizing: StringSizing,
    location: &Location,
) -> Result<Option<u16>> {
    let default_len = attr.default_value.as_ref().map(String::len);

    let write_once = !attr.flags.writable && storage != StorageClass::External;
    let content = match (sizing, attr.max_length, default_len) {
        (StringSizing::MinimizeWriteOnce, _, Some(len)) if write_once => len,
        (_, Some(max), _) => usize::from(max),
        (_, None, Some(len)) => len,
        (_, None, None) => return Ok(None),
    };

    match u16::try_from(content).ok().filter(|len| *len <= prefix.max_len()) {
        Some(len) => Ok(Some(len + prefix.len())),
        None if storage == StorageClass::External => Ok(None),
        None => Err(Error::StringTooLong {
            location: location.clone(),
            length: content,
            limit: prefix.max_len(),
        }),
    }
}
