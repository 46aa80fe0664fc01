//! Encoding of attribute defaults into the byte layouts firmware expects.
//!
//! Numbers are first turned into fixed-width big-endian bytes. Values
//! that fit the inline budget stay in that form (numeric order); larger
//! ones go to the long defaults array in the configured table endianness.
//! Strings always go to the long defaults array, length prefix first
//! (little endian), padded with zeros to the attribute size.

use matter_data_model::{AttributeDef, DefaultAttributeValue};
use serde::Serialize;
use tracing::trace;

use crate::error::{Error, Location, Result};
use crate::literal::parse_literal;
use crate::options::{CompilerOptions, Endianness};
use crate::types::{LengthPrefix, StorageClass, TypeClass, TypeInfo, TypeSize};

/// Min/max entries only hold 16-bit values.
pub const MIN_MAX_MAX_SIZE: u16 = 2;

/// Where the default of a packed attribute lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DefaultValueRef {
    Empty,
    /// Big-endian bytes of the value, at most the inline budget wide.
    Inline(Vec<u8>),
    /// Byte offset into the long defaults array.
    LongDefaultsIndex(u32),
    /// Index into the min/max array.
    MinMaxIndex(u32),
}

impl DefaultValueRef {
    /// The numeric value of an inline default.
    pub fn inline_value(&self) -> Option<u64> {
        match self {
            DefaultValueRef::Inline(bytes) => {
                Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongDefaultEntry {
    pub index: u32,
    pub bytes: Vec<u8>,
    /// Source attribute, for diagnostics only.
    pub attribute: String,
}

/// Default and bounds of a bounded attribute, as 16-bit values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MinMaxEntry {
    pub default: u16,
    pub min: u16,
    pub max: u16,
}

/// Encoded default before table indices are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedDefault {
    Empty,
    Inline(Vec<u8>),
    Long(Vec<u8>),
    MinMax(MinMaxEntry),
}

/// Whether an attribute gets a min/max entry instead of a plain default.
///
/// Strings have no numeric bounds and external attributes never
/// populate any defaults table.
pub fn uses_min_max(attr: &AttributeDef, resolved: &TypeSize) -> bool {
    attr.is_bounded() && resolved.storage != StorageClass::External && !resolved.info.is_string()
}

/// Encodes the default of `attr` given its resolved type and size.
pub fn encode_default(
    attr: &AttributeDef,
    resolved: &TypeSize,
    options: &CompilerOptions,
    location: &Location,
) -> Result<EncodedDefault> {
    if resolved.storage == StorageClass::External {
        return Ok(EncodedDefault::Empty);
    }
    if uses_min_max(attr, resolved) {
        return encode_min_max(attr, resolved, location).map(EncodedDefault::MinMax);
    }

    match resolved.info.class {
        TypeClass::String(prefix) => encode_string_default(attr, prefix, resolved.size, location),
        TypeClass::Atomic | TypeClass::Enum | TypeClass::Bitmap => {
            encode_numeric_default(attr, resolved, options, location)
        }
        TypeClass::Struct | TypeClass::Array => Ok(EncodedDefault::Empty),
    }
}

fn authored_default(attr: &AttributeDef) -> Option<&str> {
    attr.default_value
        .as_deref()
        .filter(|text| !text.trim().is_empty())
}

fn encode_numeric_default(
    attr: &AttributeDef,
    resolved: &TypeSize,
    options: &CompilerOptions,
    location: &Location,
) -> Result<EncodedDefault> {
    let width = resolved.size;
    let bytes = match authored_default(attr) {
        None if attr.flags.nullable => null_default(attr, &resolved.info, width, location)?,
        None => return Ok(EncodedDefault::Empty),
        Some(text) => literal_bytes(text, &resolved.info, width, location)?,
    };

    if width > options.inline_budget {
        Ok(EncodedDefault::Long(in_table_order(bytes, options.endianness)))
    } else {
        Ok(EncodedDefault::Inline(bytes))
    }
}

fn encode_string_default(
    attr: &AttributeDef,
    prefix: LengthPrefix,
    size: u16,
    location: &Location,
) -> Result<EncodedDefault> {
    let size = usize::from(size);
    match attr.default_value.as_deref() {
        None if attr.flags.nullable => {
            let mut bytes = prefix.null_marker().to_vec();
            bytes.resize(size.max(bytes.len()), 0);
            Ok(EncodedDefault::Long(bytes))
        }
        None | Some("") => Ok(EncodedDefault::Empty),
        Some(text) => {
            let invalid = |reason: String| Error::InvalidDefault {
                location: location.clone(),
                value: text.to_string(),
                reason,
            };
            if text.len() + usize::from(prefix.len()) > size {
                return Err(invalid(format!(
                    "{} bytes do not fit a string of {} bytes",
                    text.len(),
                    size
                )));
            }
            string_bytes(text, prefix, size)
                .map(EncodedDefault::Long)
                .ok_or_else(|| {
                    invalid(format!(
                        "{} bytes exceed the {}-byte length limit of the type",
                        text.len(),
                        prefix.max_len()
                    ))
                })
        }
    }
}

fn encode_min_max(attr: &AttributeDef, resolved: &TypeSize, location: &Location) -> Result<MinMaxEntry> {
    let width = resolved.size;
    if width > MIN_MAX_MAX_SIZE {
        return Err(Error::OversizedBoundedAttribute {
            location: location.clone(),
            size: width,
        });
    }
    let info = &resolved.info;

    let default = match authored_default(attr) {
        None if attr.flags.nullable => null_default(attr, info, width, location)?,
        None => vec![0; usize::from(width)],
        Some(text) => literal_bytes(text, info, width, location)?,
    };
    let min = match attr.min.as_deref() {
        Some(text) => literal_bytes(text, info, width, location)?,
        None => type_min_bytes(info, width),
    };
    let max = match attr.max.as_deref() {
        Some(text) => literal_bytes(text, info, width, location)?,
        None => type_max_bytes(info, width),
    };

    Ok(MinMaxEntry {
        default: widen_to_u16(&default, info.signed),
        min: widen_to_u16(&min, info.signed),
        max: widen_to_u16(&max, info.signed),
    })
}

fn null_default(attr: &AttributeDef, info: &TypeInfo, width: u16, location: &Location) -> Result<Vec<u8>> {
    null_sentinel(info, width).ok_or_else(|| Error::UnsupportedNullFloat {
        location: location.clone(),
        type_name: attr.type_name.clone(),
    })
}

fn literal_bytes(text: &str, info: &TypeInfo, width: u16, location: &Location) -> Result<Vec<u8>> {
    parse_literal(text)
        .and_then(|value| numeric_bytes(&value, info, width))
        .map_err(|reason| Error::InvalidDefault {
            location: location.clone(),
            value: text.to_string(),
            reason,
        })
}

/// Big-endian null pattern of a nullable fixed-width type.
///
/// Unsigned types use all ones, signed types their minimum value.
/// Floating point types have no sentinel.
pub fn null_sentinel(info: &TypeInfo, width: u16) -> Option<Vec<u8>> {
    if info.float {
        return None;
    }
    if info.signed {
        Some(type_min_bytes(info, width))
    } else {
        Some(vec![0xFF; usize::from(width)])
    }
}

fn type_min_bytes(info: &TypeInfo, width: u16) -> Vec<u8> {
    let mut bytes = vec![0; usize::from(width)];
    if info.signed {
        if let Some(first) = bytes.first_mut() {
            *first = 0x80;
        }
    }
    bytes
}

fn type_max_bytes(info: &TypeInfo, width: u16) -> Vec<u8> {
    let mut bytes = vec![0xFF; usize::from(width)];
    if info.signed {
        if let Some(first) = bytes.first_mut() {
            *first = 0x7F;
        }
    }
    bytes
}

/// Sign-extends (for signed types) a value of at most 2 bytes to 16 bits.
fn widen_to_u16(bytes: &[u8], signed: bool) -> u16 {
    let value = bytes.iter().fold(0u16, |acc, b| (acc << 8) | u16::from(*b));
    match bytes {
        [single] if signed && single & 0x80 != 0 => value | 0xFF00,
        _ => value,
    }
}

/// Fixed-width big-endian bytes of a parsed value.
///
/// Decimal values must fit the range of the type, signed or not. Hex
/// literals are raw bit patterns and only need to fit the width.
pub fn numeric_bytes(value: &DefaultAttributeValue, info: &TypeInfo, width: u16) -> std::result::Result<Vec<u8>, String> {
    if width > 8 {
        return Err(format!("numeric values wider than 8 bytes are not supported ({} bytes)", width));
    }
    match value {
        DefaultAttributeValue::Bool(b) => unsigned_bytes(u64::from(*b), width),
        DefaultAttributeValue::Hex(bits) => unsigned_bytes(*bits, width),
        DefaultAttributeValue::Number(n) if info.float => float_bytes(*n as f64, width),
        DefaultAttributeValue::Number(n) if info.signed => i64::try_from(*n)
            .map_err(|_| format!("{} is out of range for a signed {}-byte value", n, width))
            .and_then(|i| signed_bytes(i, width)),
        DefaultAttributeValue::Number(n) => unsigned_bytes(*n, width),
        DefaultAttributeValue::Signed(i) if info.float => float_bytes(*i as f64, width),
        DefaultAttributeValue::Signed(i) if info.signed => signed_bytes(*i, width),
        DefaultAttributeValue::Signed(i) => match u64::try_from(*i) {
            Ok(n) => unsigned_bytes(n, width),
            Err(_) => Err(format!("{} is negative but the type is unsigned", i)),
        },
        DefaultAttributeValue::Float(f) if info.float => float_bytes(*f, width),
        DefaultAttributeValue::Float(f) => Err(format!("{} is not an integer", f)),
    }
}

fn unsigned_bytes(value: u64, width: u16) -> std::result::Result<Vec<u8>, String> {
    let width = usize::from(width);
    if width < 8 && value >> (8 * width) != 0 {
        return Err(format!("{} does not fit in {} bytes", value, width));
    }
    Ok(value.to_be_bytes()[8 - width..].to_vec())
}

fn signed_bytes(value: i64, width: u16) -> std::result::Result<Vec<u8>, String> {
    let width = usize::from(width);
    if width < 8 {
        let limit = 1i64 << (8 * width - 1);
        if !(-limit..limit).contains(&value) {
            return Err(format!("{} does not fit in a signed {}-byte value", value, width));
        }
    }
    Ok(value.to_be_bytes()[8 - width..].to_vec())
}

fn float_bytes(value: f64, width: u16) -> std::result::Result<Vec<u8>, String> {
    match width {
        4 => Ok((value as f32).to_bits().to_be_bytes().to_vec()),
        8 => Ok(value.to_bits().to_be_bytes().to_vec()),
        other => Err(format!("no {}-byte floating point encoding", other)),
    }
}

/// Length prefix (little endian), the characters, then zero fill up to `size`.
fn string_bytes(text: &str, prefix: LengthPrefix, size: usize) -> Option<Vec<u8>> {
    let len = u16::try_from(text.len()).ok().filter(|len| *len <= prefix.max_len())?;
    let mut bytes = match prefix {
        LengthPrefix::OneByte => vec![u8::try_from(len).ok()?],
        LengthPrefix::TwoByte => len.to_le_bytes().to_vec(),
    };
    bytes.extend_from_slice(text.as_bytes());
    bytes.resize(size.max(bytes.len()), 0);
    Some(bytes)
}

fn in_table_order(mut bytes: Vec<u8>, endianness: Endianness) -> Vec<u8> {
    if endianness == Endianness::Little && bytes.len() <= 8 {
        bytes.reverse();
    }
    bytes
}

/// The long defaults and min/max arrays, filled in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultsTables {
    pub long_defaults: Vec<LongDefaultEntry>,
    pub min_max: Vec<MinMaxEntry>,
    long_defaults_size: u32,
}

impl DefaultsTables {
    /// Appends `encoded` to the matching table and returns its reference.
    pub fn place(&mut self, encoded: EncodedDefault, attribute: &str) -> DefaultValueRef {
        match encoded {
            EncodedDefault::Empty => DefaultValueRef::Empty,
            EncodedDefault::Inline(bytes) => DefaultValueRef::Inline(bytes),
            EncodedDefault::Long(bytes) => {
                let index = self.long_defaults_size;
                trace!("long default for '{}' at {}: {:02X?}", attribute, index, bytes);
                self.long_defaults_size += bytes.len() as u32;
                self.long_defaults.push(LongDefaultEntry {
                    index,
                    bytes,
                    attribute: attribute.to_string(),
                });
                DefaultValueRef::LongDefaultsIndex(index)
            }
            EncodedDefault::MinMax(entry) => {
                let index = self.min_max.len() as u32;
                trace!("min/max for '{}' at {}: {:?}", attribute, index, entry);
                self.min_max.push(entry);
                DefaultValueRef::MinMaxIndex(index)
            }
        }
    }

    /// Total bytes in the long defaults array.
    pub fn long_defaults_size(&self) -> u32 {
        self.long_defaults_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{resolve_size, TypeRegistry};
    use rstest::rstest;

    fn attribute(type_name: &str, default: Option<&str>) -> AttributeDef {
        AttributeDef {
            name: "attr".into(),
            code: 5,
            type_name: type_name.into(),
            default_value: default.map(String::from),
            ..Default::default()
        }
    }

    fn encode_with(attr: &AttributeDef, storage: StorageClass, options: &CompilerOptions) -> Result<EncodedDefault> {
        let location = Location::default();
        let resolved = resolve_size(attr, storage, &TypeRegistry::builtin(), options, &location)?;
        encode_default(attr, &resolved, options, &location)
    }

    fn encode(attr: &AttributeDef) -> Result<EncodedDefault> {
        encode_with(attr, StorageClass::Ram, &CompilerOptions::default())
    }

    #[test]
    fn wide_values_become_long_defaults() {
        let attr = attribute("uint32", Some("1000"));
        assert_eq!(encode(&attr), Ok(EncodedDefault::Long(vec![0xE8, 0x03, 0x00, 0x00])));

        let big = CompilerOptions {
            endianness: Endianness::Big,
            ..Default::default()
        };
        assert_eq!(
            encode_with(&attr, StorageClass::Ram, &big),
            Ok(EncodedDefault::Long(vec![0x00, 0x00, 0x03, 0xE8]))
        );
    }

    #[rstest]
    #[case("int8u", "0x1F", vec![0x1F])]
    #[case("int16u", "1000", vec![0x03, 0xE8])]
    #[case("int16s", "-2", vec![0xFF, 0xFE])]
    #[case("boolean", "true", vec![0x01])]
    #[case("enum8", "0", vec![0x00])]
    fn narrow_values_stay_inline(#[case] type_name: &str, #[case] default: &str, #[case] bytes: Vec<u8>) {
        assert_eq!(
            encode(&attribute(type_name, Some(default))),
            Ok(EncodedDefault::Inline(bytes))
        );
    }

    #[test]
    fn inline_budget_is_configurable() {
        let options = CompilerOptions {
            inline_budget: 4,
            ..Default::default()
        };
        let attr = attribute("int32u", Some("1000"));
        assert_eq!(
            encode_with(&attr, StorageClass::Ram, &options),
            Ok(EncodedDefault::Inline(vec![0x00, 0x00, 0x03, 0xE8]))
        );
    }

    #[test]
    fn negative_and_float_values_are_twos_complement_and_ieee() {
        assert_eq!(
            encode(&attribute("int32s", Some("-2"))),
            Ok(EncodedDefault::Long(vec![0xFE, 0xFF, 0xFF, 0xFF]))
        );
        assert_eq!(
            encode(&attribute("single", Some("1.5"))),
            Ok(EncodedDefault::Long(vec![0x00, 0x00, 0xC0, 0x3F]))
        );
        assert_eq!(
            encode(&attribute("double", Some("2"))),
            Ok(EncodedDefault::Long(vec![0, 0, 0, 0, 0, 0, 0x00, 0x40]))
        );
    }

    #[rstest]
    #[case("int8u", 1)]
    #[case("int16u", 2)]
    #[case("int24u", 3)]
    #[case("int32u", 4)]
    #[case("int64u", 8)]
    #[case("enum16", 2)]
    #[case("bitmap32", 4)]
    fn unsigned_null_sentinel_is_all_ones(#[case] type_name: &str, #[case] width: usize) {
        let registry = TypeRegistry::builtin();
        let info = registry.lookup(type_name).expect("builtin");
        assert_eq!(null_sentinel(info, width as u16), Some(vec![0xFF; width]));
    }

    #[rstest]
    #[case("int8s", 1)]
    #[case("int16s", 2)]
    #[case("int32s", 4)]
    #[case("int64s", 8)]
    fn signed_null_sentinel_is_minimum(#[case] type_name: &str, #[case] width: usize) {
        let registry = TypeRegistry::builtin();
        let info = registry.lookup(type_name).expect("builtin");
        let mut expected = vec![0x00; width];
        expected[0] = 0x80;
        assert_eq!(null_sentinel(info, width as u16), Some(expected));
    }

    #[test]
    fn nullable_without_default_uses_sentinel() {
        let mut attr = attribute("int16s", None);
        attr.flags.nullable = true;
        assert_eq!(encode(&attr), Ok(EncodedDefault::Inline(vec![0x80, 0x00])));

        attr.type_name = "int32u".into();
        assert_eq!(encode(&attr), Ok(EncodedDefault::Long(vec![0xFF; 4])));

        attr.flags.nullable = false;
        assert_eq!(encode(&attr), Ok(EncodedDefault::Empty));
    }

    #[test]
    fn nullable_float_without_default_is_unsupported() {
        let mut attr = attribute("single", None);
        attr.flags.nullable = true;
        assert!(matches!(encode(&attr), Err(Error::UnsupportedNullFloat { .. })));
    }

    #[test]
    fn strings_are_prefixed_and_padded() {
        let mut attr = attribute("char_string", Some("abc"));
        attr.max_length = Some(5);
        assert_eq!(
            encode(&attr),
            Ok(EncodedDefault::Long(vec![3, b'a', b'b', b'c', 0, 0]))
        );

        attr.type_name = "long_char_string".into();
        assert_eq!(
            encode(&attr),
            Ok(EncodedDefault::Long(vec![3, 0, b'a', b'b', b'c', 0, 0]))
        );
    }

    #[test]
    fn string_endianness_does_not_swap_text() {
        let mut attr = attribute("char_string", Some("ab"));
        attr.max_length = Some(2);
        let big = CompilerOptions {
            endianness: Endianness::Big,
            ..Default::default()
        };
        assert_eq!(
            encode_with(&attr, StorageClass::Ram, &big),
            Ok(EncodedDefault::Long(vec![2, b'a', b'b']))
        );
    }

    #[test]
    fn null_strings_use_length_markers() {
        let mut attr = attribute("char_string", None);
        attr.max_length = Some(2);
        attr.flags.nullable = true;
        assert_eq!(encode(&attr), Ok(EncodedDefault::Long(vec![0xFF, 0, 0])));

        attr.type_name = "long_octet_string".into();
        assert_eq!(encode(&attr), Ok(EncodedDefault::Long(vec![0xFF, 0xFF, 0, 0])));
    }

    #[test]
    fn empty_and_external_strings_have_no_default() {
        let mut attr = attribute("char_string", Some(""));
        attr.max_length = Some(8);
        assert_eq!(encode(&attr), Ok(EncodedDefault::Empty));

        attr.default_value = Some("hello".into());
        assert_eq!(
            encode_with(&attr, StorageClass::External, &CompilerOptions::default()),
            Ok(EncodedDefault::Empty)
        );
    }

    #[test]
    fn oversized_defaults_are_rejected() {
        assert!(matches!(
            encode(&attribute("int8u", Some("300"))),
            Err(Error::InvalidDefault { .. })
        ));
        assert!(matches!(
            encode(&attribute("int8s", Some("-129"))),
            Err(Error::InvalidDefault { .. })
        ));
        assert!(matches!(
            encode(&attribute("int16u", Some("1.5"))),
            Err(Error::InvalidDefault { .. })
        ));

        let mut text = attribute("char_string", Some("too long"));
        text.max_length = Some(3);
        assert!(matches!(encode(&text), Err(Error::InvalidDefault { .. })));
    }

    #[rstest]
    #[case("int8s", "200")]
    #[case("int8s", "128")]
    #[case("int8s", "-129")]
    #[case("int16s", "40000")]
    #[case("int8u", "-1")]
    #[case("int32u", "-5")]
    fn decimal_values_must_fit_the_type_range(#[case] type_name: &str, #[case] default: &str) {
        assert!(matches!(
            encode(&attribute(type_name, Some(default))),
            Err(Error::InvalidDefault { .. })
        ));
    }

    #[rstest]
    #[case("int8s", "127", vec![0x7F])]
    #[case("int8s", "-128", vec![0x80])]
    #[case("int8s", "0x80", vec![0x80])]
    #[case("int16s", "0xFFFF", vec![0xFF, 0xFF])]
    fn signed_edges_and_hex_bit_patterns(#[case] type_name: &str, #[case] default: &str, #[case] bytes: Vec<u8>) {
        assert_eq!(
            encode(&attribute(type_name, Some(default))),
            Ok(EncodedDefault::Inline(bytes))
        );
    }

    #[rstest]
    #[case("int8u", Some("-1"), None)]
    #[case("int8s", Some("-10"), Some("200"))]
    #[case("int8s", Some("128"), None)]
    fn out_of_range_bounds_are_rejected(
        #[case] type_name: &str,
        #[case] min: Option<&str>,
        #[case] max: Option<&str>,
    ) {
        let mut attr = attribute(type_name, Some("5"));
        attr.flags.writable = true;
        attr.min = min.map(String::from);
        attr.max = max.map(String::from);
        assert!(matches!(encode(&attr), Err(Error::InvalidDefault { .. })));
    }

    #[test]
    fn long_string_prefix_holds_the_full_length() {
        let mut attr = attribute("long_char_string", Some("a".repeat(300).as_str()));
        attr.max_length = Some(300);
        let Ok(EncodedDefault::Long(bytes)) = encode(&attr) else {
            panic!("expected a long default");
        };
        assert_eq!(&bytes[..2], &[0x2C, 0x01]);
        assert_eq!(bytes.len(), 302);

        attr.type_name = "char_string".into();
        assert!(matches!(encode(&attr), Err(Error::StringTooLong { .. })));
    }

    #[test]
    fn short_string_default_never_overflows_its_prefix() {
        let mut attr = attribute("char_string", Some("a".repeat(300).as_str()));
        attr.max_length = Some(300);
        let resolved = TypeSize {
            info: *TypeRegistry::builtin().lookup("char_string").expect("builtin"),
            storage: StorageClass::Ram,
            size: 301,
            nominal: 301,
        };
        assert!(matches!(
            encode_default(&attr, &resolved, &CompilerOptions::default(), &Location::default()),
            Err(Error::InvalidDefault { .. })
        ));
    }

    #[test]
    fn bounded_attributes_get_min_max() {
        let mut attr = attribute("int8s", Some("0"));
        attr.flags.writable = true;
        attr.min = Some("-10".into());
        attr.max = Some("10".into());
        assert_eq!(
            encode(&attr),
            Ok(EncodedDefault::MinMax(MinMaxEntry {
                default: 0,
                min: 0xFFF6,
                max: 10,
            }))
        );
    }

    #[test]
    fn bounds_default_to_type_range() {
        let mut attr = attribute("int16u", Some("0x0100"));
        attr.flags.bounded = true;
        assert_eq!(
            encode(&attr),
            Ok(EncodedDefault::MinMax(MinMaxEntry {
                default: 0x0100,
                min: 0,
                max: 0xFFFF,
            }))
        );

        let mut signed = attribute("int8s", None);
        signed.flags.bounded = true;
        signed.flags.nullable = true;
        assert_eq!(
            encode(&signed),
            Ok(EncodedDefault::MinMax(MinMaxEntry {
                default: 0xFF80,
                min: 0xFF80,
                max: 0x007F,
            }))
        );
    }

    #[test]
    fn bounded_attribute_wider_than_two_bytes_is_an_error() {
        let mut attr = attribute("uint32", Some("1000"));
        attr.flags.bounded = true;
        attr.min = Some("0".into());
        attr.max = Some("100".into());
        assert!(matches!(
            encode(&attr),
            Err(Error::OversizedBoundedAttribute { size: 4, .. })
        ));
    }

    #[test]
    fn long_defaults_indices_are_a_prefix_sum() {
        let mut tables = DefaultsTables::default();
        let refs: Vec<_> = [vec![1u8; 4], vec![2u8; 8], vec![3u8; 3]]
            .into_iter()
            .map(|bytes| tables.place(EncodedDefault::Long(bytes), "attr"))
            .collect();

        assert_eq!(
            refs,
            vec![
                DefaultValueRef::LongDefaultsIndex(0),
                DefaultValueRef::LongDefaultsIndex(4),
                DefaultValueRef::LongDefaultsIndex(12),
            ]
        );
        for pair in tables.long_defaults.windows(2) {
            assert_eq!(pair[1].index, pair[0].index + pair[0].bytes.len() as u32);
        }
        assert_eq!(tables.long_defaults_size(), 15);
    }

    #[test]
    fn inline_values_read_back_as_numbers() {
        assert_eq!(DefaultValueRef::Inline(vec![0x03, 0xE8]).inline_value(), Some(1000));
        assert_eq!(DefaultValueRef::Empty.inline_value(), None);
    }
}
