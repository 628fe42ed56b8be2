//! Directive table
//!
//! Static descriptor per directive character: value kind, byte width,
//! signedness and byte order. The engines never branch on the directive
//! character itself, only on the descriptor, so adding a directive is a
//! table entry.
//!
//! | Directive | Kind | Width | Signed | Order |
//! |-----------|------|-------|--------|-------|
//! | `c` / `C` | integer | 1 | yes / no | - |
//! | `s` / `S` | integer | 2 | yes / no | native |
//! | `i` / `I` | integer | 4 | yes / no | native |
//! | `l` / `L` | integer | 4 | yes / no | native |
//! | `q` / `Q` | integer | 8 | yes / no | native |
//! | `j` / `J` | integer | pointer | yes / no | native |
//! | `n` / `N` | integer | 2 / 4 | no | big |
//! | `v` / `V` | integer | 2 / 4 | no | little |
//! | `f` `F` / `d` `D` | float | 4 / 8 | - | native |
//! | `e` / `E` | float | 4 / 8 | - | little |
//! | `g` / `G` | float | 4 / 8 | - | big |
//! | `a` / `A` / `Z` | raw bytes | count | - | null / space / null-terminated |
//! | `x` | padding | 1 | - | - |
//! | `H` / `h` | hex string | count nibbles | - | high / low nibble first |
//! | `B` / `b` | bit string | count bits | - | MSB / LSB first |
//! | `U` | UTF-8 char | 1..=4 | - | - |
//! | `w` | BER integer | variable | - | - |
//! | `m` | base64 | variable | - | - |
//!
//! `_` / `!` (native width) and `<` / `>` (explicit order) are accepted only
//! after `s S i I l L q Q j J`.

use std::ffi::{c_int, c_long, c_longlong, c_short};
use std::mem::size_of;

use serde::Serialize;

use crate::codec::ByteOrder;
use crate::error::{PackError, Result};

/// Padding style of a raw byte string directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawStyle {
    /// `a`: null padded, read verbatim
    NullPadded,
    /// `A`: space padded, trailing spaces and nulls stripped on read
    SpacePadded,
    /// `Z`: null padded, read up to the first null
    NullTerminated,
}

impl RawStyle {
    /// Byte used to pad short values
    pub fn pad_byte(self) -> u8 {
        match self {
            RawStyle::SpacePadded => b' ',
            RawStyle::NullPadded | RawStyle::NullTerminated => 0,
        }
    }
}

/// Digit order inside each byte of a hex or bit string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitOrder {
    /// High nibble / most significant bit first
    HighFirst,
    /// Low nibble / least significant bit first
    LowFirst,
}

/// What a directive encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    Integer,
    Float,
    RawBytes(RawStyle),
    Padding,
    HexString(DigitOrder),
    BitString(DigitOrder),
    Utf8Char,
    BerInteger,
    Base64,
}

impl DirectiveKind {
    /// Check if the count is a repeat count over fixed-width elements
    pub fn is_fixed_width_numeric(self) -> bool {
        matches!(self, DirectiveKind::Integer | DirectiveKind::Float)
    }
}

/// Immutable codec descriptor for one directive character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectiveDescriptor {
    pub directive: char,
    pub kind: DirectiveKind,
    /// Bytes per element; 0 for variable-width kinds
    pub width: usize,
    pub signed: bool,
    pub order: ByteOrder,
    /// Width under the `_` / `!` modifier; `None` when the modifier is not allowed
    pub native_width: Option<usize>,
    pub summary: &'static str,
}

impl DirectiveDescriptor {
    const fn integer(
        directive: char,
        width: usize,
        signed: bool,
        order: ByteOrder,
        summary: &'static str,
    ) -> Self {
        Self {
            directive,
            kind: DirectiveKind::Integer,
            width,
            signed,
            order,
            native_width: None,
            summary,
        }
    }

    const fn platform_integer(
        directive: char,
        width: usize,
        native_width: usize,
        signed: bool,
        summary: &'static str,
    ) -> Self {
        Self {
            native_width: Some(native_width),
            ..Self::integer(directive, width, signed, ByteOrder::Native, summary)
        }
    }

    const fn float(directive: char, width: usize, order: ByteOrder, summary: &'static str) -> Self {
        Self {
            kind: DirectiveKind::Float,
            ..Self::integer(directive, width, false, order, summary)
        }
    }

    const fn variable(directive: char, kind: DirectiveKind, summary: &'static str) -> Self {
        Self {
            kind,
            ..Self::integer(directive, 0, false, ByteOrder::Native, summary)
        }
    }

    /// Check if `<` / `>` may follow this directive
    pub fn accepts_explicit_order(&self) -> bool {
        self.native_width.is_some()
    }

    /// Check if `_` / `!` may follow this directive
    pub fn accepts_native_width(&self) -> bool {
        self.native_width.is_some()
    }
}

const POINTER_WIDTH: usize = size_of::<usize>();

#[rustfmt::skip]
const DIRECTIVES: &[DirectiveDescriptor] = &[
    // 8-bit
    DirectiveDescriptor::integer('c', 1, true, ByteOrder::Native, "signed 8-bit integer"),
    DirectiveDescriptor::integer('C', 1, false, ByteOrder::Native, "unsigned 8-bit integer"),
    // Platform integers (modifiers allowed)
    DirectiveDescriptor::platform_integer('s', 2, size_of::<c_short>(), true, "signed 16-bit integer"),
    DirectiveDescriptor::platform_integer('S', 2, size_of::<c_short>(), false, "unsigned 16-bit integer"),
    DirectiveDescriptor::platform_integer('i', 4, size_of::<c_int>(), true, "signed int"),
    DirectiveDescriptor::platform_integer('I', 4, size_of::<c_int>(), false, "unsigned int"),
    DirectiveDescriptor::platform_integer('l', 4, size_of::<c_long>(), true, "signed 32-bit integer"),
    DirectiveDescriptor::platform_integer('L', 4, size_of::<c_long>(), false, "unsigned 32-bit integer"),
    DirectiveDescriptor::platform_integer('q', 8, size_of::<c_longlong>(), true, "signed 64-bit integer"),
    DirectiveDescriptor::platform_integer('Q', 8, size_of::<c_longlong>(), false, "unsigned 64-bit integer"),
    DirectiveDescriptor::platform_integer('j', POINTER_WIDTH, POINTER_WIDTH, true, "signed pointer-width integer"),
    DirectiveDescriptor::platform_integer('J', POINTER_WIDTH, POINTER_WIDTH, false, "unsigned pointer-width integer"),
    // Fixed byte order
    DirectiveDescriptor::integer('n', 2, false, ByteOrder::BigEndian, "16-bit network order"),
    DirectiveDescriptor::integer('N', 4, false, ByteOrder::BigEndian, "32-bit network order"),
    DirectiveDescriptor::integer('v', 2, false, ByteOrder::LittleEndian, "16-bit little-endian"),
    DirectiveDescriptor::integer('V', 4, false, ByteOrder::LittleEndian, "32-bit little-endian"),
    // IEEE 754
    DirectiveDescriptor::float('f', 4, ByteOrder::Native, "single precision, native order"),
    DirectiveDescriptor::float('F', 4, ByteOrder::Native, "single precision, native order"),
    DirectiveDescriptor::float('d', 8, ByteOrder::Native, "double precision, native order"),
    DirectiveDescriptor::float('D', 8, ByteOrder::Native, "double precision, native order"),
    DirectiveDescriptor::float('e', 4, ByteOrder::LittleEndian, "single precision, little-endian"),
    DirectiveDescriptor::float('E', 8, ByteOrder::LittleEndian, "double precision, little-endian"),
    DirectiveDescriptor::float('g', 4, ByteOrder::BigEndian, "single precision, big-endian"),
    DirectiveDescriptor::float('G', 8, ByteOrder::BigEndian, "double precision, big-endian"),
    // Byte strings
    DirectiveDescriptor::variable('a', DirectiveKind::RawBytes(RawStyle::NullPadded), "byte string, null padded"),
    DirectiveDescriptor::variable('A', DirectiveKind::RawBytes(RawStyle::SpacePadded), "byte string, space padded"),
    DirectiveDescriptor::variable('Z', DirectiveKind::RawBytes(RawStyle::NullTerminated), "null-terminated byte string"),
    DirectiveDescriptor::variable('H', DirectiveKind::HexString(DigitOrder::HighFirst), "hex string, high nibble first"),
    DirectiveDescriptor::variable('h', DirectiveKind::HexString(DigitOrder::LowFirst), "hex string, low nibble first"),
    DirectiveDescriptor::variable('B', DirectiveKind::BitString(DigitOrder::HighFirst), "bit string, MSB first"),
    DirectiveDescriptor::variable('b', DirectiveKind::BitString(DigitOrder::LowFirst), "bit string, LSB first"),
    DirectiveDescriptor::variable('U', DirectiveKind::Utf8Char, "UTF-8 character"),
    DirectiveDescriptor::variable('w', DirectiveKind::BerInteger, "BER compressed integer"),
    DirectiveDescriptor::variable('m', DirectiveKind::Base64, "base64 encoded string"),
    // Padding
    DirectiveDescriptor {
        width: 1,
        ..DirectiveDescriptor::variable('x', DirectiveKind::Padding, "null byte")
    },
];

/// ASCII index into `DIRECTIVES`, offset by one (0 = unregistered)
static INDEX: [u8; 128] = build_index();

const fn build_index() -> [u8; 128] {
    let mut index = [0u8; 128];
    let mut i = 0;
    while i < DIRECTIVES.len() {
        index[DIRECTIVES[i].directive as usize] = (i + 1) as u8;
        i += 1;
    }
    index
}

/// Look up the descriptor for a directive character
pub fn lookup(directive: char) -> Result<&'static DirectiveDescriptor> {
    find(directive).ok_or_else(|| PackError::unknown_directive(directive))
}

/// Look up a descriptor, `None` when the character is not registered
#[inline]
pub fn find(directive: char) -> Option<&'static DirectiveDescriptor> {
    if !directive.is_ascii() {
        return None;
    }
    match INDEX[directive as usize] {
        0 => None,
        slot => DIRECTIVES.get(slot as usize - 1),
    }
}

/// All registered directives in table order
pub fn all() -> &'static [DirectiveDescriptor] {
    DIRECTIVES
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_required_directive_widths() {
        let cases = [
            ('c', 1, true),
            ('C', 1, false),
            ('s', 2, true),
            ('S', 2, false),
            ('l', 4, true),
            ('L', 4, false),
            ('q', 8, true),
            ('Q', 8, false),
            ('n', 2, false),
            ('N', 4, false),
            ('v', 2, false),
            ('V', 4, false),
        ];

        for (directive, width, signed) in cases {
            let desc = lookup(directive).unwrap();
            assert_eq!(desc.kind, DirectiveKind::Integer, "kind of {}", directive);
            assert_eq!(desc.width, width, "width of {}", directive);
            assert_eq!(desc.signed, signed, "signedness of {}", directive);
        }
    }

    #[test]
    fn test_fixed_orders() {
        assert_eq!(lookup('n').unwrap().order, ByteOrder::BigEndian);
        assert_eq!(lookup('N').unwrap().order, ByteOrder::BigEndian);
        assert_eq!(lookup('v').unwrap().order, ByteOrder::LittleEndian);
        assert_eq!(lookup('V').unwrap().order, ByteOrder::LittleEndian);
        assert_eq!(lookup('s').unwrap().order, ByteOrder::Native);
        assert_eq!(lookup('g').unwrap().order, ByteOrder::BigEndian);
        assert_eq!(lookup('e').unwrap().order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_floats_and_strings() {
        let f = lookup('f').unwrap();
        assert_eq!((f.kind, f.width), (DirectiveKind::Float, 4));
        let d = lookup('d').unwrap();
        assert_eq!((d.kind, d.width), (DirectiveKind::Float, 8));

        assert_eq!(
            lookup('a').unwrap().kind,
            DirectiveKind::RawBytes(RawStyle::NullPadded)
        );
        assert_eq!(
            lookup('A').unwrap().kind,
            DirectiveKind::RawBytes(RawStyle::SpacePadded)
        );
        let x = lookup('x').unwrap();
        assert_eq!((x.kind, x.width), (DirectiveKind::Padding, 1));
    }

    #[test]
    fn test_native_width_modifiers() {
        assert_eq!(lookup('s').unwrap().native_width, Some(size_of::<c_short>()));
        assert_eq!(lookup('l').unwrap().native_width, Some(size_of::<c_long>()));
        assert!(lookup('l').unwrap().accepts_explicit_order());
        assert!(!lookup('N').unwrap().accepts_native_width());
        assert!(!lookup('c').unwrap().accepts_explicit_order());
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(lookup('y'), Err(PackError::unknown_directive('y')));
        assert!(find('é').is_none());
        assert!(find('*').is_none());
        assert!(find('X').is_none());
    }

    #[test]
    fn test_table_is_consistent() {
        for desc in all() {
            assert!(desc.directive.is_ascii_graphic());
            assert_eq!(
                find(desc.directive).unwrap(),
                desc,
                "duplicate entry for {}",
                desc.directive
            );
            if desc.kind.is_fixed_width_numeric() {
                assert!(desc.width > 0);
            }
        }
    }

    #[test]
    fn test_descriptor_serializes() {
        let json = serde_json::to_value(lookup('N').unwrap()).unwrap();
        assert_eq!(json["directive"], "N");
        assert_eq!(json["kind"], "integer");
        assert_eq!(json["order"], "big_endian");
        assert_eq!(json["width"], 4);
    }
}
