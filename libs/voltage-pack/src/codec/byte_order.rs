//! Byte order representation for directive encoding
//!
//! Directives either fix their byte order (`n`, `N`, `v`, `V`, `e`, `g`, ...)
//! or follow the host, which callers may override per token with the
//! `<` / `>` modifiers.

use serde::Serialize;

/// Byte order of a multi-byte value
///
/// For 32-bit value `0x12345678`:
/// - `BigEndian`: [0x12, 0x34, 0x56, 0x78]
/// - `LittleEndian`: [0x78, 0x56, 0x34, 0x12]
/// - `Native`: whichever of the two the executing host uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Host byte order, resolved at encode/decode time
    Native,

    /// Big-endian (most significant byte first)
    ///
    /// Network byte order.
    BigEndian,

    /// Little-endian (least significant byte first)
    LittleEndian,
}

impl ByteOrder {
    /// Map an explicit-order modifier character (`<` or `>`)
    pub fn from_modifier(modifier: char) -> Option<Self> {
        match modifier {
            '<' => Some(Self::LittleEndian),
            '>' => Some(Self::BigEndian),
            _ => None,
        }
    }

    /// Resolve `Native` to the concrete order of the executing host
    #[inline]
    pub fn resolve(self) -> Self {
        match self {
            Self::Native if cfg!(target_endian = "big") => Self::BigEndian,
            Self::Native => Self::LittleEndian,
            concrete => concrete,
        }
    }

    /// Get descriptive name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::BigEndian => "big-endian",
            Self::LittleEndian => "little-endian",
        }
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for ByteOrder {
    /// Directives without an explicit order follow the host
    fn default() -> Self {
        Self::Native
    }
}
