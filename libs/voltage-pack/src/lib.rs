//! voltage-pack - Directive-driven binary pack/unpack engine for VoltageEMS
//!
//! Converts an ordered list of values into bytes according to a compact
//! directive string, and back again.
//!
//! # Architecture
//!
//! - **Directive Table** (`directive`): static codec descriptor per directive character
//! - **Format Parser** (`format`): directive string → `Program` of operations
//! - **Pack Engine** (`pack`): values + program → bytes
//! - **Unpack Engine** (`unpack`): bytes + program → values
//! - **Codec helpers** (`codec`): byte order and fixed-width numeric conversions
//!
//! # Example
//!
//! ```rust
//! use voltage_pack::{pack, unpack, Value};
//!
//! let values = vec![Value::from(1), Value::from(-100), Value::from("abcdef")];
//! let packed = pack(&values, "Nc a6").unwrap();
//! assert_eq!(&packed[..5], &[0x00, 0x00, 0x00, 0x01, 0x9C]);
//!
//! let unpacked = unpack(&packed, "Nc a6").unwrap();
//! assert_eq!(unpacked, values);
//! ```
//!
//! # Counts
//!
//! | Count | Pack | Unpack |
//! |-------|------|--------|
//! | none | one value | one value |
//! | `n` | `n` values (`a`/`A`/`Z`: `n` bytes of one value) | `n` values (`a`/`A`/`Z`: `n` bytes) |
//! | `*` | every value left | as many whole values as the data holds |
//!
//! Both engines are pure functions of their inputs; a parsed `Program` holds
//! no mutable state and can be shared between threads.

pub mod codec;
pub mod directive;
pub mod error;
pub mod format;
pub mod pack;
pub mod unpack;
pub mod value;

use bytes::Bytes;

// Re-export core types
pub use codec::ByteOrder;
pub use directive::{lookup, DirectiveDescriptor, DirectiveKind};
pub use error::{PackError, Result};
pub use format::{CountSpec, Modifiers, Operation, Program};
pub use pack::pack_program;
pub use unpack::unpack_program;
pub use value::Value;

/// Pack `values` according to the directive string `format`
///
/// Fails with `Format`/`UnknownDirective` for a bad directive string,
/// `Argument` when values run out, `TypeMismatch` for a value of the wrong
/// kind, and `Encoding` for a value the directive cannot represent.
pub fn pack(values: &[Value], format: &str) -> Result<Bytes> {
    let program = Program::parse(format)?;
    pack_program(values, &program)
}

/// Unpack `data` according to the directive string `format`
///
/// Fails with `Format`/`UnknownDirective` for a bad directive string,
/// `TruncatedData` when a fixed-width read runs past the end of `data`, and
/// `MalformedData` for undecodable UTF-8, BER or base64 input.
pub fn unpack(data: &[u8], format: &str) -> Result<Vec<Value>> {
    let program = Program::parse(format)?;
    unpack_program(data, &program)
}
