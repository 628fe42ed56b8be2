//! Binary codec helpers
//!
//! Byte order handling and fixed-width numeric reads/writes shared by the
//! pack and unpack engines.
//!
//! # Design Principles
//!
//! - **Directive-agnostic**: No format-string logic lives here
//! - **Type-safe**: `ByteOrder` enum instead of endianness flags
//! - **Buffer-generic**: Writes go through `BufMut`, reads through `Buf`

pub mod byte_order;
pub mod conversions;

pub use byte_order::ByteOrder;
pub use conversions::*;
