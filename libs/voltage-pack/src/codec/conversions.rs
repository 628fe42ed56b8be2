//! Numeric conversions with byte order support
//!
//! Provides functions for converting between:
//! - Integers (as `i128`) ↔ 1..=8 byte two's-complement fields
//! - `f64` ↔ 4/8 byte IEEE 754 fields
//! - Unsigned integers ↔ BER compressed (base-128) sequences
//! - Hex digits ↔ nibbles
//!
//! All fixed-width conversions take a `ByteOrder`; `Native` is resolved to
//! the host order at call time.

use bytes::{Buf, BufMut};

use super::ByteOrder;

/// Widest fixed-width integer field, in bytes
pub const MAX_INT_WIDTH: usize = 8;

// ============================================================================
// Integer Range Checks
// ============================================================================

/// Inclusive range accepted for an integer field of `width` bytes
///
/// The range is the union of the signed and unsigned ranges, so `-1` and
/// `255` are both valid one-byte values (both encode as `0xFF`).
pub fn int_range(width: usize) -> (i128, i128) {
    debug_assert!((1..=MAX_INT_WIDTH).contains(&width));
    let bits = 8 * width as u32;
    (-(1i128 << (bits - 1)), (1i128 << bits) - 1)
}

/// Check whether `value` can be stored in `width` bytes
#[inline]
pub fn fits_width(value: i128, width: usize) -> bool {
    let (min, max) = int_range(width);
    (min..=max).contains(&value)
}

// ============================================================================
// Integer Fields
// ============================================================================

/// Write the low `width` bytes of `value` in two's complement
///
/// Callers check `fits_width` first; out-of-range values are masked.
pub fn put_int<B: BufMut>(buf: &mut B, value: i128, width: usize, order: ByteOrder) {
    let raw = value as u64;
    match order.resolve() {
        ByteOrder::LittleEndian => buf.put_uint_le(raw, width),
        _ => buf.put_uint(raw, width),
    }
}

/// Read a `width`-byte integer, sign-extending when `signed`
///
/// Panics if fewer than `width` bytes remain; callers check first.
pub fn get_int<B: Buf>(buf: &mut B, width: usize, signed: bool, order: ByteOrder) -> i128 {
    let raw = match order.resolve() {
        ByteOrder::LittleEndian => buf.get_uint_le(width),
        _ => buf.get_uint(width),
    };

    if signed {
        let shift = 64 - 8 * width as u32;
        (((raw << shift) as i64) >> shift) as i128
    } else {
        raw as i128
    }
}

// ============================================================================
// Float Fields
// ============================================================================

/// Narrow an `f64` to `f32`, rejecting finite values that overflow
pub fn narrow_f32(value: f64) -> Option<f32> {
    let narrowed = value as f32;
    if value.is_finite() && narrowed.is_infinite() {
        None
    } else {
        Some(narrowed)
    }
}

/// Write a 4 or 8 byte IEEE 754 value
///
/// 4-byte fields store `value as f32`; range is checked by the caller.
pub fn put_float<B: BufMut>(buf: &mut B, value: f64, width: usize, order: ByteOrder) {
    let little = order.resolve() == ByteOrder::LittleEndian;
    match (width, little) {
        (4, true) => buf.put_f32_le(value as f32),
        (4, false) => buf.put_f32(value as f32),
        (_, true) => buf.put_f64_le(value),
        (_, false) => buf.put_f64(value),
    }
}

/// Read a 4 or 8 byte IEEE 754 value, widened to `f64`
pub fn get_float<B: Buf>(buf: &mut B, width: usize, order: ByteOrder) -> f64 {
    let little = order.resolve() == ByteOrder::LittleEndian;
    match (width, little) {
        (4, true) => buf.get_f32_le() as f64,
        (4, false) => buf.get_f32() as f64,
        (_, true) => buf.get_f64_le(),
        (_, false) => buf.get_f64(),
    }
}

// ============================================================================
// BER Compressed Integers
// ============================================================================

/// Failure while decoding a BER compressed integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BerError {
    /// Data ended before a byte without the continuation bit
    Incomplete,
    /// Value does not fit in 128 bits
    Overflow,
}

/// Write `value` as base-128 digits, most significant first
///
/// Every byte except the last has the high bit set.
pub fn put_ber<B: BufMut>(buf: &mut B, mut value: u128) {
    let mut digits = [0u8; 19];
    let mut start = digits.len() - 1;
    digits[start] = (value & 0x7F) as u8;
    value >>= 7;

    while value > 0 {
        start -= 1;
        digits[start] = (value & 0x7F) as u8 | 0x80;
        value >>= 7;
    }

    buf.put_slice(&digits[start..]);
}

/// Read one BER compressed integer
pub fn get_ber<B: Buf>(buf: &mut B) -> Result<u128, BerError> {
    let mut value = 0u128;
    loop {
        if !buf.has_remaining() {
            return Err(BerError::Incomplete);
        }
        let byte = buf.get_u8();
        if value > (u128::MAX >> 7) {
            return Err(BerError::Overflow);
        }
        value = (value << 7) | (byte & 0x7F) as u128;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

// ============================================================================
// Hex Digits
// ============================================================================

/// Value of an ASCII hex digit
#[inline]
pub fn hex_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Lowercase ASCII hex digit for a nibble
#[inline]
pub fn nibble_to_hex(nibble: u8) -> u8 {
    b"0123456789abcdef"[(nibble & 0x0F) as usize]
}
