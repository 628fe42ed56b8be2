//! Unpack engine
//!
//! Walks a `Program` once over a forward-only cursor into the input bytes.
//! Fixed-width numeric directives fail on short data; raw string directives
//! take whatever is left.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{get_ber, get_float, get_int, nibble_to_hex, BerError};
use crate::directive::{DigitOrder, DirectiveKind, RawStyle};
use crate::error::{PackError, Result};
use crate::format::{CountSpec, Operation, Program};
use crate::value::Value;

/// Lenient decoder for line-wrapped base64 (padding optional, trailing bits ignored)
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Unpack `data` according to a parsed program
pub fn unpack_program(data: &[u8], program: &Program) -> Result<Vec<Value>> {
    let mut unpacker = Unpacker::new(data);
    for op in program {
        unpacker.apply(op)?;
    }

    debug!(
        "Unpacked {} values from {} bytes ({} unread)",
        unpacker.out.len(),
        data.len(),
        unpacker.cursor.remaining()
    );
    Ok(unpacker.out)
}

struct Unpacker<'a> {
    cursor: &'a [u8],
    out: Vec<Value>,
}

impl<'a> Unpacker<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: data,
            out: Vec::new(),
        }
    }

    /// Require `needed` unread bytes
    fn require(&self, op: &Operation, needed: usize) -> Result<()> {
        let available = self.cursor.remaining();
        if available < needed {
            return Err(PackError::TruncatedData {
                directive: op.directive,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Take up to `n` bytes without failing on short data
    fn take_up_to(&mut self, n: usize) -> Bytes {
        let n = n.min(self.cursor.remaining());
        self.cursor.copy_to_bytes(n)
    }

    fn apply(&mut self, op: &Operation) -> Result<()> {
        trace!("Unpack {} with {} bytes unread", op, self.cursor.remaining());
        match op.descriptor().kind {
            DirectiveKind::Padding => {
                let n = op.count.resolve(self.cursor.remaining());
                self.cursor.advance(n.min(self.cursor.remaining()));
            },
            DirectiveKind::Integer => {
                let width = op.width();
                let n = op.count.resolve(self.cursor.remaining() / width);
                self.out.reserve(n.min(self.cursor.remaining() / width));
                for _ in 0..n {
                    self.require(op, width)?;
                    let int = get_int(&mut self.cursor, width, op.signed(), op.order());
                    self.out.push(Value::Integer(int));
                }
            },
            DirectiveKind::Float => {
                let width = op.width();
                let n = op.count.resolve(self.cursor.remaining() / width);
                self.out.reserve(n.min(self.cursor.remaining() / width));
                for _ in 0..n {
                    self.require(op, width)?;
                    let float = get_float(&mut self.cursor, width, op.order());
                    self.out.push(Value::Float(float));
                }
            },
            DirectiveKind::RawBytes(style) => {
                let value = self.get_raw(op.count, style);
                self.out.push(Value::Bytes(value));
            },
            DirectiveKind::HexString(order) => {
                let value = self.get_hex(op.count, order);
                self.out.push(Value::Bytes(value));
            },
            DirectiveKind::BitString(order) => {
                let value = self.get_bits(op.count, order);
                self.out.push(Value::Bytes(value));
            },
            DirectiveKind::Utf8Char => self.repeat_variable(op, Self::get_utf8)?,
            DirectiveKind::BerInteger => self.repeat_variable(op, Self::get_ber)?,
            DirectiveKind::Base64 => {
                let value = self.get_base64(op)?;
                self.out.push(Value::Bytes(value));
            },
        }
        Ok(())
    }

    /// `a` / `A` / `Z`
    fn get_raw(&mut self, count: CountSpec, style: RawStyle) -> Bytes {
        if style == RawStyle::NullTerminated && count.is_remaining() {
            // Up to and including the terminator; the value excludes it
            return match self.cursor.iter().position(|&b| b == 0) {
                Some(end) => {
                    let value = self.cursor.copy_to_bytes(end);
                    self.cursor.advance(1);
                    value
                },
                None => self.take_up_to(usize::MAX),
            };
        }

        let chunk = self.take_up_to(count.resolve(usize::MAX));
        match style {
            RawStyle::NullPadded => chunk,
            RawStyle::SpacePadded => {
                let end = chunk
                    .iter()
                    .rposition(|&b| b != b' ' && b != 0)
                    .map_or(0, |i| i + 1);
                chunk.slice(..end)
            },
            RawStyle::NullTerminated => {
                let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
                chunk.slice(..end)
            },
        }
    }

    /// `H` / `h`: count nibbles, clamped to the data
    fn get_hex(&mut self, count: CountSpec, order: DigitOrder) -> Bytes {
        let available = self.cursor.remaining().saturating_mul(2);
        let nibbles = count.resolve(available).min(available);
        let mut digits = BytesMut::with_capacity(nibbles);

        for byte in self.take_up_to(nibbles.div_ceil(2)) {
            let (first, second) = match order {
                DigitOrder::HighFirst => (byte >> 4, byte & 0x0F),
                DigitOrder::LowFirst => (byte & 0x0F, byte >> 4),
            };
            digits.extend_from_slice(&[nibble_to_hex(first), nibble_to_hex(second)]);
        }
        digits.truncate(nibbles);
        digits.freeze()
    }

    /// `B` / `b`: count bits, clamped to the data
    fn get_bits(&mut self, count: CountSpec, order: DigitOrder) -> Bytes {
        let available = self.cursor.remaining().saturating_mul(8);
        let bits = count.resolve(available).min(available);
        let mut digits = BytesMut::with_capacity(bits);

        for byte in self.take_up_to(bits.div_ceil(8)) {
            for i in 0..8 {
                let shift = match order {
                    DigitOrder::HighFirst => 7 - i,
                    DigitOrder::LowFirst => i,
                };
                digits.extend_from_slice(if (byte >> shift) & 1 == 1 { b"1" } else { b"0" });
            }
        }
        digits.truncate(bits);
        digits.freeze()
    }

    /// Repeat a variable-width read; `*` repeats until the data is exhausted
    fn repeat_variable(
        &mut self,
        op: &Operation,
        read: fn(&mut Self, &Operation) -> Result<Value>,
    ) -> Result<()> {
        let n = match op.count {
            CountSpec::Remaining => usize::MAX,
            count => count.resolve(0),
        };
        for _ in 0..n {
            if op.count.is_remaining() && !self.cursor.has_remaining() {
                break;
            }
            let value = read(self, op)?;
            self.out.push(value);
        }
        Ok(())
    }

    /// `U`: one UTF-8 encoded character as its code point
    fn get_utf8(&mut self, op: &Operation) -> Result<Value> {
        self.require(op, 1)?;
        let len = match self.cursor[0] {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            lead => {
                return Err(PackError::malformed(
                    op.directive,
                    format!("invalid UTF-8 lead byte 0x{:02X}", lead),
                ))
            },
        };
        self.require(op, len)?;

        let ch = std::str::from_utf8(&self.cursor[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| PackError::malformed(op.directive, "invalid UTF-8 sequence"))?;
        self.cursor.advance(len);
        Ok(Value::Integer(ch as i128))
    }

    /// `w`: one BER compressed integer
    fn get_ber(&mut self, op: &Operation) -> Result<Value> {
        let available = self.cursor.remaining();
        let value = get_ber(&mut self.cursor).map_err(|e| match e {
            BerError::Incomplete => PackError::TruncatedData {
                directive: op.directive,
                needed: available + 1,
                available,
            },
            BerError::Overflow => PackError::malformed(op.directive, "value exceeds 128 bits"),
        })?;
        let int = i128::try_from(value)
            .map_err(|_| PackError::malformed(op.directive, "value exceeds signed 128-bit range"))?;
        Ok(Value::Integer(int))
    }

    /// `m0`: strict RFC 4648 over everything left
    ///
    /// Otherwise lenient: characters outside the alphabet are skipped and the
    /// segment ends after the first `=` padding group (plus one line break),
    /// leaving the rest for the next directive.
    fn get_base64(&mut self, op: &Operation) -> Result<Bytes> {
        let decoded = if op.count == CountSpec::Fixed(0) {
            let encoded = self.take_up_to(usize::MAX);
            STANDARD.decode(&encoded)
        } else {
            let (symbols, consumed) = base64_segment(self.cursor);
            self.cursor.advance(consumed);
            LENIENT_BASE64.decode(symbols)
        };
        decoded
            .map(Bytes::from)
            .map_err(|e| PackError::malformed(op.directive, e.to_string()))
    }
}

/// Alphabet symbols of the next base64 segment and the bytes it spans
fn base64_segment(data: &[u8]) -> (Vec<u8>, usize) {
    let mut symbols = Vec::with_capacity(data.len());
    for (i, &b) in data.iter().enumerate() {
        if b == b'=' {
            let padding = data[i..].iter().take_while(|&&p| p == b'=').count();
            let rest = &data[i + padding..];
            let line_break = if rest.starts_with(b"\r\n") {
                2
            } else if rest.starts_with(b"\n") {
                1
            } else {
                0
            };
            return (symbols, i + padding + line_break);
        }
        if b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/') {
            symbols.push(b);
        }
    }
    (symbols, data.len())
}
